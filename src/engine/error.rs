//! Runtime errors of the dispatch worker and the machine façade.

use std::fmt;
use thiserror::Error;

/// The step of a transition during which a callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Condition,
    LeavingHook,
    Effect,
    EnteringHook,
    Notify,
}

impl Stage {
    /// True for stages that run after the new state has been committed.
    pub fn is_after_commit(&self) -> bool {
        matches!(self, Self::EnteringHook | Self::Notify)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Condition => "condition",
            Self::LeavingHook => "leaving hook",
            Self::Effect => "effect",
            Self::EnteringHook => "entering hook",
            Self::Notify => "state-changed observer",
        };
        f.write_str(name)
    }
}

/// Errors produced while dispatching a single message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("{stage} panicked during transition '{from}' -> '{to}': {reason}")]
    CallbackPanicked {
        stage: Stage,
        from: String,
        to: String,
        reason: String,
    },
}

impl DispatchError {
    /// The step of the transition that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::CallbackPanicked { stage, .. } => *stage,
        }
    }
}

/// Errors surfaced by [`Machine`](crate::engine::Machine).
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Machine has already been started")]
    AlreadyStarted,

    #[error("Machine has not been started")]
    NotStarted,

    #[error("Failed to launch dispatch worker: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Dispatch worker halted: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Dispatch worker panicked outside of a callback")]
    WorkerPanicked,
}
