//! Configuration errors raised while a machine is being assembled.

use std::fmt;
use thiserror::Error;

/// Which side of a state a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookDirection {
    Entering,
    Leaving,
}

impl fmt::Display for HookDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entering => f.write_str("entering"),
            Self::Leaving => f.write_str("leaving"),
        }
    }
}

/// Errors that can occur while configuring a machine.
///
/// All of these are raised synchronously at registration time; a machine
/// whose configuration failed is never started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Transition from '{from}' on '{kind}' is already registered")]
    DuplicateTransition { from: String, kind: String },

    #[error("An {direction} hook for state '{state}' is already registered")]
    DuplicateHook {
        state: String,
        direction: HookDirection,
    },

    #[error("Invalid machine configuration: {0}")]
    InvalidConfig(String),
}
