//! The single-consumer dispatch loop.
//!
//! Every state mutation of a machine happens here, one message at a time, on
//! the machine's worker thread. A firing transition always runs in this order:
//!
//! 1. leaving hook of the old state (receives the new state)
//! 2. transition effect (receives the message)
//! 3. commit of the new state
//! 4. entering hook of the new state (receives the old state)
//! 5. state-changed notification
//!
//! The condition is evaluated before step 1, so a rejected message has no
//! side effects at all.

use crate::config::FailurePolicy;
use crate::core::{Message, State, StateChange};
use crate::engine::channel::{MessageReceiver, Received};
use crate::engine::error::{DispatchError, Stage};
use crate::engine::hooks::HookRegistry;
use crate::engine::observer::Observers;
use crate::engine::table::TransitionTable;
use chrono::Utc;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// What a single dispatch step did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome<S: State> {
    /// A transition fired and was committed
    Transitioned(StateChange<S>),
    /// No transition is registered for the current state and message kind
    Unmatched,
    /// A transition matched but its condition returned false
    Rejected,
}

pub struct Dispatcher<S: State, M: Message> {
    table: TransitionTable<S, M>,
    hooks: HookRegistry<S>,
    observers: Arc<Observers<S>>,
    committed: Arc<RwLock<Option<S>>>,
    state: S,
}

impl<S: State, M: Message> Dispatcher<S, M> {
    /// Create a dispatcher positioned at `initial`, publishing committed
    /// states into `committed`.
    pub fn new(
        table: TransitionTable<S, M>,
        hooks: HookRegistry<S>,
        observers: Arc<Observers<S>>,
        committed: Arc<RwLock<Option<S>>>,
        initial: S,
    ) -> Self {
        *committed.write() = Some(initial.clone());
        Self {
            table,
            hooks,
            observers,
            committed,
            state: initial,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Process one message to completion.
    pub fn dispatch(&mut self, message: &M) -> Result<DispatchOutcome<S>, DispatchError> {
        let Some(transition) = self.table.resolve(&self.state, message) else {
            tracing::trace!(state = self.state.name(), ?message, "no transition, message dropped");
            return Ok(DispatchOutcome::Unmatched);
        };

        let from = self.state.clone();
        let to = transition.to.clone();

        if !guarded(Stage::Condition, &from, &to, || transition.can_fire(message))? {
            tracing::trace!(
                from = from.name(),
                to = to.name(),
                ?message,
                "condition rejected transition"
            );
            return Ok(DispatchOutcome::Rejected);
        }

        if let Some(hook) = self.hooks.leaving(&from) {
            guarded(Stage::LeavingHook, &from, &to, || hook(&to))?;
        }
        guarded(Stage::Effect, &from, &to, || transition.run_effect(message))?;

        self.state = to.clone();
        *self.committed.write() = Some(to.clone());
        let at = Utc::now();
        tracing::debug!(from = from.name(), to = to.name(), ?message, "transition committed");

        if let Some(hook) = self.hooks.entering(&to) {
            guarded(Stage::EnteringHook, &from, &to, || hook(&from))?;
        }

        let change = StateChange { from, to, at };
        for observer in self.observers.snapshot() {
            guarded(Stage::Notify, &change.from, &change.to, || observer(&change))?;
        }
        self.observers.forward(&change);

        Ok(DispatchOutcome::Transitioned(change))
    }

    /// Consume messages until cancellation, or until a callback fails under
    /// [`FailurePolicy::Halt`].
    pub async fn run(
        mut self,
        mut receiver: MessageReceiver<M>,
        policy: FailurePolicy,
    ) -> Result<(), DispatchError> {
        loop {
            let message = match receiver.receive().await {
                Received::Message(message) => message,
                Received::Cancelled => {
                    tracing::debug!(
                        state = self.state.name(),
                        disposed = receiver.is_cancelled(),
                        "dispatch loop stopping"
                    );
                    return Ok(());
                }
            };

            if let Err(err) = self.dispatch(&message) {
                match policy {
                    FailurePolicy::Halt => {
                        tracing::error!(
                            error = %err,
                            committed = err.stage().is_after_commit(),
                            "callback failed, halting dispatch worker"
                        );
                        receiver.close();
                        return Err(err);
                    }
                    FailurePolicy::Continue => {
                        tracing::warn!(
                            error = %err,
                            committed = err.stage().is_after_commit(),
                            state = self.state.name(),
                            "callback failed, rest of transition skipped"
                        );
                    }
                }
            }
        }
    }
}

fn guarded<S: State, R>(
    stage: Stage,
    from: &S,
    to: &S,
    callback: impl FnOnce() -> R,
) -> Result<R, DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(callback)).map_err(|payload| {
        DispatchError::CallbackPanicked {
            stage,
            from: from.name().to_string(),
            to: to.name().to_string(),
            reason: panic_reason(payload.as_ref()),
        }
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
