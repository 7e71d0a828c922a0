//! Builder for assembling machines.

use crate::builder::error::ConfigError;
use crate::config::MachineConfig;
use crate::core::{Message, State, StateChange};
use crate::engine::channel::{self, MessageReceiver, MessageSender};
use crate::engine::machine::Configured;
use crate::engine::{HookRegistry, Machine, Observers, Transition, TransitionTable};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builder collecting transitions, hooks, and observers before a machine
/// exists.
///
/// The message channel is created up front, so callbacks can capture a
/// [`sender`](Self::sender) and feed messages back into the machine they are
/// part of.
pub struct MachineBuilder<S: State, M: Message> {
    config: MachineConfig,
    table: TransitionTable<S, M>,
    hooks: HookRegistry<S>,
    observers: Arc<Observers<S>>,
    sender: MessageSender<M>,
    receiver: MessageReceiver<M>,
    cancel: CancellationToken,
}

impl<S: State, M: Message> MachineBuilder<S, M> {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let cancel = CancellationToken::new();
        let (sender, receiver) = channel::channel(cancel.clone());
        Self {
            config,
            table: TransitionTable::new(),
            hooks: HookRegistry::new(),
            observers: Arc::new(Observers::new()),
            sender,
            receiver,
            cancel,
        }
    }

    /// Producer handle for the machine being built.
    pub fn sender(&self) -> MessageSender<M> {
        self.sender.clone()
    }

    /// Add a transition.
    /// Returns an error if `(from, on)` already has one.
    pub fn transition(mut self, transition: Transition<S, M>) -> Result<Self, ConfigError> {
        self.add_transition(transition)?;
        Ok(self)
    }

    /// Add a transition through a mutable borrow.
    pub fn add_transition(&mut self, transition: Transition<S, M>) -> Result<(), ConfigError> {
        self.table.register(transition)
    }

    /// Attach the entering hook of `state`. The hook receives the state the
    /// machine came from.
    pub fn on_entering<F>(mut self, state: S, hook: F) -> Result<Self, ConfigError>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.hooks.set_entering(state, hook)?;
        Ok(self)
    }

    /// Attach the leaving hook of `state`. The hook receives the state the
    /// machine is going to.
    pub fn on_leaving<F>(mut self, state: S, hook: F) -> Result<Self, ConfigError>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.hooks.set_leaving(state, hook)?;
        Ok(self)
    }

    /// Register a state-changed observer.
    pub fn on_state_changed<F>(self, observer: F) -> Self
    where
        F: Fn(&StateChange<S>) + Send + Sync + 'static,
    {
        self.observers.add(observer);
        self
    }

    pub fn transition_count(&self) -> usize {
        self.table.len()
    }

    /// Build the machine. It does nothing until started.
    pub fn build(self) -> Result<Machine<S, M>, ConfigError> {
        self.config.validate()?;
        if self.table.is_empty() {
            tracing::warn!(name = %self.config.name, "machine built without transitions");
        }
        Ok(Machine::new(
            self.config,
            Configured {
                table: self.table,
                hooks: self.hooks,
                receiver: self.receiver,
            },
            self.sender,
            self.cancel,
            self.observers,
        ))
    }
}

impl<S: State, M: Message> Default for MachineBuilder<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::error::HookDirection;

    crate::state_enum! {
        enum TestState {
            Initial,
            Processing,
            Complete,
        }
        final: [Complete]
    }

    crate::message_enum! {
        enum TestMessage => TestKind {
            Begin,
            Finish,
        }
    }

    fn builder() -> MachineBuilder<TestState, TestMessage> {
        MachineBuilder::new()
    }

    #[test]
    fn fluent_api_builds_machine() {
        let machine = builder()
            .transition(Transition::new(TestState::Initial, TestKind::Begin, TestState::Processing))
            .unwrap()
            .transition(Transition::new(TestState::Processing, TestKind::Finish, TestState::Complete))
            .unwrap()
            .on_entering(TestState::Processing, |_| {})
            .unwrap()
            .build();

        assert!(machine.is_ok());
        assert_eq!(machine.unwrap().current_state(), None);
    }

    #[test]
    fn duplicate_transition_fails_at_registration() {
        let result = builder()
            .transition(Transition::new(TestState::Initial, TestKind::Begin, TestState::Processing))
            .unwrap()
            .transition(Transition::new(TestState::Initial, TestKind::Begin, TestState::Complete));

        assert!(matches!(result, Err(ConfigError::DuplicateTransition { .. })));
    }

    #[test]
    fn duplicate_hooks_fail_at_registration() {
        let entering = builder()
            .on_entering(TestState::Complete, |_| {})
            .unwrap()
            .on_entering(TestState::Complete, |_| {});
        let leaving = builder()
            .on_leaving(TestState::Initial, |_| {})
            .unwrap()
            .on_leaving(TestState::Initial, |_| {});

        assert!(matches!(
            entering,
            Err(ConfigError::DuplicateHook { direction: HookDirection::Entering, .. })
        ));
        assert!(matches!(
            leaving,
            Err(ConfigError::DuplicateHook { direction: HookDirection::Leaving, .. })
        ));
    }

    #[test]
    fn add_transition_counts_rules() {
        let mut builder = builder();
        builder
            .add_transition(Transition::new(TestState::Initial, TestKind::Begin, TestState::Processing))
            .unwrap();
        builder
            .add_transition(Transition::new(TestState::Processing, TestKind::Begin, TestState::Processing))
            .unwrap();

        assert_eq!(builder.transition_count(), 2);
    }

    #[test]
    fn invalid_config_fails_build() {
        let mut config = MachineConfig::new("ok");
        config.name = String::new();

        let result = MachineBuilder::<TestState, TestMessage>::with_config(config).build();

        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn nul_in_machine_name_fails_build() {
        let result =
            MachineBuilder::<TestState, TestMessage>::with_config(MachineConfig::new("bad\0name"))
                .build();

        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }
}
