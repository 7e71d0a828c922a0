//! Transition rules and the table that resolves them.

use crate::builder::error::ConfigError;
use crate::core::{Condition, Message, State};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Side effect run with the message when a transition fires.
pub type Effect<M> = Box<dyn Fn(&M) + Send + Sync>;

/// A rule moving the machine from `from` to `to` when a message of kind `on`
/// arrives.
///
/// # Example
///
/// ```rust
/// use stateloop::engine::Transition;
/// use stateloop::{message_enum, state_enum};
///
/// state_enum! {
///     enum Light { Off, On }
/// }
///
/// message_enum! {
///     enum Switch => SwitchKind { Flip(u8) }
/// }
///
/// let transition = Transition::<Light, Switch>::new(Light::Off, SwitchKind::Flip, Light::On)
///     .when(|m: &Switch| matches!(m, Switch::Flip(level) if *level > 0))
///     .effect(|m: &Switch| println!("flipped by {m:?}"));
///
/// assert!(transition.can_fire(&Switch::Flip(1)));
/// assert!(!transition.can_fire(&Switch::Flip(0)));
/// ```
pub struct Transition<S: State, M: Message> {
    pub from: S,
    pub on: M::Kind,
    pub to: S,
    pub condition: Option<Condition<M>>,
    pub effect: Option<Effect<M>>,
}

impl<S: State, M: Message> Transition<S, M> {
    /// Unconditional transition without an effect.
    pub fn new(from: S, on: M::Kind, to: S) -> Self {
        Self {
            from,
            on,
            to,
            condition: None,
            effect: None,
        }
    }

    /// Guard the transition with a predicate over the message.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Condition::new(predicate));
        self
    }

    /// Guard the transition with a prebuilt condition.
    pub fn condition(mut self, condition: Condition<M>) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Run `effect` with the message when the transition fires.
    pub fn effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.effect = Some(Box::new(effect));
        self
    }

    /// Evaluate the condition; transitions without one always fire.
    pub fn can_fire(&self, message: &M) -> bool {
        self.condition.as_ref().is_none_or(|c| c.check(message))
    }

    /// Invoke the effect, if any.
    pub fn run_effect(&self, message: &M) {
        if let Some(effect) = &self.effect {
            effect(message);
        }
    }
}

impl<S: State, M: Message> fmt::Debug for Transition<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("on", &self.on)
            .field("to", &self.to)
            .field("guarded", &self.condition.is_some())
            .field("has_effect", &self.effect.is_some())
            .finish()
    }
}

/// Transition rules keyed by source state, then message kind.
///
/// Filled while the machine is being built and moved into the worker at
/// start, after which it is only read.
pub struct TransitionTable<S: State, M: Message> {
    rules: HashMap<S, HashMap<M::Kind, Transition<S, M>>>,
    len: usize,
}

impl<S: State, M: Message> TransitionTable<S, M> {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            len: 0,
        }
    }

    /// Add a rule. Fails if `(from, on)` already has one.
    pub fn register(&mut self, transition: Transition<S, M>) -> Result<(), ConfigError> {
        let by_kind = self.rules.entry(transition.from.clone()).or_default();
        match by_kind.entry(transition.on) {
            Entry::Occupied(_) => Err(ConfigError::DuplicateTransition {
                from: transition.from.name().to_string(),
                kind: format!("{:?}", transition.on),
            }),
            Entry::Vacant(slot) => {
                slot.insert(transition);
                self.len += 1;
                Ok(())
            }
        }
    }

    /// The rule for the current state and the message's kind, if any.
    pub fn resolve(&self, current: &S, message: &M) -> Option<&Transition<S, M>> {
        self.rules.get(current)?.get(&message.kind())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<S: State, M: Message> Default for TransitionTable<S, M> {
    fn default() -> Self {
        Self::new()
    }
}
