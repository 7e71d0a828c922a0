//! Per-state entering and leaving hooks.

use crate::builder::error::{ConfigError, HookDirection};
use crate::core::State;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Callback attached to a state.
///
/// A leaving hook receives the destination state, an entering hook receives
/// the source state, so a hook can tell which way the machine is moving.
pub type Hook<S> = Box<dyn Fn(&S) + Send + Sync>;

/// At most one entering and one leaving hook per state.
pub struct HookRegistry<S: State> {
    entering: HashMap<S, Hook<S>>,
    leaving: HashMap<S, Hook<S>>,
}

impl<S: State> HookRegistry<S> {
    pub fn new() -> Self {
        Self {
            entering: HashMap::new(),
            leaving: HashMap::new(),
        }
    }

    pub fn set_entering<F>(&mut self, state: S, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        Self::insert(&mut self.entering, state, Box::new(hook), HookDirection::Entering)
    }

    pub fn set_leaving<F>(&mut self, state: S, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        Self::insert(&mut self.leaving, state, Box::new(hook), HookDirection::Leaving)
    }

    pub fn entering(&self, state: &S) -> Option<&Hook<S>> {
        self.entering.get(state)
    }

    pub fn leaving(&self, state: &S) -> Option<&Hook<S>> {
        self.leaving.get(state)
    }

    fn insert(
        hooks: &mut HashMap<S, Hook<S>>,
        state: S,
        hook: Hook<S>,
        direction: HookDirection,
    ) -> Result<(), ConfigError> {
        match hooks.entry(state) {
            Entry::Occupied(existing) => Err(ConfigError::DuplicateHook {
                state: existing.key().name().to_string(),
                direction,
            }),
            Entry::Vacant(slot) => {
                slot.insert(hook);
                Ok(())
            }
        }
    }
}

impl<S: State> Default for HookRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
