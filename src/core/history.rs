//! State change notifications.
//!
//! One [`StateChange`] is published for every committed transition, after the
//! entering hook of the new state has run.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use stateloop::core::{State, StateChange};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Phase {
///     One,
///     Two,
/// }
///
/// impl State for Phase {
///     fn name(&self) -> &str {
///         match self {
///             Self::One => "One",
///             Self::Two => "Two",
///         }
///     }
/// }
///
/// let change = StateChange::now(Phase::One, Phase::Two);
/// assert_eq!(change.pair(), (&Phase::One, &Phase::Two));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateChange<S: State> {
    /// The state that was left
    pub from: S,
    /// The state that was committed
    pub to: S,
    /// When the new state was committed
    pub at: DateTime<Utc>,
}

impl<S: State> StateChange<S> {
    /// Record a change committed at the current instant.
    pub fn now(from: S, to: S) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }

    /// The `(from, to)` pair without the timestamp.
    pub fn pair(&self) -> (&S, &S) {
        (&self.from, &self.to)
    }

    /// True when the transition re-entered the state it left.
    pub fn is_self_transition(&self) -> bool {
        self.from == self.to
    }
}
