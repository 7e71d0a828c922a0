//! Conditions guarding transitions.
//!
//! A condition is a predicate over the incoming message. It is evaluated
//! before any side effect of the transition runs, so a condition that returns
//! `false` leaves the machine untouched.

use super::message::Message;
use std::fmt;

/// Predicate that decides whether a matched transition fires.
///
/// # Example
///
/// ```rust
/// use stateloop::core::Condition;
/// use stateloop::message_enum;
///
/// message_enum! {
///     enum Sensor => SensorKind {
///         Reading(u8),
///     }
/// }
///
/// let strong = Condition::new(|m: &Sensor| matches!(m, Sensor::Reading(n) if *n >= 50));
///
/// assert!(strong.check(&Sensor::Reading(80)));
/// assert!(!strong.check(&Sensor::Reading(10)));
/// ```
pub struct Condition<M: Message> {
    predicate: Box<dyn Fn(&M) -> bool + Send + Sync>,
}

impl<M: Message> Condition<M> {
    /// Create a condition from a predicate.
    ///
    /// The predicate runs on the worker thread and must not block.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Condition {
            predicate: Box::new(predicate),
        }
    }

    /// Evaluate the predicate against a message.
    pub fn check(&self, message: &M) -> bool {
        (self.predicate)(message)
    }
}

impl<M: Message> fmt::Debug for Condition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::message_enum! {
        enum TestMessage => TestKind {
            Ping,
            Level(i32),
        }
    }

    #[test]
    fn condition_allows_matching_messages() {
        let condition = Condition::new(|m: &TestMessage| matches!(m, TestMessage::Ping));

        assert!(condition.check(&TestMessage::Ping));
        assert!(!condition.check(&TestMessage::Level(3)));
    }

    #[test]
    fn condition_can_inspect_payload() {
        let condition = Condition::new(|m: &TestMessage| match m {
            TestMessage::Level(n) => *n > 0,
            TestMessage::Ping => false,
        });

        assert!(condition.check(&TestMessage::Level(1)));
        assert!(!condition.check(&TestMessage::Level(-1)));
    }

    #[test]
    fn condition_is_deterministic() {
        let condition = Condition::new(|m: &TestMessage| matches!(m, TestMessage::Level(n) if n % 2 == 0));
        let message = TestMessage::Level(4);

        assert_eq!(condition.check(&message), condition.check(&message));
    }
}
