//! Messages consumed by the dispatch loop.
//!
//! Messages are a closed tagged union: every concrete machine declares one
//! enum of messages, and the enum's variant tag (its [`Message::Kind`]) is the
//! second half of the transition key. Payloads ride along in the variants and
//! are visible to conditions and effects, but never take part in matching.

use std::fmt::Debug;
use std::hash::Hash;

/// A message that can be fed to a machine.
///
/// Use [`message_enum!`](crate::message_enum) to derive this for an enum
/// together with its kind enum.
///
/// # Example
///
/// ```rust
/// use stateloop::core::Message;
///
/// #[derive(Debug)]
/// enum Door {
///     Push,
///     Lock(u32),
/// }
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum DoorKind {
///     Push,
///     Lock,
/// }
///
/// impl Message for Door {
///     type Kind = DoorKind;
///
///     fn kind(&self) -> DoorKind {
///         match self {
///             Self::Push => DoorKind::Push,
///             Self::Lock(_) => DoorKind::Lock,
///         }
///     }
/// }
///
/// assert_eq!(Door::Lock(1234).kind(), DoorKind::Lock);
/// ```
pub trait Message: Debug + Send + 'static {
    /// Payload-free tag identifying the variant.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The variant tag of this message.
    fn kind(&self) -> Self::Kind;
}
