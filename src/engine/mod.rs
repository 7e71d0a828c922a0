//! The machine runtime.
//!
//! A machine is assembled from four parts:
//!
//! - **Transition table**: rules keyed by (state, message kind)
//! - **Hook registry**: entering/leaving callbacks per state
//! - **Message channel**: unbounded queue with cooperative cancellation
//! - **Dispatch loop**: the single consumer that mutates the current state
//!
//! [`Machine`] composes them and owns the dedicated worker thread.

pub mod channel;
mod dispatch;
mod error;
mod hooks;
pub(crate) mod machine;
mod observer;
mod table;

pub use channel::{MessageReceiver, MessageSender, Received};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{DispatchError, MachineError, Stage};
pub use hooks::{Hook, HookRegistry};
pub use machine::Machine;
pub use observer::{Observer, Observers};
pub use table::{Effect, Transition, TransitionTable};
