//! Stateloop: a message-driven finite state machine engine
//!
//! A concrete machine declares its states, its messages, the transitions
//! between states, and per-state entering/leaving hooks. The engine then
//! consumes messages from an unbounded queue on one dedicated worker thread,
//! so every state mutation is serialized no matter how many threads produce
//! messages.
//!
//! # Core Concepts
//!
//! - **State**: comparable value identifying where the machine is
//! - **Message**: closed enum whose variant tag selects the transition
//! - **Transition**: (state, message kind) → state, with optional condition
//!   and effect
//! - **Hooks**: callbacks run when a state is left or entered
//! - **Machine**: the façade owning the worker, the queue, and the current
//!   state
//!
//! # Example
//!
//! ```rust
//! use stateloop::builder::MachineBuilder;
//! use stateloop::engine::Transition;
//! use stateloop::{message_enum, state_enum};
//!
//! state_enum! {
//!     enum Door {
//!         Closed,
//!         Open,
//!     }
//! }
//!
//! message_enum! {
//!     enum Action => ActionKind {
//!         Push,
//!         Pull,
//!     }
//! }
//!
//! let machine = MachineBuilder::<Door, Action>::new()
//!     .transition(Transition::new(Door::Closed, ActionKind::Push, Door::Open))?
//!     .transition(Transition::new(Door::Open, ActionKind::Pull, Door::Closed))?
//!     .build()?;
//!
//! let mut changes = machine.subscribe();
//! machine.start(Door::Closed)?;
//! machine.handle_message(Action::Push);
//!
//! let change = changes.blocking_recv().expect("worker running");
//! assert_eq!(change.pair(), (&Door::Closed, &Door::Open));
//!
//! machine.dispose();
//! machine.join()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod detector;
pub mod engine;

// Re-export commonly used types
pub use builder::{ConfigError, MachineBuilder};
pub use config::{FailurePolicy, MachineConfig};
pub use self::core::{Condition, Message, State, StateChange};
pub use engine::{DispatchError, Machine, MachineError, MessageSender, Transition};
