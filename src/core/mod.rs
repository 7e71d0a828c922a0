//! Core machine vocabulary.
//!
//! This module contains the value types every machine is built from:
//! - States via the `State` trait
//! - Messages via the `Message` trait and their kind tags
//! - Conditions guarding transitions
//! - `StateChange` notification records

mod guard;
mod history;
mod message;
mod state;

pub use guard::Condition;
pub use history::StateChange;
pub use message::Message;
pub use state::State;
