//! Builder API for machine construction.
//!
//! Everything registered here is validated on the spot: a duplicate
//! transition key or a second hook for the same state fails the call that
//! introduced it, so a misconfigured machine can never be started.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::{ConfigError, HookDirection};
pub use machine::MachineBuilder;
