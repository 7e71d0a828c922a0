//! Machine configuration.
//!
//! ```rust
//! use stateloop::config::{FailurePolicy, MachineConfig};
//!
//! let config = MachineConfig::from_json(r#"{ "name": "door", "failure_policy": "continue" }"#)
//!     .unwrap();
//!
//! assert_eq!(config.name, "door");
//! assert_eq!(config.failure_policy, FailurePolicy::Continue);
//! assert_eq!(config.worker_thread_name(), "door-dispatch");
//! ```

use crate::builder::error::ConfigError;
use serde::{Deserialize, Serialize};

/// What the worker does when a condition, effect, hook, or observer panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and stop the worker. The machine stays in the last
    /// committed state and processes nothing further.
    #[default]
    Halt,

    /// Log the failure, skip the rest of that transition, keep consuming.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Used in log spans and to derive the worker thread name
    pub name: String,
    /// Overrides the worker thread name
    pub thread_name: Option<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "machine".to_string(),
            thread_name: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl MachineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "machine name must not be empty".to_string(),
            ));
        }
        if self.worker_thread_name().contains('\0') {
            return Err(ConfigError::InvalidConfig(
                "worker thread name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }

    pub fn worker_thread_name(&self) -> String {
        self.thread_name
            .clone()
            .unwrap_or_else(|| format!("{}-dispatch", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_halt_on_failure() {
        let config = MachineConfig::default();

        assert_eq!(config.name, "machine");
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.worker_thread_name(), "machine-dispatch");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn explicit_thread_name_wins() {
        let config = MachineConfig::new("door").with_thread_name("door-worker");
        assert_eq!(config.worker_thread_name(), "door-worker");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = MachineConfig::from_json(r#"{ "failure_policy": "retry" }"#);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = MachineConfig::from_json(r#"{ "name": "  " }"#);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn nul_in_derived_thread_name_is_rejected() {
        let from_name = MachineConfig::new("bad\0name");
        let from_override = MachineConfig::new("fine").with_thread_name("bad\0thread");

        assert!(matches!(from_name.validate(), Err(ConfigError::InvalidConfig(_))));
        assert!(matches!(from_override.validate(), Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn clean_thread_override_hides_nul_in_name() {
        let config = MachineConfig::new("bad\0name").with_thread_name("clean");
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_thread_name(), "clean");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = MachineConfig::new("sensor").with_failure_policy(FailurePolicy::Continue);

        let json = serde_json::to_string(&config).unwrap();

        assert_eq!(MachineConfig::from_json(&json).unwrap(), config);
    }
}
