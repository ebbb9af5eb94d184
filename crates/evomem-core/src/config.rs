//! Configuration
//!
//! Explicit configuration values handed to each component at construction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted pruning window, about a thousand years
pub const MAX_PRUNE_AFTER_DAYS: i64 = 365_000;

/// Top-level configuration for the memory layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvomemConfig {
    /// Learning memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Session registry configuration
    #[serde(default)]
    pub sessions: SessionConfig,
}

/// How `max_memories` is applied by the learning store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// The cap is reported in stats only; retention is age/importance based
    #[default]
    Advisory,
    /// After pruning, the lowest-scored memories are dropped until the
    /// total fits within `max_memories`
    HardCap,
}

/// Learning memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Configured memory ceiling (default: 1000)
    pub max_memories: usize,

    /// Age in days after which low-importance memories are pruned (default: 30)
    pub prune_after_days: i64,

    /// Memories at or above this importance survive pruning (default: 0.3)
    pub min_importance_to_keep: f64,

    /// Enforcement mode for `max_memories` (default: advisory)
    pub capacity_policy: CapacityPolicy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_memories: 1000,
            prune_after_days: 30,
            min_importance_to_keep: 0.3,
            capacity_policy: CapacityPolicy::Advisory,
        }
    }
}

/// Session registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding one JSON record per persisted session
    pub storage_dir: PathBuf,

    /// Maximum concurrently active sessions (default: 100)
    pub max_sessions: usize,

    /// History bound used when a caller does not pick one (default: 50)
    pub default_max_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".conversations"),
            max_sessions: 100,
            default_max_history: 50,
        }
    }
}

impl MemoryConfig {
    /// Set the memory ceiling
    pub fn with_max_memories(mut self, max_memories: usize) -> Self {
        self.max_memories = max_memories;
        self
    }

    /// Set the pruning age
    pub fn with_prune_after_days(mut self, days: i64) -> Self {
        self.prune_after_days = days;
        self
    }

    /// Set the importance retention floor
    pub fn with_min_importance_to_keep(mut self, importance: f64) -> Self {
        self.min_importance_to_keep = importance;
        self
    }

    /// Set the capacity policy
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.prune_after_days < 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "memory.prune_after_days".into(),
                message: "must not be negative".into(),
            });
        }

        if self.prune_after_days > MAX_PRUNE_AFTER_DAYS {
            return Err(ConfigValidationError::InvalidValue {
                field: "memory.prune_after_days".into(),
                message: format!("must be at most {}", MAX_PRUNE_AFTER_DAYS),
            });
        }

        if !(0.0..=1.0).contains(&self.min_importance_to_keep) {
            return Err(ConfigValidationError::InvalidValue {
                field: "memory.min_importance_to_keep".into(),
                message: "must be between 0 and 1".into(),
            });
        }

        if self.capacity_policy == CapacityPolicy::HardCap && self.max_memories == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "memory.max_memories".into(),
                message: "must be greater than 0 with the hard_cap policy".into(),
            });
        }

        Ok(())
    }
}

impl SessionConfig {
    /// Create a session config persisting into the given directory
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of active sessions
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Set the default history bound
    pub fn with_default_max_history(mut self, max_history: usize) -> Self {
        self.default_max_history = max_history;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_sessions == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "sessions.max_sessions".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.default_max_history == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "sessions.default_max_history".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.storage_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingStorageDir);
        }

        Ok(())
    }
}

impl EvomemConfig {
    /// Set memory configuration
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Set session configuration
    pub fn with_sessions(mut self, sessions: SessionConfig) -> Self {
        self.sessions = sessions;
        self
    }

    /// Validate both sections
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.memory.validate()?;
        self.sessions.validate()
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("sessions.storage_dir is required")]
    MissingStorageDir,

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvomemConfig::default();
        assert_eq!(config.memory.max_memories, 1000);
        assert_eq!(config.memory.prune_after_days, 30);
        assert_eq!(config.memory.min_importance_to_keep, 0.3);
        assert_eq!(config.memory.capacity_policy, CapacityPolicy::Advisory);
        assert_eq!(config.sessions.max_sessions, 100);
        assert_eq!(config.sessions.default_max_history, 50);
        assert_eq!(config.sessions.storage_dir, PathBuf::from(".conversations"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EvomemConfig::default()
            .with_memory(
                MemoryConfig::default()
                    .with_max_memories(10)
                    .with_capacity_policy(CapacityPolicy::HardCap),
            )
            .with_sessions(SessionConfig::new("/tmp/sessions").with_max_sessions(2));

        assert_eq!(config.memory.max_memories, 10);
        assert_eq!(config.memory.capacity_policy, CapacityPolicy::HardCap);
        assert_eq!(config.sessions.max_sessions, 2);
        assert_eq!(config.sessions.storage_dir, PathBuf::from("/tmp/sessions"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = EvomemConfig::default();
        config.memory.min_importance_to_keep = 1.5;
        assert!(config.validate().is_err());

        config.memory.min_importance_to_keep = 0.3;
        config.sessions.max_sessions = 0;
        assert!(config.validate().is_err());

        config.sessions.max_sessions = 5;
        config.sessions.storage_dir = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::MissingStorageDir)
        ));
    }

    #[test]
    fn test_prune_window_is_bounded() {
        let config = MemoryConfig::default().with_prune_after_days(MAX_PRUNE_AFTER_DAYS);
        assert!(config.validate().is_ok());

        let config = MemoryConfig::default().with_prune_after_days(100_000_000);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let json = r#"{"memory": {"prune_after_days": 7}}"#;
        let config: EvomemConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.memory.prune_after_days, 7);
        assert_eq!(config.memory.max_memories, 1000);
        assert_eq!(config.sessions.max_sessions, 100);
    }
}
