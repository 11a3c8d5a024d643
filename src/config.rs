//! Queue engine configuration.
//!
//! TOML-backed; every field has a default, so an empty document is a valid
//! configuration.
//!
//! ```
//! use u_resource_queue::config::QueueConfig;
//!
//! let cfg = QueueConfig::from_toml_str("validate_moves = false").unwrap();
//! assert!(!cfg.validate_moves);
//! assert_eq!(cfg.cycle_search_limit, None);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{QueueError, Result};

/// Runtime options for the sequencer, dependency graph, and timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Run the advisory origin-position check on `insert_at` and `move`.
    pub validate_moves: bool,
    /// Hard cap on nodes visited by cycle detection. `None` searches the
    /// whole graph. Hitting the cap fails with `SearchLimitExceeded`.
    pub cycle_search_limit: Option<usize>,
    /// Start of the planning horizon (ms).
    pub epoch_ms: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            validate_moves: true,
            cycle_search_limit: None,
            epoch_ms: 0,
        }
    }
}

impl QueueConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| QueueError::Io(format!("reading config file at {path:?}: {e}")))?;
        Self::from_toml_str(&contents)
    }

    /// Disables the move check.
    pub fn without_move_validation(mut self) -> Self {
        self.validate_moves = false;
        self
    }

    /// Bounds cycle detection.
    pub fn with_cycle_search_limit(mut self, limit: usize) -> Self {
        self.cycle_search_limit = Some(limit);
        self
    }

    /// Sets the planning epoch.
    pub fn with_epoch(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.cycle_search_limit == Some(0) {
            return Err(QueueError::Config(
                "cycle_search_limit must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
