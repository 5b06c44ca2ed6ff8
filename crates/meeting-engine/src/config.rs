//! TOML configuration for scoring weights and suggestion defaults.
//!
//! ```toml
//! [scoring]
//! base = 30.0
//! availability = 40.0
//!
//! [suggestions]
//! slot_increment_minutes = 30
//! working_hours = ["08:00", "16:00"]
//! timezone = "Europe/Berlin"
//! ```
//!
//! Missing sections and keys fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::options::SuggestionOptions;
use crate::scorer::ScoringWeights;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    /// Options applied to requests that do not carry their own.
    pub suggestions: SuggestionOptions,
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.suggestions
            .validate()
            .map_err(|e| EngineError::Config(format!("suggestions: {}", e)))
    }
}
