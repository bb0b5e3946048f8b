// SPDX-License-Identifier: MIT OR Apache-2.0
//! Orchestrator settings stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Text is not valid settings RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Runtime knobs for an [`crate::Orchestrator`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Log every step enter/exit at debug level
    pub trace_steps: bool,
    /// Warn once when a barrier has waited this many seconds
    pub barrier_warn_after: Option<f32>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            trace_steps: false,
            barrier_warn_after: Some(10.0),
        }
    }
}

impl OrchestratorConfig {
    /// Parse settings from RON text; missing fields take their defaults
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded orchestrator config from {}", path.display());
        Ok(config)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert!(!config.trace_steps);
        assert_eq!(config.barrier_warn_after, Some(10.0));
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = OrchestratorConfig::from_ron("(trace_steps: true)").unwrap();
        assert!(config.trace_steps);
        assert_eq!(config.barrier_warn_after, Some(10.0));

        let config = OrchestratorConfig::from_ron("(barrier_warn_after: None)").unwrap();
        assert_eq!(config.barrier_warn_after, None);
    }

    #[test]
    fn test_ron_serialization() {
        let config = OrchestratorConfig {
            trace_steps: true,
            barrier_warn_after: Some(2.5),
        };
        let text = config.to_ron().unwrap();
        assert!(text.contains("OrchestratorConfig"));
        assert_eq!(OrchestratorConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_ron_is_parse_error() {
        let err = OrchestratorConfig::from_ron("(trace_steps: 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("orchestrator-{}.ron", uuid::Uuid::new_v4()));
        let config = OrchestratorConfig {
            trace_steps: true,
            barrier_warn_after: None,
        };
        config.save(&path).unwrap();
        let loaded = OrchestratorConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);

        assert!(matches!(
            OrchestratorConfig::load(&path).unwrap_err(),
            ConfigError::Io(_)
        ));
    }
}
