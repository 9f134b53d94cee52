use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for a [`DocumentEditor`](crate::DocumentEditor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of undo steps kept; older steps are dropped
    pub history_depth: usize,

    /// Maximum number of fix-ups a single normalization pass may apply before
    /// the surrounding operation is rolled back
    pub normalize_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            normalize_limit: 10_000,
        }
    }
}

impl EditorConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        let config: EditorConfig =
            serde_json::from_str(input).context("Failed to parse editor configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EditorConfig::from_json(r#"{"history_depth": 5}"#).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.normalize_limit, EditorConfig::default().normalize_limit);
    }

    #[test]
    fn invalid_json_reports_context() {
        let err = EditorConfig::from_json("{history_depth").unwrap_err();
        assert!(err.to_string().contains("editor configuration"));
    }
}
