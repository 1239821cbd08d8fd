//! Dispatcher settings, loadable from a JSON file.
//!
//! Every field has a default, so an empty object (or no file at all) gives the
//! standard behaviour.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default extraction key for delivery entries
pub const DEFAULT_SOURCES_KEY: &str = "sources";
/// Default omitted-value sentinel
pub const DEFAULT_OMIT_TOKEN: &str = "__omit_place_holder__";
/// Default name of the delivery module
pub const DEFAULT_DELIVERY_MODULE: &str = "copy";

/// Settings shared by every dispatch call of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Key under which delivery entries are given
    pub sources_key: String,
    /// Value meaning "no value supplied"; stripped before any merge
    pub omit_token: String,
    /// Module name reported for delivery results
    pub delivery_module: String,
    /// Baseline for keeping remote temporary files outside of deliveries
    pub keep_remote_files: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            sources_key: DEFAULT_SOURCES_KEY.to_string(),
            omit_token: DEFAULT_OMIT_TOKEN.to_string(),
            delivery_module: DEFAULT_DELIVERY_MODULE.to_string(),
            keep_remote_files: false,
        }
    }
}

impl BootstrapConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("sources_key", &self.sources_key),
            ("omit_token", &self.omit_token),
            ("delivery_module", &self.delivery_module),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", field);
            }
        }

        // The key has to survive the flat key=value form
        if !crate::kv::is_key(&self.sources_key) {
            anyhow::bail!(
                "sources_key {:?} may only contain letters, digits, '_', '-' and '.'",
                self.sources_key
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = BootstrapConfig::default();
        assert_eq!(config.sources_key, "sources");
        assert_eq!(config.delivery_module, "copy");
        assert!(!config.keep_remote_files);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"sources_key": "files"}"#).unwrap();

        let config = BootstrapConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.sources_key, "files");
        assert_eq!(config.omit_token, DEFAULT_OMIT_TOKEN);
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let config = BootstrapConfig {
            keep_remote_files: true,
            ..BootstrapConfig::default()
        };
        config.save_to_file(file.path()).unwrap();
        assert_eq!(BootstrapConfig::load_from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = BootstrapConfig {
            omit_token: "  ".to_string(),
            ..BootstrapConfig::default()
        };
        assert!(empty.validate().is_err());

        let spaced = BootstrapConfig {
            sources_key: "my sources".to_string(),
            ..BootstrapConfig::default()
        };
        let err = spaced.validate().unwrap_err();
        assert!(err.to_string().contains("sources_key"));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = BootstrapConfig::load_from_file("/nonexistent/bootstrap.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration"));
    }
}
