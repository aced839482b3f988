//! CLI configuration loaded from `loopfold.toml`

use crate::{CliError, Result};
use lf_core::config::ConversionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "loopfold.toml";

/// CLI configuration loaded from config files and environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine toggles and policies
    pub conversion: ConversionConfig,

    /// Source discovery
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// File extensions picked up when walking directories
    pub extensions: Vec<String>,

    /// Directory names skipped when walking
    pub exclude_dirs: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["java".to_string()],
            exclude_dirs: vec![
                ".git".to_string(),
                "build".to_string(),
                "target".to_string(),
            ],
        }
    }
}

impl CliConfig {
    /// Load configuration from `explicit`, else `./loopfold.toml`, else the
    /// user config directory, else defaults. Environment overrides are
    /// applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load_from_file(&local)?
                } else {
                    match Self::default_config_path().filter(|path| path.is_file()) {
                        Some(path) => Self::load_from_file(&path)?,
                        None => Self::default(),
                    }
                }
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.conversion = self.conversion.with_env_overrides();
        self
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("loopfold").join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.conversion.features.reduce);
        assert_eq!(config.files.extensions, vec!["java".to_string()]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CliConfig = toml::from_str(
            "[conversion.features]\nreduce = false\n\n[conversion.policies]\nside-effect-stage = \"peek\"\n",
        )
        .unwrap();
        assert!(!config.conversion.features.reduce);
        assert!(config.conversion.features.collect);
        assert_eq!(
            config.conversion.policies.side_effect_stage,
            lf_core::config::SideEffectStage::Peek
        );
        assert_eq!(config.files, FilesConfig::default());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = CliConfig::default();
        config.conversion.features.matching = false;
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded_config = CliConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config, loaded_config);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/loopfold.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
