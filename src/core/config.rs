//! Configuration loading
//!
//! Settings are layered: user config, then `.spc.yaml` in the working
//! directory, then an explicit `--config` file. Later layers override
//! earlier ones field by field.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::measurement::DEFAULT_SAMPLE_SIZE;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".spc.yaml";

/// Records fetched from the measurement store per characteristic
pub const DEFAULT_MAX_MEASUREMENTS: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Subgroup size when a characteristic doesn't set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sample_size: Option<usize>,

    /// Keep only the N most recent measurements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_measurements: Option<usize>,

    /// Reject subgroup sizes without tabulated chart factors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_factors: Option<bool>,
}

impl Config {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// User-level config path (e.g., ~/.config/spc/config.yaml)
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "spc").map(|d| d.config_dir().join("config.yaml"))
    }

    /// Load layered configuration relative to the current directory
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        let user = Self::user_config_path();
        Self::load_layers(user.as_deref(), &cwd, explicit)
    }

    /// Load layered configuration from explicit locations
    ///
    /// Missing user and local files are skipped; a missing explicit file is an error.
    pub fn load_layers(
        user: Option<&Path>,
        dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = user.filter(|p| p.exists()) {
            tracing::debug!(path = %path.display(), "loading user config");
            config = config.merge(Self::from_file(path)?);
        }

        let local = dir.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            tracing::debug!(path = %local.display(), "loading local config");
            config = config.merge(Self::from_file(&local)?);
        }

        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading explicit config");
            config = config.merge(Self::from_file(path)?);
        }

        Ok(config)
    }

    /// Overlay `other` on top of `self`
    pub fn merge(self, other: Config) -> Config {
        let analysis = match (self.analysis, other.analysis) {
            (Some(base), Some(over)) => Some(AnalysisConfig {
                default_sample_size: over.default_sample_size.or(base.default_sample_size),
                max_measurements: over.max_measurements.or(base.max_measurements),
                strict_factors: over.strict_factors.or(base.strict_factors),
            }),
            (base, over) => over.or(base),
        };
        Config { analysis }
    }
}

/// Resolved engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineSettings {
    pub default_sample_size: usize,
    pub max_measurements: usize,
    pub strict_factors: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_sample_size: DEFAULT_SAMPLE_SIZE,
            max_measurements: DEFAULT_MAX_MEASUREMENTS,
            strict_factors: false,
        }
    }
}

impl EngineSettings {
    /// Create settings from the main Config struct
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_sample_size: config
                .analysis
                .as_ref()
                .and_then(|a| a.default_sample_size)
                .unwrap_or(DEFAULT_SAMPLE_SIZE),
            max_measurements: config
                .analysis
                .as_ref()
                .and_then(|a| a.max_measurements)
                .unwrap_or(DEFAULT_MAX_MEASUREMENTS),
            strict_factors: config
                .analysis
                .as_ref()
                .and_then(|a| a.strict_factors)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_engine_settings_default() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_sample_size, 5);
        assert_eq!(settings.max_measurements, 100);
        assert!(!settings.strict_factors);
        assert_eq!(EngineSettings::from_config(&Config::default()), settings);
    }

    #[test]
    fn test_merge_overrides_field_by_field() {
        let base = Config {
            analysis: Some(AnalysisConfig {
                default_sample_size: Some(4),
                max_measurements: Some(50),
                strict_factors: None,
            }),
        };
        let over = Config {
            analysis: Some(AnalysisConfig {
                default_sample_size: None,
                max_measurements: Some(200),
                strict_factors: Some(true),
            }),
        };

        let settings = EngineSettings::from_config(&base.merge(over));
        assert_eq!(settings.default_sample_size, 4);
        assert_eq!(settings.max_measurements, 200);
        assert!(settings.strict_factors);
    }

    #[test]
    fn test_load_layers() {
        let tmp = TempDir::new().unwrap();
        let user = tmp.path().join("user.yaml");
        fs::write(&user, "analysis:\n  default_sample_size: 3\n  max_measurements: 40\n").unwrap();
        fs::write(
            tmp.path().join(LOCAL_CONFIG_FILE),
            "analysis:\n  max_measurements: 60\n",
        )
        .unwrap();

        let config = Config::load_layers(Some(&user), tmp.path(), None).unwrap();
        let settings = EngineSettings::from_config(&config);
        assert_eq!(settings.default_sample_size, 3);
        assert_eq!(settings.max_measurements, 60);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.yaml");
        let err = Config::load_layers(None, tmp.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.yaml");
        fs::write(&path, "analysis:\n  max_measurements: lots\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }
}
