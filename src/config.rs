//! Configuration management for dissolve

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{DissolveError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Label assigned where the mask touches the region edge
    pub background: i64,
    /// Number of progress updates per run
    pub progress_updates: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Compress written images
    pub compress: bool,
    /// Suffix appended to the input stem for derived output names
    pub suffix: String,
    /// Extension of derived output names (mha or mhd)
    pub extension: String,
    /// Default output directory
    pub dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            background: 0,
            progress_updates: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compress: true,
            suffix: "_dissolved".to_string(),
            extension: "mha".to_string(),
            dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DissolveError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("dissolve").join("config.toml"))
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DissolveError::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Reset the configuration file at `path` to defaults
    pub fn reset(path: &Path) -> Result<()> {
        Self::default().save_to(path)
    }

    /// Initialize the configuration file at `path`
    pub fn init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(DissolveError::Config(
                "Configuration file already exists. Use --force to overwrite.".into()
            ));
        }

        Self::default().save_to(path)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.general.jobs == Some(0) {
            return Err(DissolveError::Config("general.jobs must be at least 1".into()));
        }
        if !matches!(self.output.extension.as_str(), "mha" | "mhd") {
            return Err(DissolveError::Config(format!(
                "output.extension must be 'mha' or 'mhd', got '{}'",
                self.output.extension
            )));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "general.jobs" => self.general.jobs.map(|j| j.to_string()),

            "filter.background" => Some(self.filter.background.to_string()),
            "filter.progress_updates" => Some(self.filter.progress_updates.to_string()),

            "output.compress" => Some(self.output.compress.to_string()),
            "output.suffix" => Some(self.output.suffix.clone()),
            "output.extension" => Some(self.output.extension.clone()),
            "output.dir" => self.output.dir.as_ref().map(|p| p.display().to_string()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "general.jobs" => {
                self.general.jobs = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        DissolveError::Config("Invalid number for jobs".into())
                    })?)
                };
            }

            "filter.background" => {
                self.filter.background = value.parse().map_err(|_| {
                    DissolveError::Config("Invalid integer for background".into())
                })?;
            }
            "filter.progress_updates" => {
                self.filter.progress_updates = value.parse().map_err(|_| {
                    DissolveError::Config("Invalid number for progress_updates".into())
                })?;
            }

            "output.compress" => {
                self.output.compress = value.parse().map_err(|_| {
                    DissolveError::Config("Invalid boolean for compress".into())
                })?;
            }
            "output.suffix" => {
                self.output.suffix = value.to_string();
            }
            "output.extension" => {
                self.output.extension = value.trim_start_matches('.').to_lowercase();
            }
            "output.dir" => {
                self.output.dir = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
            }

            "logging.level" => {
                self.logging.level = value.to_string();
            }
            "logging.color" => {
                self.logging.color = value.parse().map_err(|_| {
                    DissolveError::Config("Invalid boolean for color".into())
                })?;
            }

            _ => {
                return Err(DissolveError::Config(format!("Unknown configuration key: {}", key)));
            }
        }

        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filter.background, 0);
        assert!(config.output.compress);
        assert_eq!(config.output.extension, "mha");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        config.set("filter.background", "-3").unwrap();
        assert_eq!(config.get("filter.background"), Some("-3".to_string()));

        config.set("output.extension", ".MHD").unwrap();
        assert_eq!(config.get("output.extension"), Some("mhd".to_string()));

        assert!(config.set("output.extension", "png").is_err());
        assert!(config.set("general.jobs", "0").is_err());
        assert!(config.set("output.compress", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config.get("nope"), None);
    }

    #[test]
    fn test_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut config = Config::default();
        config.set("general.jobs", "4").unwrap();
        config.set("output.suffix", "_filled").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(Config::init(&path, false).is_err());
        Config::init(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[filter]\nbackground = 7\nprogress_updates = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.filter.background, 7);
        assert_eq!(config.output, OutputConfig::default());
    }
}
