use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

const APP_DIR: &str = "compendium-ingest";

/// Top-level importer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    /// Where the binary writes one JSON file per imported document.
    pub output_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub import: ImportConfig,
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// Override the log directory (default: `<data_dir>/logs`).
    pub log_dir: Option<PathBuf>,
    /// Also write JSON logs to a daily rolling file.
    pub json_file: bool,
}

/// Directory import behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Parse files on the rayon thread pool.
    pub parallel: bool,
    /// Extension of the files picked up by a directory import.
    pub file_extension: String,
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            output_dir: None,
            logging: LoggingConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_file: true,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            file_extension: "xml".to_string(),
            follow_symlinks: false,
        }
    }
}

impl IngestConfig {
    /// Load configuration from `~/.config/compendium-ingest/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}; using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Load an explicit configuration file, failing on a missing or invalid file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| IngestError::Config(format!("{}: {e}", path.display())))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| IngestError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Resolved log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs"))
    }

    /// Resolved output directory for JSON records.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("records"))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.json_file);
        assert!(config.import.parallel);
        assert_eq!(config.import.file_extension, "xml");
        assert!(!config.import.follow_symlinks);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_config_load_missing_file() {
        // Falls back to defaults without panicking
        let config = IngestConfig::load();
        assert_eq!(config.import.file_extension, IngestConfig::default().import.file_extension);
    }

    #[test]
    fn test_directory_overrides() {
        let mut config = IngestConfig::default();
        config.data_dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/custom"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/custom/logs"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/custom/records"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: IngestConfig = toml::from_str("[import]\nparallel = false\n").unwrap();
        assert!(!config.import.parallel);
        assert_eq!(config.import.file_extension, "xml");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = IngestConfig::default();
        config.output_dir = Some(PathBuf::from("/srv/records"));
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: IngestConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
