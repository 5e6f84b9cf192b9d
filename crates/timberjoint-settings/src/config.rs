//! Application configuration for Timberjoint
//!
//! Holds the defaults used for new designs: fabrication settings, design
//! parameters and where exported files go. Supports JSON and TOML files,
//! stored in the platform config directory unless a path is given.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use timberjoint_core::{DesignParameters, FabricationSettings};
use tracing::debug;

/// File name of the default configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory exported machine files are written to
    pub output_directory: PathBuf,
    /// Defaults for new designs
    pub design: DesignParameters,
    /// Tool and machine defaults
    pub fabrication: FabricationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_directory: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            design: DesignParameters::default(),
            fabrication: FabricationSettings::default(),
        }
    }
}

enum FileFormat {
    Json,
    Toml,
}

fn file_format(path: &Path) -> SettingsResult<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(FileFormat::Json),
        Some("toml") => Ok(FileFormat::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

impl AppConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/timberjoint/config.toml`.
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
        })?;
        Ok(dir.join("timberjoint").join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = file_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match file_format(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.design
            .validate()
            .map_err(|e| SettingsError::InvalidSetting {
                key: "design".to_string(),
                reason: e.to_string(),
            })?;
        self.fabrication
            .validate()
            .map_err(|e| SettingsError::InvalidSetting {
                key: "fabrication".to_string(),
                reason: e.to_string(),
            })?;
        if self.fabrication.effective_diameter() * self.design.voxel_res as f64
            > self.design.timber_dims.iter().copied().fold(f64::INFINITY, f64::min)
        {
            return Err(ConfigError::ValueOutOfRange {
                key: "fabrication.tool_diameter".to_string(),
                value: self.fabrication.tool_diameter.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
