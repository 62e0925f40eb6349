//! Configuration system

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::foundation::time::{MAX_LOGIC_RATE, MIN_LOGIC_RATE};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Load configuration from file, falling back to `fallback` when the file
    /// does not exist
    ///
    /// A file that exists but fails to parse is still an error.
    fn load_or(path: &str, fallback: Self) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            log::info!("Loading configuration from {}", path);
            Self::load_from_file(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path);
            Ok(fallback)
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is out of its valid range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Application loop configuration
///
/// Every field has a default so configuration files only need to name the
/// values they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title
    pub title: String,

    /// Initial window width in pixels
    pub display_width: u32,

    /// Initial window height in pixels
    pub display_height: u32,

    /// Width of the logical game screen (offscreen buffer)
    pub screen_width: u32,

    /// Height of the logical game screen (offscreen buffer)
    pub screen_height: u32,

    /// Logic updates per second
    pub logic_rate: f64,

    /// Bitmap asset loaded at startup, if the application uses one
    pub asset_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Frame Engine Application".to_string(),
            display_width: 800,
            display_height: 600,
            screen_width: 800,
            screen_height: 600,
            logic_rate: 60.0,
            asset_path: None,
        }
    }
}

impl Config for AppConfig {}

impl AppConfig {
    /// Check that sizes and rates are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(ConfigError::Invalid {
                field: "display size",
                reason: format!("{}x{} has a zero dimension", self.display_width, self.display_height),
            });
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::Invalid {
                field: "screen size",
                reason: format!("{}x{} has a zero dimension", self.screen_width, self.screen_height),
            });
        }
        if !(MIN_LOGIC_RATE..=MAX_LOGIC_RATE).contains(&self.logic_rate) {
            return Err(ConfigError::Invalid {
                field: "logic_rate",
                reason: format!(
                    "{} Hz is outside {} ..= {} Hz",
                    self.logic_rate, MIN_LOGIC_RATE, MAX_LOGIC_RATE
                ),
            });
        }
        Ok(())
    }

    /// Resolve the configured asset path
    ///
    /// Tries the path as given, then relative to a few common locations so
    /// binaries work when launched from the workspace root or the crate
    /// directory.
    pub fn resolve_asset_path(&self) -> Option<PathBuf> {
        let asset = self.asset_path.as_deref()?;
        resolve_path(asset)
    }
}

/// Find `relative` under the usual launch directories
pub fn resolve_path(relative: &str) -> Option<PathBuf> {
    let search_dirs = ["", "demo_app/", "../", "../demo_app/"];

    search_dirs
        .iter()
        .map(|dir| PathBuf::from(format!("{dir}{relative}")))
        .find(|candidate| candidate.exists())
}
