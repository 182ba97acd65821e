//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Application configuration, loaded from a TOML file.
///
/// Every field has a default so a missing or partial file works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Current tariff, cents per kWh. Supplied by the provider; the core
    /// only carries it for display.
    #[serde(default = "default_rate_now")]
    pub rate_now: f64,

    /// Forecast daily usage in kWh, supplied by policy outside this core.
    #[serde(default = "default_expected_today_kwh")]
    pub expected_today_kwh: f64,

    /// Offset from UTC in minutes used to align the "today" window to
    /// local midnight. Week/month windows are sliding and unaffected.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Override for the database location.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_rate_now() -> f64 {
    28.5
}

fn default_expected_today_kwh() -> f64 {
    12.5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_now: default_rate_now(),
            expected_today_kwh: default_expected_today_kwh(),
            utc_offset_minutes: 0,
            db_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path, falling back to defaults if
    /// the file does not exist. A malformed file is an error, not a silent
    /// fallback.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Default configuration file path following platform conventions.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wattbank")
            .join("config.toml")
    }
}
