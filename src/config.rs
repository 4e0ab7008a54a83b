//! Runtime configuration: upstream endpoints, data location and the GDP estimator.
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) is a valid configuration.

use crate::api::{DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, FieldError, Result};
use crate::estimate::Multiplier;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const STORE_FILE_NAME: &str = "countries.json";
pub const CACHE_DIR_NAME: &str = "cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub countries_url: String,
    pub rates_url: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
    pub gdp_multiplier: Multiplier,
    /// Pins the random source; unset means a fresh entropy seed per refresh.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: Self::default_data_dir(),
            gdp_multiplier: Multiplier::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("country-atlas"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::ValidationFailed(vec![FieldError::new(
                "config",
                format!("cannot read {}: {e}", path.display()),
            )])
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            Error::ValidationFailed(vec![FieldError::new(
                "config",
                format!("cannot parse {}: {e}", path.display()),
            )])
        })?;
        config.validate()?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.countries_url.trim().is_empty() {
            errors.push(FieldError::new("countries_url", "must not be empty"));
        }
        if self.rates_url.trim().is_empty() {
            errors.push(FieldError::new("rates_url", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            errors.push(FieldError::new("timeout_secs", "must be at least 1"));
        }
        if let Err(Error::ValidationFailed(mut e)) = self.gdp_multiplier.validate() {
            errors.append(&mut e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(errors))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR_NAME)
    }
}
