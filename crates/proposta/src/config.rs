//! Runtime settings read from the environment

use docx_core::Length;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_TEMPLATES_DIR: &str = "PROPOSTA_TEMPLATES_DIR";
pub const ENV_DATABASE: &str = "PROPOSTA_DATABASE";
pub const ENV_CONVERTER: &str = "PROPOSTA_CONVERTER";
pub const ENV_CONVERT_TIMEOUT_SECS: &str = "PROPOSTA_CONVERT_TIMEOUT_SECS";
pub const ENV_IMAGE_MAX_WIDTH_MM: &str = "PROPOSTA_IMAGE_MAX_WIDTH_MM";
pub const ENV_PURGE_DAYS: &str = "PROPOSTA_PURGE_DAYS";

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {key}: {value:?} ({reason})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Application settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding `proposta.docx` and `contrato.docx`
    pub templates_dir: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Office converter program
    pub converter: String,
    pub convert_timeout: Duration,
    /// Widest an inserted image may be
    pub image_max_width: Length,
    /// Default age, in days, for `purge`
    pub purge_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            database: PathBuf::from("propostas.db"),
            converter: "soffice".to_string(),
            convert_timeout: Duration::from_secs(60),
            image_max_width: Length::from_mm(150.0),
            purge_days: 30,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a variable lookup; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_TEMPLATES_DIR) {
            settings.templates_dir = PathBuf::from(dir);
        }
        if let Some(db) = get(ENV_DATABASE) {
            settings.database = PathBuf::from(db);
        }
        if let Some(program) = get(ENV_CONVERTER) {
            settings.converter = program;
        }
        if let Some(value) = get(ENV_CONVERT_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_CONVERT_TIMEOUT_SECS, &value)?;
            if secs == 0 {
                return Err(ConfigError {
                    key: ENV_CONVERT_TIMEOUT_SECS,
                    value,
                    reason: "must be at least 1",
                });
            }
            settings.convert_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get(ENV_IMAGE_MAX_WIDTH_MM) {
            let mm: f64 = parse_number(ENV_IMAGE_MAX_WIDTH_MM, &value)?;
            if !(mm.is_finite() && mm > 0.0) {
                return Err(ConfigError {
                    key: ENV_IMAGE_MAX_WIDTH_MM,
                    value,
                    reason: "must be a positive number of millimetres",
                });
            }
            settings.image_max_width = Length::from_mm(mm);
        }
        if let Some(value) = get(ENV_PURGE_DAYS) {
            settings.purge_days = parse_number(ENV_PURGE_DAYS, &value)?;
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        key,
        value: value.to_string(),
        reason: "not a number",
    })
}
