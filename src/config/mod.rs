//! Configuration loading for `PartDesk`.
//!
//! Settings come from an optional TOML file (`partdesk.toml`, or the path in
//! `PARTDESK_CONFIG`) with environment variables taking precedence. The
//! `.env` file is loaded by `main` before this module runs, so both sources
//! end up visible here as plain environment variables.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// How new application identifiers are generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Store-issued push key. Unique without coordination.
    #[default]
    PushKey,
    /// Human-readable "APPnnnn" derived from the current record count.
    /// Two near-simultaneous submitters can compute the same next number;
    /// see DESIGN.md before enabling this in a multi-writer deployment.
    Sequential,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "push_key" => Ok(Self::PushKey),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown id strategy: {other}")),
        }
    }
}

/// Resolved application settings.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Document store base URL
    pub database_url: String,
    /// Blob store base URL
    pub storage_url: String,
    pub id_strategy: IdStrategy,
}

/// Raw TOML shape - everything optional so the file can be partial or absent.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    database_url: Option<String>,
    storage_url: Option<String>,
    id_strategy: Option<IdStrategy>,
}

/// Environment overrides, read once so resolution stays a pure function.
#[derive(Debug, Default)]
struct EnvOverrides {
    database_url: Option<String>,
    storage_url: Option<String>,
    id_strategy: Option<String>,
}

impl EnvOverrides {
    fn from_process_env() -> Self {
        Self {
            database_url: std::env::var("PARTDESK_DATABASE_URL").ok(),
            storage_url: std::env::var("PARTDESK_STORAGE_URL").ok(),
            id_strategy: std::env::var("PARTDESK_ID_STRATEGY").ok(),
        }
    }
}

fn resolve(raw: RawSettings, env: EnvOverrides) -> Result<Settings> {
    let id_strategy = match env.id_strategy {
        Some(value) => value
            .parse()
            .map_err(|message| Error::Config { message })?,
        None => raw.id_strategy.unwrap_or_default(),
    };

    Ok(Settings {
        database_url: env.database_url.or(raw.database_url).ok_or_else(|| {
            Error::Config {
                message: "database_url not set (partdesk.toml or PARTDESK_DATABASE_URL)"
                    .to_string(),
            }
        })?,
        storage_url: env.storage_url.or(raw.storage_url).ok_or_else(|| {
            Error::Config {
                message: "storage_url not set (partdesk.toml or PARTDESK_STORAGE_URL)"
                    .to_string(),
            }
        })?,
        id_strategy,
    })
}

fn read_raw<P: AsRef<Path>>(path: P) -> Result<RawSettings> {
    if !path.as_ref().exists() {
        return Ok(RawSettings::default());
    }

    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Loads settings from the config file and the process environment.
///
/// # Errors
/// Returns `Error::Config` when the file is unreadable or malformed, or when
/// either store URL ends up unset.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var("PARTDESK_CONFIG").unwrap_or_else(|_| "partdesk.toml".to_string());
    resolve(read_raw(path)?, EnvOverrides::from_process_env())
}
