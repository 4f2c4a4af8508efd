//! Runtime settings read from the environment (and `.env`, via `dotenvy`).
//!
//! | variable                   | default                          |
//! |----------------------------|----------------------------------|
//! | `ENROLLMENT_DATA_PATH`     | `data/enrollment.csv`            |
//! | `ENROLLMENT_CSV_DELIMITER` | `;`                              |
//! | `ENROLLMENT_CSV_ENCODING`  | `latin1`                         |
//! | `LOG_FILE_PATH`            | `logs/enrollment_insights.log`   |

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::loader::{Encoding, LoadOptions};

pub const DEFAULT_DATA_PATH: &str = "data/enrollment.csv";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/enrollment_insights.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub load: LoadOptions,
    pub log_file_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            load: LoadOptions::default(),
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(path) = lookup("ENROLLMENT_DATA_PATH") {
            settings.data_path = PathBuf::from(path);
        }
        if let Some(delimiter) = lookup("ENROLLMENT_CSV_DELIMITER") {
            settings.load.delimiter = parse_delimiter(&delimiter)
                .context("ENROLLMENT_CSV_DELIMITER is not usable")?;
        }
        if let Some(encoding) = lookup("ENROLLMENT_CSV_ENCODING") {
            settings.load.encoding = encoding
                .parse::<Encoding>()
                .map_err(anyhow::Error::msg)
                .context("ENROLLMENT_CSV_ENCODING is not usable")?;
        }
        if let Some(path) = lookup("LOG_FILE_PATH") {
            settings.log_file_path = PathBuf::from(path);
        }

        Ok(settings)
    }
}

/// Accepts a single ASCII character, or `\t` / `tab` for tabs.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => bail!("delimiter must be a single ASCII character, got '{value}'"),
    }
}
