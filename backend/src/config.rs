//! Runtime configuration read from the environment.

use anyhow::Result;
use log::info;
use std::env;
use std::path::PathBuf;

use crate::storage::csv::CsvConnection;

/// Overrides the data directory
pub const DATA_DIR_ENV: &str = "BOARD_FOOT_DATA_DIR";
/// Log filter directive, e.g. `debug` or `board_foot_backend=trace`
pub const LOG_FILTER_ENV: &str = "BOARD_FOOT_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub data_directory: PathBuf,
    pub log_filter: String,
}

impl BackendConfig {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Build the configuration from `BOARD_FOOT_DATA_DIR` and `BOARD_FOOT_LOG`,
    /// falling back to the Documents folder (or its redirect) and `info`
    pub fn from_env() -> Result<Self> {
        let data_directory = match non_empty_var(DATA_DIR_ENV) {
            Some(dir) => {
                info!("Using data directory from {}: {}", DATA_DIR_ENV, dir);
                PathBuf::from(dir)
            }
            None => CsvConnection::resolve_default_directory()?,
        };
        let log_filter = non_empty_var(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            data_directory,
            log_filter,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
