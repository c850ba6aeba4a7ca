//! Storage Config

use std::path::PathBuf;

use clap::Args;
use directories::ProjectDirs;

use crate::config::ConfigError;

/// Local state settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory for persisted client state; defaults to the platform data
    /// directory
    #[arg(long, env = "SOUQ_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The configured data directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns an error when no directory is configured and the platform has
    /// no home directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        ProjectDirs::from("com", "Souq", "souq")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }
}
