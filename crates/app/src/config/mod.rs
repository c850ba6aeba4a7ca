//! Application configuration

use clap::Args;
use thiserror::Error;

pub mod catalog;
pub mod identity;
pub mod logging;
pub mod storage;

pub use catalog::CatalogConfig;
pub use identity::IdentityConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use storage::StorageConfig;

/// Storefront client configuration.
///
/// Flattened into the binary's command line; every field can also be set
/// from the environment or a `.env` file.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Product catalog settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// Identity provider and profile store settings.
    #[command(flatten)]
    pub identity: IdentityConfig,

    /// Local state settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory could be determined; set SOUQ_DATA_DIR")]
    NoDataDir,
}
