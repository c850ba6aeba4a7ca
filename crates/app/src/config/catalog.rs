//! Catalog Config

use std::time::Duration;

use clap::Args;

use crate::domain::{catalog::DEFAULT_PAGE_SIZE, products::DummyJsonConfig};

/// Product catalog settings.
#[derive(Debug, Args)]
pub struct CatalogConfig {
    /// Product catalog API address
    #[arg(long, env = "PRODUCTS_API_BASE_URL", default_value = "https://dummyjson.com")]
    pub products_api_base_url: String,

    /// Product catalog request timeout in seconds
    #[arg(long, env = "PRODUCTS_API_TIMEOUT_SECONDS", default_value_t = 10)]
    pub products_api_timeout_seconds: u64,

    /// Products requested per page
    #[arg(long, env = "PRODUCTS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub products_page_size: u64,
}

impl CatalogConfig {
    #[must_use]
    pub fn source_config(&self) -> DummyJsonConfig {
        DummyJsonConfig {
            base_url: self.products_api_base_url.clone(),
            timeout: Duration::from_secs(self.products_api_timeout_seconds),
        }
    }
}
