//! Souq storefront CLI

use std::process;

use tracing::error;

mod cli;

#[tokio::main]
pub async fn main() {
    let cli = match cli::Cli::load() {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };

    if let Err(error) = souq_app::observability::init_subscriber(&cli.config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        error!(%error, "command failed");
        eprintln!("{error}");
        process::exit(1);
    }
}
