use clap::{Parser, Subcommand};
use souq_app::{config::AppConfig, context::AppContext};

mod auth;
mod favorites;
mod language;
mod products;
mod profile;

#[derive(Debug, Parser)]
#[command(name = "souq", about = "Souq storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products(products::ProductsCommand),

    /// List product categories
    Categories,

    /// Manage favorites of the signed-in user
    Favorites(favorites::FavoritesCommand),

    /// Sign in and out
    Auth(auth::AuthCommand),

    /// Show or change the interface language
    Language(language::LanguageCommand),

    /// Manage the signed-in user's profile
    Profile(profile::ProfileCommand),
}

impl Cli {
    /// Parse arguments, loading `.env` first when present.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::new(&self.config)
            .map_err(|error| format!("failed to initialise: {error}"))?;

        context.start().await;

        let result = match self.command {
            Commands::Products(command) => products::run(command, &context).await,
            Commands::Categories => products::categories(&context).await,
            Commands::Favorites(command) => favorites::run(command, &context).await,
            Commands::Auth(command) => auth::run(command, &context).await,
            Commands::Language(command) => language::run(command, &context).await,
            Commands::Profile(command) => profile::run(command, &context).await,
        };

        context.shutdown();

        result
    }
}
