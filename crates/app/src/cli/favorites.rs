use clap::{Args, Subcommand};
use souq_app::{context::AppContext, domain::products::records::ProductId};

#[derive(Debug, Args)]
pub(crate) struct FavoritesCommand {
    #[command(subcommand)]
    command: FavoritesSubcommand,
}

#[derive(Debug, Subcommand)]
enum FavoritesSubcommand {
    /// List favorite product identifiers
    List,

    /// Add a favorite
    Add(FavoriteArgs),

    /// Remove a favorite
    Remove(FavoriteArgs),

    /// Add or remove a favorite depending on its current state
    Toggle(FavoriteArgs),
}

#[derive(Debug, Args)]
struct FavoriteArgs {
    /// Product identifier
    id: ProductId,
}

pub(crate) async fn run(command: FavoritesCommand, context: &AppContext) -> Result<(), String> {
    let favorites = &context.favorites;

    let (done, id) = match command.command {
        FavoritesSubcommand::List => {
            if !favorites.is_authenticated() {
                return Err("not signed in".to_string());
            }

            for favorite in favorites.favorites() {
                println!("{favorite}");
            }

            println!("{} favorites", favorites.favorites_count());

            return Ok(());
        }
        FavoritesSubcommand::Add(args) => (favorites.add_to_favorites(args.id).await, args.id),
        FavoritesSubcommand::Remove(args) => {
            (favorites.remove_from_favorites(args.id).await, args.id)
        }
        FavoritesSubcommand::Toggle(args) => (favorites.toggle_favorite(args.id).await, args.id),
    };

    if !done {
        let error = favorites
            .status()
            .error
            .unwrap_or_else(|| "unknown error".to_string());

        return Err(format!("failed to update favorites: {error}"));
    }

    println!("product {id} favorite: {}", favorites.is_favorite(id));

    Ok(())
}
