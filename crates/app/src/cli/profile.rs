use clap::{Args, Subcommand};
use souq_app::{
    context::AppContext,
    domain::{
        language::Language,
        profiles::records::{ProfileUpdate, Theme},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProfileSubcommand {
    /// Update profile settings
    Update(UpdateProfileArgs),
}

#[derive(Debug, Args)]
struct UpdateProfileArgs {
    /// Display name
    #[arg(long)]
    name: Option<String>,

    /// Preferred language
    #[arg(long, value_enum)]
    language: Option<Language>,

    /// Colour theme
    #[arg(long, value_enum)]
    theme: Option<Theme>,
}

pub(crate) async fn run(command: ProfileCommand, context: &AppContext) -> Result<(), String> {
    let ProfileSubcommand::Update(args) = command.command;

    let update = ProfileUpdate {
        name: args.name,
        preferred_language: args.language,
        theme: args.theme,
        favorites: None,
    };

    if update.is_empty() {
        return Err("nothing to update".to_string());
    }

    let profile = context
        .session
        .update_profile(update)
        .await
        .map_err(|error| format!("failed to update profile: {error}"))?;

    if let Some(language) = args.language {
        context.language.set_language(language);
    }

    println!("name: {}", profile.name);
    println!("language: {}", profile.preferred_language);
    println!("theme: {}", profile.theme);

    Ok(())
}
