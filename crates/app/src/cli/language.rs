use clap::{Args, Subcommand};
use souq_app::{
    context::AppContext,
    domain::language::{Language, LanguageSettings},
};

#[derive(Debug, Args)]
pub(crate) struct LanguageCommand {
    #[command(subcommand)]
    command: LanguageSubcommand,
}

#[derive(Debug, Subcommand)]
enum LanguageSubcommand {
    /// Show the current language and text direction
    Show,

    /// Switch to a language
    Set(SetLanguageArgs),

    /// Switch between English and Arabic
    Toggle,
}

#[derive(Debug, Args)]
struct SetLanguageArgs {
    #[arg(value_enum)]
    language: Language,
}

pub(crate) async fn run(command: LanguageCommand, context: &AppContext) -> Result<(), String> {
    let settings = match command.command {
        LanguageSubcommand::Show => context.language.settings(),
        LanguageSubcommand::Set(args) => context.set_language(args.language).await,
        LanguageSubcommand::Toggle => context.toggle_language().await,
    };

    print_settings(settings);

    Ok(())
}

fn print_settings(settings: LanguageSettings) {
    println!(
        "{} ({}) {}",
        settings.language,
        settings.language.native_name(),
        settings.direction
    );
}
