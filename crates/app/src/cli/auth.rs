use clap::{Args, Subcommand};
use souq_app::{
    auth::{AuthSession, IdpCredential, SecretToken},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Sign in with a credential from an OAuth provider
    SignInIdp(SignInIdpArgs),

    /// Email a passwordless sign-in link
    SendLink(SendLinkArgs),

    /// Complete a passwordless sign-in from the emailed link
    Complete(CompleteArgs),

    /// Sign out
    SignOut,

    /// Show the current session
    Status,
}

#[derive(Debug, Args)]
struct SignInIdpArgs {
    /// OAuth provider
    #[arg(long, default_value = "google.com")]
    provider_id: String,

    /// Provider ID token
    #[arg(long, env = "IDP_ID_TOKEN", hide_env_values = true)]
    id_token: Option<String>,

    /// Provider access token
    #[arg(long, env = "IDP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Debug, Args)]
struct SendLinkArgs {
    /// Address to send the link to
    email: String,

    /// Where to go once signed in
    #[arg(long)]
    redirect: Option<String>,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// The sign-in link from the email
    link: String,

    /// Address the link was sent to; defaults to the remembered one
    #[arg(long)]
    email: Option<String>,
}

pub(crate) async fn run(command: AuthCommand, context: &AppContext) -> Result<(), String> {
    let session = &context.session;

    match command.command {
        AuthSubcommand::SignInIdp(args) => {
            if args.id_token.is_none() && args.access_token.is_none() {
                return Err("an --id-token or --access-token is required".to_string());
            }

            let user = session
                .sign_in_with_idp(IdpCredential {
                    provider_id: args.provider_id,
                    id_token: args.id_token.map(SecretToken::new),
                    access_token: args.access_token.map(SecretToken::new),
                })
                .await
                .map_err(|error| format!("sign-in failed: {error}"))?;

            println!("signed in as {}", user.email.as_deref().unwrap_or(&user.uid));
            println!("redirect: {}", session.take_redirect_after_login());
        }
        AuthSubcommand::SendLink(args) => {
            if let Some(redirect) = &args.redirect {
                session
                    .remember_redirect(redirect)
                    .map_err(|error| format!("failed to remember redirect: {error}"))?;
            }

            session
                .send_sign_in_link(&args.email)
                .await
                .map_err(|error| format!("failed to send sign-in link: {error}"))?;

            println!("sign-in link sent to {}", args.email);
        }
        AuthSubcommand::Complete(args) => {
            if !AuthSession::is_sign_in_link(&args.link) {
                return Err("not a sign-in link".to_string());
            }

            let user = session
                .complete_email_sign_in(&args.link, args.email.as_deref())
                .await
                .map_err(|error| format!("sign-in failed: {error}"))?;

            println!("signed in as {}", user.email.as_deref().unwrap_or(&user.uid));
            println!("redirect: {}", session.take_redirect_after_login());
        }
        AuthSubcommand::SignOut => {
            session
                .sign_out()
                .map_err(|error| format!("sign-out failed: {error}"))?;

            println!("signed out");
        }
        AuthSubcommand::Status => {
            let state = session.state();

            let Some(user) = state.user else {
                println!("signed out");
                return Ok(());
            };

            println!("uid: {}", user.uid);
            println!("email: {}", user.email.as_deref().unwrap_or("-"));
            println!("token expires: {}", user.expires_at);

            if let Some(profile) = state.profile {
                println!("name: {}", profile.name);
                println!("language: {}", profile.preferred_language);
                println!("theme: {}", profile.theme);
                println!("favorites: {}", profile.favorites.len());
            }

            if let Some(error) = state.error {
                println!("error: {error}");
            }
        }
    }

    Ok(())
}
