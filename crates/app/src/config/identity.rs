//! Identity Config

use std::time::Duration;

use clap::Args;

use crate::{
    auth::{IdentityToolkitConfig, SecretToken},
    domain::profiles::FirestoreConfig,
};

/// Identity provider and profile store settings.
#[derive(Debug, Args)]
pub struct IdentityConfig {
    /// Firebase Web API key
    #[arg(long, env = "FIREBASE_API_KEY", hide_env_values = true)]
    pub firebase_api_key: Option<String>,

    /// Firebase project holding the profile documents
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,

    /// Identity Toolkit API address
    #[arg(
        long,
        env = "IDENTITY_TOOLKIT_URL",
        default_value = "https://identitytoolkit.googleapis.com"
    )]
    pub identity_toolkit_url: String,

    /// Secure Token API address
    #[arg(
        long,
        env = "SECURE_TOKEN_URL",
        default_value = "https://securetoken.googleapis.com"
    )]
    pub secure_token_url: String,

    /// Firestore API address
    #[arg(long, env = "FIRESTORE_URL", default_value = "https://firestore.googleapis.com")]
    pub firestore_url: String,

    /// Page that completes passwordless sign-in links
    #[arg(
        long,
        env = "SIGN_IN_CONTINUE_URL",
        default_value = "http://localhost:3000/auth/complete"
    )]
    pub sign_in_continue_url: String,

    /// Identity and profile request timeout in seconds
    #[arg(long, env = "IDENTITY_TIMEOUT_SECONDS", default_value_t = 10)]
    pub identity_timeout_seconds: u64,
}

impl IdentityConfig {
    #[must_use]
    pub fn toolkit_config(&self) -> IdentityToolkitConfig {
        IdentityToolkitConfig {
            api_key: self
                .firebase_api_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .map(SecretToken::new),
            identity_toolkit_url: self.identity_toolkit_url.clone(),
            secure_token_url: self.secure_token_url.clone(),
            timeout: self.timeout(),
        }
    }

    #[must_use]
    pub fn firestore_config(&self) -> FirestoreConfig {
        FirestoreConfig {
            base_url: self.firestore_url.clone(),
            project_id: self
                .firebase_project_id
                .clone()
                .filter(|project| !project.is_empty()),
            timeout: self.timeout(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_seconds)
    }
}
