//! Auth data models.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{auth::SecretToken, domain::profiles::records::UserProfile};

/// Seconds before the nominal expiry at which an ID token is treated as expired.
pub const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 60;

/// A signed-in user, as persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Bearer token for the profile store.
    pub id_token: SecretToken,

    pub refresh_token: SecretToken,

    pub expires_at: Timestamp,
}

impl AuthUser {
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.as_second().saturating_add(TOKEN_EXPIRY_SKEW_SECONDS) >= self.expires_at.as_second()
    }
}

/// Credential obtained from an OAuth provider's consent flow.
#[derive(Debug, Clone, PartialEq)]
pub struct IdpCredential {
    /// Provider identifier, e.g. `"google.com"`.
    pub provider_id: String,

    pub id_token: Option<SecretToken>,
    pub access_token: Option<SecretToken>,
}

impl IdpCredential {
    #[must_use]
    pub fn google(id_token: SecretToken) -> Self {
        Self {
            provider_id: "google.com".to_string(),
            id_token: Some(id_token),
            access_token: None,
        }
    }
}

/// Authentication state published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,

    /// Read replica of the user's profile document.
    pub profile: Option<UserProfile>,

    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
