//! Auth errors.

use thiserror::Error;

use crate::{domain::profiles::ProfileStoreError, storage::StorageError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("you need to sign in first")]
    NotSignedIn,

    #[error("the sign-in link is invalid")]
    InvalidSignInLink,

    #[error("the sign-in link has expired")]
    ExpiredSignInLink,

    #[error("no email address is pending for this sign-in link")]
    MissingPendingEmail,

    #[error("the identity provider is not configured")]
    NotConfigured,

    #[error("the identity provider rejected the request: {code}")]
    Rejected { code: String },

    #[error("could not reach the identity provider")]
    Http(#[from] reqwest::Error),

    #[error("session storage error")]
    Storage(#[from] StorageError),

    #[error("profile error: {0}")]
    Profile(#[from] ProfileStoreError),
}

impl AuthError {
    /// Classify an Identity Toolkit error code such as `INVALID_OOB_CODE`.
    ///
    /// Codes may carry a trailing description (`"INVALID_EMAIL : ..."`).
    #[must_use]
    pub fn from_code(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or(message).trim();

        match code {
            "INVALID_OOB_CODE" => Self::InvalidSignInLink,
            "EXPIRED_OOB_CODE" => Self::ExpiredSignInLink,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_DISABLED" | "USER_NOT_FOUND" => {
                Self::NotSignedIn
            }
            _ => Self::Rejected {
                code: code.to_string(),
            },
        }
    }
}
