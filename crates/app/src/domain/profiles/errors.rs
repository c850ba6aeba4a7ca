//! Profile store errors.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("profile not found")]
    NotFound,

    #[error("the profile store is not configured")]
    NotConfigured,

    #[error("the profile store rejected the session")]
    Unauthorized,

    #[error("the profile store responded with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("profile document has an invalid `{0}` field")]
    InvalidDocument(&'static str),

    #[error("could not reach the profile store")]
    Http(#[source] reqwest::Error),

    #[error("the profile store returned an unexpected payload")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProfileStoreError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(StatusCode::NOT_FOUND) => Self::NotFound,
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Self::Unauthorized,
            _ => Self::Http(error),
        }
    }
}
