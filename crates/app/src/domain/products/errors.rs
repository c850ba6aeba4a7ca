//! Product source errors.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductSourceError {
    #[error("product not found")]
    NotFound,

    #[error("invalid product catalog address: {0}")]
    InvalidBaseUrl(String),

    #[error("the product catalog did not respond in time")]
    Timeout,

    #[error("the product catalog responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not reach the product catalog")]
    Http(#[source] reqwest::Error),

    #[error("the product catalog returned an unexpected payload")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProductSourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }

        match error.status() {
            Some(StatusCode::NOT_FOUND) => Self::NotFound,
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None => Self::Http(error),
        }
    }
}
