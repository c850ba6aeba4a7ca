//! Secret token wrapper.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// An ID, refresh or API token.
///
/// Redacted from `Debug` output and wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretToken(String);

impl SecretToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(**redacted**)")
    }
}

impl Drop for SecretToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let token = SecretToken::new("eyJhbGciOi");

        assert_eq!(format!("{token:?}"), "SecretToken(**redacted**)");
        assert_eq!(token.expose(), "eyJhbGciOi");
    }

    #[test]
    fn serializes_as_plain_string() -> testresult::TestResult {
        let token = SecretToken::new("abc");

        assert_eq!(serde_json::to_string(&token)?, r#""abc""#);

        Ok(())
    }
}
