//! Profile Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::domain::{language::Language, products::records::ProductId};

/// Colour theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unsupported theme: {other}")),
        }
    }
}

/// Favorite key for a product, as stored on the profile document.
#[must_use]
pub fn favorite_key(product: ProductId) -> String {
    product.to_string()
}

/// User profile document.
///
/// A read replica of the document held by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub preferred_language: Language,
    pub theme: Theme,

    /// Product identifiers; each appears at most once.
    pub favorites: Vec<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserProfile {
    #[must_use]
    pub fn is_favorite(&self, product: ProductId) -> bool {
        let key = favorite_key(product);

        self.favorites.iter().any(|favorite| *favorite == key)
    }
}

/// New Profile Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub preferred_language: Option<Language>,
    pub theme: Option<Theme>,
}

/// Profile Update Data
///
/// Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub preferred_language: Option<Language>,
    pub theme: Option<Theme>,
    pub favorites: Option<Vec<String>>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.preferred_language.is_none()
            && self.theme.is_none()
            && self.favorites.is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::test::helpers::make_profile;

    use super::*;

    #[test]
    fn is_favorite_matches_string_keys() {
        let mut profile = make_profile("user-1");
        profile.favorites = vec!["12".to_string(), "7".to_string()];

        assert!(profile.is_favorite(12));
        assert!(!profile.is_favorite(1));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(
            !ProfileUpdate {
                theme: Some(Theme::Dark),
                ..ProfileUpdate::default()
            }
            .is_empty()
        );
    }
}
