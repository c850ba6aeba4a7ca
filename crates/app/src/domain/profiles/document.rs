//! Firestore document encoding for profiles.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::domain::{
    language::Language,
    profiles::{
        errors::ProfileStoreError,
        records::{NewProfile, ProfileUpdate, Theme, UserProfile},
    },
};

pub(crate) const UID: &str = "uid";
pub(crate) const EMAIL: &str = "email";
pub(crate) const NAME: &str = "name";
pub(crate) const PREFERRED_LANGUAGE: &str = "preferredLanguage";
pub(crate) const THEME: &str = "theme";
pub(crate) const FAVORITES: &str = "favorites";
pub(crate) const CREATED_AT: &str = "createdAt";
pub(crate) const UPDATED_AT: &str = "updatedAt";

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(Timestamp),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    pub(crate) fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    pub(crate) fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ArrayValue(ArrayValue {
            values: values
                .into_iter()
                .map(|value| Self::StringValue(value.into()))
                .collect(),
        })
    }
}

/// Firestore document resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    fn string(&self, field: &'static str) -> Result<Option<&str>, ProfileStoreError> {
        match self.fields.get(field) {
            None | Some(Value::NullValue(())) => Ok(None),
            Some(Value::StringValue(value)) => Ok(Some(value)),
            Some(_) => Err(ProfileStoreError::InvalidDocument(field)),
        }
    }

    fn required_string(&self, field: &'static str) -> Result<String, ProfileStoreError> {
        self.string(field)?
            .map(str::to_string)
            .ok_or(ProfileStoreError::InvalidDocument(field))
    }

    fn timestamp(&self, field: &'static str) -> Result<Timestamp, ProfileStoreError> {
        match self.fields.get(field) {
            Some(Value::TimestampValue(value)) => Ok(*value),
            _ => Err(ProfileStoreError::InvalidDocument(field)),
        }
    }

    fn string_list(&self, field: &'static str) -> Result<Vec<String>, ProfileStoreError> {
        match self.fields.get(field) {
            None | Some(Value::NullValue(())) => Ok(Vec::new()),
            Some(Value::ArrayValue(array)) => {
                let mut values: Vec<String> = Vec::with_capacity(array.values.len());

                for value in &array.values {
                    let Value::StringValue(value) = value else {
                        return Err(ProfileStoreError::InvalidDocument(field));
                    };

                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }

                Ok(values)
            }
            Some(_) => Err(ProfileStoreError::InvalidDocument(field)),
        }
    }

    /// Document id: the last segment of the resource name.
    fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|name| name.rsplit('/').next())
    }
}

impl TryFrom<Document> for UserProfile {
    type Error = ProfileStoreError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let uid = match document.string(UID)? {
            Some(uid) => uid.to_string(),
            None => document
                .id()
                .map(str::to_string)
                .ok_or(ProfileStoreError::InvalidDocument(UID))?,
        };

        let preferred_language = document
            .string(PREFERRED_LANGUAGE)?
            .map(str::parse::<Language>)
            .transpose()
            .map_err(|_| ProfileStoreError::InvalidDocument(PREFERRED_LANGUAGE))?
            .unwrap_or_default();

        let theme = document
            .string(THEME)?
            .map(str::parse::<Theme>)
            .transpose()
            .map_err(|_| ProfileStoreError::InvalidDocument(THEME))?
            .unwrap_or_default();

        Ok(Self {
            uid,
            email: document.string(EMAIL)?.unwrap_or_default().to_string(),
            name: document.required_string(NAME)?,
            preferred_language,
            theme,
            favorites: document.string_list(FAVORITES)?,
            created_at: document.timestamp(CREATED_AT)?,
            updated_at: document.timestamp(UPDATED_AT)?,
        })
    }
}

/// Fields for a freshly created profile document.
pub(crate) fn new_profile_fields(profile: &NewProfile, now: Timestamp) -> BTreeMap<String, Value> {
    BTreeMap::from([
        (UID.to_string(), Value::string(&profile.uid)),
        (EMAIL.to_string(), Value::string(&profile.email)),
        (NAME.to_string(), Value::string(&profile.name)),
        (
            PREFERRED_LANGUAGE.to_string(),
            Value::string(profile.preferred_language.unwrap_or_default().code()),
        ),
        (
            THEME.to_string(),
            Value::string(profile.theme.unwrap_or_default().code()),
        ),
        (FAVORITES.to_string(), Value::strings(Vec::<String>::new())),
        (CREATED_AT.to_string(), Value::TimestampValue(now)),
        (UPDATED_AT.to_string(), Value::TimestampValue(now)),
    ])
}

/// Fields written by a partial update, always including `updatedAt`.
pub(crate) fn update_fields(update: &ProfileUpdate, now: Timestamp) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::from([(UPDATED_AT.to_string(), Value::TimestampValue(now))]);

    if let Some(name) = &update.name {
        fields.insert(NAME.to_string(), Value::string(name));
    }

    if let Some(language) = update.preferred_language {
        fields.insert(PREFERRED_LANGUAGE.to_string(), Value::string(language.code()));
    }

    if let Some(theme) = update.theme {
        fields.insert(THEME.to_string(), Value::string(theme.code()));
    }

    if let Some(favorites) = &update.favorites {
        let mut unique: Vec<&str> = Vec::with_capacity(favorites.len());

        for favorite in favorites {
            if !unique.contains(&favorite.as_str()) {
                unique.push(favorite);
            }
        }

        fields.insert(FAVORITES.to_string(), Value::strings(unique));
    }

    fields
}
