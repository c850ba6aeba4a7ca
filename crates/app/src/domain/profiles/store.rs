//! Profile store.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::{
    auth::AuthUser,
    domain::profiles::{
        document::{self, ArrayValue, Document, Value},
        errors::ProfileStoreError,
        records::{NewProfile, ProfileUpdate, UserProfile},
    },
};

const USERS_COLLECTION: &str = "users";

/// Configuration for the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// API address, e.g. `"https://firestore.googleapis.com"`.
    pub base_url: String,

    /// Firebase project; profile operations fail with `NotConfigured` without it.
    pub project_id: Option<String>,

    pub timeout: Duration,
}

/// Profile documents stored in the `users` collection of Cloud Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreProfileStore {
    base_url: String,
    project_id: Option<String>,
    http: Client,
}

impl FirestoreProfileStore {
    /// Create a new store client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: FirestoreConfig) -> Result<Self, ProfileStoreError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            http,
        })
    }

    fn database(&self) -> Result<String, ProfileStoreError> {
        let project = self
            .project_id
            .as_deref()
            .ok_or(ProfileStoreError::NotConfigured)?;

        Ok(format!("projects/{project}/databases/(default)"))
    }

    fn document_name(&self, uid: &str) -> Result<String, ProfileStoreError> {
        Ok(format!(
            "{}/documents/{USERS_COLLECTION}/{uid}",
            self.database()?
        ))
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/v1/{resource}", self.base_url)
    }

    async fn send(request: RequestBuilder, user: &AuthUser) -> Result<Response, ProfileStoreError> {
        let response = request.bearer_auth(user.id_token.expose()).send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => Err(ProfileStoreError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProfileStoreError::Unauthorized),
            status if !status.is_success() => Err(ProfileStoreError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
            _ => Ok(response),
        }
    }

    async fn decode(response: Response) -> Result<UserProfile, ProfileStoreError> {
        let body = response.bytes().await?;
        let document: Document = serde_json::from_slice(&body)?;

        UserProfile::try_from(document)
    }

    async fn commit_favorites(
        &self,
        user: &AuthUser,
        transform: &str,
        product_id: &str,
    ) -> Result<UserProfile, ProfileStoreError> {
        let name = self.document_name(&user.uid)?;
        let url = self.url(&format!("{}/documents:commit", self.database()?));

        let elements = ArrayValue {
            values: vec![Value::string(product_id)],
        };

        let body = json!({
            "writes": [{
                "update": { "name": name, "fields": {} },
                "updateMask": { "fieldPaths": [] },
                "updateTransforms": [
                    {
                        "fieldPath": document::FAVORITES,
                        transform: elements,
                    },
                    {
                        "fieldPath": document::UPDATED_AT,
                        "setToServerValue": "REQUEST_TIME",
                    }
                ],
                "currentDocument": { "exists": true },
            }]
        });

        debug!(uid = %user.uid, product_id, transform, "committing favorites transform");

        Self::send(self.http.post(url).json(&body), user).await?;

        self.get_profile(user)
            .await?
            .ok_or(ProfileStoreError::NotFound)
    }
}

#[derive(Serialize)]
struct DocumentBody<'a> {
    fields: &'a BTreeMap<String, Value>,
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn get_profile(&self, user: &AuthUser) -> Result<Option<UserProfile>, ProfileStoreError> {
        let url = self.url(&self.document_name(&user.uid)?);

        match Self::send(self.http.get(url), user).await {
            Ok(response) => Self::decode(response).await.map(Some),
            Err(ProfileStoreError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn create_profile(
        &self,
        user: &AuthUser,
        profile: NewProfile,
    ) -> Result<UserProfile, ProfileStoreError> {
        let url = self.url(&format!(
            "{}/documents/{USERS_COLLECTION}",
            self.database()?
        ));

        let fields = document::new_profile_fields(&profile, Timestamp::now());

        let request = self
            .http
            .post(url)
            .query(&[("documentId", profile.uid.as_str())])
            .json(&DocumentBody { fields: &fields });

        Self::decode(Self::send(request, user).await?).await
    }

    async fn update_profile(
        &self,
        user: &AuthUser,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError> {
        let url = self.url(&self.document_name(&user.uid)?);
        let fields = document::update_fields(&update, Timestamp::now());

        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let request = self
            .http
            .patch(url)
            .query(&query)
            .json(&DocumentBody { fields: &fields });

        Self::decode(Self::send(request, user).await?).await
    }

    async fn add_favorite(
        &self,
        user: &AuthUser,
        product_id: &str,
    ) -> Result<UserProfile, ProfileStoreError> {
        self.commit_favorites(user, "appendMissingElements", product_id)
            .await
    }

    async fn remove_favorite(
        &self,
        user: &AuthUser,
        product_id: &str,
    ) -> Result<UserProfile, ProfileStoreError> {
        self.commit_favorites(user, "removeAllFromArray", product_id)
            .await
    }
}

#[automock]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Point read of the user's profile; `None` when it does not exist yet.
    async fn get_profile(&self, user: &AuthUser) -> Result<Option<UserProfile>, ProfileStoreError>;

    /// Creates the user's profile document.
    async fn create_profile(
        &self,
        user: &AuthUser,
        profile: NewProfile,
    ) -> Result<UserProfile, ProfileStoreError>;

    /// Partially updates the user's profile and returns the stored document.
    async fn update_profile(
        &self,
        user: &AuthUser,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError>;

    /// Adds a favorite if missing and returns the stored document.
    async fn add_favorite(
        &self,
        user: &AuthUser,
        product_id: &str,
    ) -> Result<UserProfile, ProfileStoreError>;

    /// Removes a favorite if present and returns the stored document.
    async fn remove_favorite(
        &self,
        user: &AuthUser,
        product_id: &str,
    ) -> Result<UserProfile, ProfileStoreError>;
}
