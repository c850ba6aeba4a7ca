//! App Context

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthError, AuthSession, AuthState, IdentityProvider, IdentityToolkitClient},
    config::{AppConfig, ConfigError},
    domain::{
        catalog::CatalogState,
        favorites::FavoritesState,
        language::{Language, LanguageSettings, LanguageState},
        products::{DummyJsonSource, ProductSource, ProductSourceError},
        profiles::{FirestoreProfileStore, ProfileStore, ProfileStoreError, records::ProfileUpdate},
    },
    storage::{FileStore, KeyValueStore, StorageError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to open local state")]
    Storage(#[from] StorageError),

    #[error("failed to build the product catalog client")]
    Catalog(#[from] ProductSourceError),

    #[error("failed to build the identity client")]
    Identity(#[from] AuthError),

    #[error("failed to build the profile store client")]
    Profiles(#[from] ProfileStoreError),
}

/// Collaborators an [`AppContext`] is assembled from.
pub struct AppParts {
    pub source: Arc<dyn ProductSource>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub storage: Arc<dyn KeyValueStore>,
    pub page_size: u64,
    pub continue_url: String,
}

/// Per-session application state.
///
/// Owns every state object; `start` restores the persisted session and
/// begins language synchronisation, `shutdown` stops it.
pub struct AppContext {
    pub catalog: Arc<CatalogState>,
    pub favorites: Arc<FavoritesState>,
    pub language: Arc<LanguageState>,
    pub session: Arc<AuthSession>,
    language_sync: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when local state cannot be opened or a remote client
    /// cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppInitError> {
        let data_dir = config.storage.resolve_data_dir()?;
        let storage = FileStore::open(&data_dir)?;

        debug!(?storage, "opened local state");

        Ok(Self::from_parts(AppParts {
            source: Arc::new(DummyJsonSource::new(config.catalog.source_config())?),
            identity: Arc::new(IdentityToolkitClient::new(
                config.identity.toolkit_config(),
            )?),
            profiles: Arc::new(FirestoreProfileStore::new(
                config.identity.firestore_config(),
            )?),
            storage: Arc::new(storage),
            page_size: config.catalog.products_page_size,
            continue_url: config.identity.sign_in_continue_url.clone(),
        }))
    }

    #[must_use]
    pub fn from_parts(parts: AppParts) -> Self {
        let session = Arc::new(AuthSession::new(
            parts.identity,
            parts.profiles.clone(),
            parts.storage.clone(),
            parts.continue_url,
        ));

        Self {
            catalog: Arc::new(CatalogState::new(parts.source, parts.page_size)),
            favorites: Arc::new(FavoritesState::new(session.clone(), parts.profiles)),
            language: Arc::new(LanguageState::load(parts.storage)),
            session,
            language_sync: Mutex::new(None),
        }
    }

    /// Start language synchronisation and restore the persisted session.
    ///
    /// A session that cannot be restored is logged and discarded.
    pub async fn start(&self) {
        {
            let mut sync = self.language_sync.lock();

            if sync.is_none() {
                *sync = Some(tokio::spawn(sync_language(
                    self.session.subscribe(),
                    self.language.clone(),
                )));
            }
        }

        match self.session.restore().await {
            Ok(Some(user)) => info!(uid = %user.uid, "restored session"),
            Ok(None) => {}
            Err(error) => warn!(%error, "discarding stored session"),
        }
    }

    /// Stop background synchronisation.
    pub fn shutdown(&self) {
        if let Some(handle) = self.language_sync.lock().take() {
            handle.abort();
        }
    }

    /// Switch language and propose it to the signed-in user's profile.
    ///
    /// Profile synchronisation is best effort: failures are logged only.
    pub async fn set_language(&self, language: Language) -> LanguageSettings {
        let settings = self.language.set_language(language);

        let differs = self
            .session
            .current_profile()
            .is_some_and(|profile| profile.preferred_language != language);

        if differs {
            let update = ProfileUpdate {
                preferred_language: Some(language),
                ..ProfileUpdate::default()
            };

            if let Err(error) = self.session.update_profile(update).await {
                warn!(%error, %language, "failed to sync language preference");
            }
        }

        settings
    }

    pub async fn toggle_language(&self) -> LanguageSettings {
        self.set_language(self.language.language().toggled()).await
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply a signed-in profile's preferred language whenever auth state changes.
async fn sync_language(mut changes: watch::Receiver<AuthState>, language: Arc<LanguageState>) {
    loop {
        let preferred = changes
            .borrow_and_update()
            .profile
            .as_ref()
            .map(|profile| profile.preferred_language);

        if let Some(preferred) = preferred
            && preferred != language.language()
        {
            debug!(%preferred, "applying profile language");
            language.set_language(preferred);
        }

        if changes.changed().await.is_err() {
            break;
        }
    }
}
