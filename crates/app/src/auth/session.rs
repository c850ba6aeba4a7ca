//! Auth session.

use std::{future::Future, sync::Arc};

use jiff::Timestamp;
use reqwest::Url;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthError, AuthState, AuthUser, IdentityProvider, IdpCredential},
    domain::profiles::{
        ProfileStore, ProfileStoreError,
        records::{NewProfile, ProfileUpdate, UserProfile},
    },
    storage::{
        KeyValueStore, PENDING_EMAIL_KEY, REDIRECT_KEY, SESSION_KEY, load_json, save_json,
    },
};

/// Redirect target used when none was remembered.
pub const DEFAULT_REDIRECT: &str = "/";

/// Name given to profiles whose user has neither a display name nor an email.
const FALLBACK_PROFILE_NAME: &str = "User";

/// The signed-in user and their profile replica.
///
/// Every change is published on a watch channel, which doubles as the
/// auth-state change stream.
pub struct AuthSession {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    storage: Arc<dyn KeyValueStore>,
    continue_url: String,
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        storage: Arc<dyn KeyValueStore>,
        continue_url: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            profiles,
            storage,
            continue_url: continue_url.into(),
            state: watch::Sender::new(AuthState::default()),
        }
    }

    /// Subscribe to auth-state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn current_profile(&self) -> Option<UserProfile> {
        self.state.borrow().profile.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Rehydrate the persisted session, refreshing an expired ID token.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored session cannot be refreshed; the
    /// stored session is discarded in that case.
    pub async fn restore(&self) -> Result<Option<AuthUser>, AuthError> {
        let stored = match load_json::<AuthUser>(self.storage.as_ref(), SESSION_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%error, "ignoring unreadable session");
                None
            }
        };

        let Some(user) = stored else {
            debug!("no stored session");
            return Ok(None);
        };

        self.track(async {
            let user = if user.is_expired(Timestamp::now()) {
                match self.identity.refresh_session(&user).await {
                    Ok(user) => user,
                    Err(error) => {
                        self.forget_session();
                        return Err(error);
                    }
                }
            } else {
                user
            };

            self.establish(user).await.map(Some)
        })
        .await
    }

    /// Sign in with a credential from an OAuth provider's consent flow.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity provider rejects the credential.
    pub async fn sign_in_with_idp(&self, credential: IdpCredential) -> Result<AuthUser, AuthError> {
        self.track(async {
            let user = self.identity.sign_in_with_idp(&credential).await?;

            self.establish(user).await
        })
        .await
    }

    /// Email a passwordless sign-in link and remember the address for
    /// completing it.
    ///
    /// # Errors
    ///
    /// Returns an error when the link cannot be sent or the address cannot be
    /// remembered.
    pub async fn send_sign_in_link(&self, email: &str) -> Result<(), AuthError> {
        self.track(async {
            self.identity
                .send_sign_in_link(email, &self.continue_url)
                .await?;

            self.storage.set(PENDING_EMAIL_KEY, email)?;

            info!(email, "sign-in link sent");

            Ok(())
        })
        .await
    }

    /// Whether `link` is a passwordless sign-in link.
    #[must_use]
    pub fn is_sign_in_link(link: &str) -> bool {
        oob_code(link).is_some()
    }

    /// Complete a passwordless sign-in from the emailed link.
    ///
    /// The email defaults to the address remembered by
    /// [`send_sign_in_link`](Self::send_sign_in_link), which is forgotten on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns an error when the link is malformed, invalid or expired, or
    /// when no email address is known.
    pub async fn complete_email_sign_in(
        &self,
        link: &str,
        email: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        self.track(async {
            let code = oob_code(link).ok_or(AuthError::InvalidSignInLink)?;

            let email = match email {
                Some(email) => email.to_string(),
                None => self
                    .storage
                    .get(PENDING_EMAIL_KEY)?
                    .ok_or(AuthError::MissingPendingEmail)?,
            };

            let user = self.identity.sign_in_with_email_link(&email, &code).await?;

            if let Err(error) = self.storage.remove(PENDING_EMAIL_KEY) {
                warn!(%error, "failed to forget pending sign-in email");
            }

            self.establish(user).await
        })
        .await
    }

    /// Sign out and forget the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error when the persisted session cannot be removed; the
    /// in-memory session is cleared regardless.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let removed = self.storage.remove(SESSION_KEY);

        self.state.send_replace(AuthState::default());

        info!("signed out");

        removed.map_err(AuthError::from)
    }

    /// Partially update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error when nobody is signed in or the store rejects the
    /// update.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, AuthError> {
        let user = self.active_user().await?;

        let profile = self.profiles.update_profile(&user, update).await?;

        self.publish_profile(profile.clone());

        Ok(profile)
    }

    /// The signed-in user with a usable ID token.
    ///
    /// Refreshes the token when it is about to expire. Never contacts a
    /// remote service when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` when nobody is signed in, or the refresh error.
    pub async fn active_user(&self) -> Result<AuthUser, AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;

        if !user.is_expired(Timestamp::now()) {
            return Ok(user);
        }

        let refreshed = self.identity.refresh_session(&user).await?;

        self.persist_session(&refreshed);

        self.state.send_if_modified(|state| match &mut state.user {
            Some(current) if current.uid == refreshed.uid => {
                *current = refreshed.clone();
                true
            }
            _ => false,
        });

        Ok(refreshed)
    }

    /// Replace the profile replica with a document returned by the store.
    ///
    /// Ignored when the document belongs to someone other than the
    /// signed-in user.
    pub(crate) fn publish_profile(&self, profile: UserProfile) {
        self.state.send_if_modified(|state| {
            let signed_in = state.user.as_ref().map(|user| user.uid.as_str());

            if signed_in != Some(profile.uid.as_str()) {
                debug!(uid = %profile.uid, "discarding profile for signed-out user");
                return false;
            }

            state.profile = Some(profile);

            true
        });
    }

    /// Remember where to return after signing in.
    ///
    /// # Errors
    ///
    /// Returns an error when the path cannot be persisted.
    pub fn remember_redirect(&self, path: &str) -> Result<(), AuthError> {
        Ok(self.storage.set(REDIRECT_KEY, path)?)
    }

    /// Take (and forget) the remembered post-login redirect.
    #[must_use]
    pub fn take_redirect_after_login(&self) -> String {
        let path = match self.storage.get(REDIRECT_KEY) {
            Ok(path) => path,
            Err(error) => {
                warn!(%error, "failed to read post-login redirect");
                None
            }
        };

        if let Err(error) = self.storage.remove(REDIRECT_KEY) {
            warn!(%error, "failed to forget post-login redirect");
        }

        path.filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
    }

    /// Read the user's profile, creating it on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile store fails.
    pub async fn create_or_get_profile(
        &self,
        user: &AuthUser,
    ) -> Result<UserProfile, ProfileStoreError> {
        if let Some(profile) = self.profiles.get_profile(user).await? {
            return Ok(profile);
        }

        let profile = NewProfile {
            uid: user.uid.clone(),
            email: user.email.clone().unwrap_or_default(),
            name: default_profile_name(user),
            preferred_language: None,
            theme: None,
        };

        info!(uid = %user.uid, "creating profile");

        self.profiles.create_profile(user, profile).await
    }

    async fn establish(&self, user: AuthUser) -> Result<AuthUser, AuthError> {
        self.persist_session(&user);

        let profile = self.create_or_get_profile(&user).await;

        self.state.send_modify(|state| {
            state.user = Some(user.clone());

            match profile {
                Ok(profile) => state.profile = Some(profile),
                Err(error) => {
                    warn!(%error, uid = %user.uid, "failed to load profile");
                    state.profile = None;
                    state.error = Some(error.to_string());
                }
            }
        });

        info!(uid = %user.uid, "signed in");

        Ok(user)
    }

    fn persist_session(&self, user: &AuthUser) {
        if let Err(error) = save_json(self.storage.as_ref(), SESSION_KEY, user) {
            warn!(%error, "failed to persist session");
        }
    }

    fn forget_session(&self) {
        if let Err(error) = self.storage.remove(SESSION_KEY) {
            warn!(%error, "failed to forget session");
        }
    }

    async fn track<T, F>(&self, operation: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = operation.await;

        self.state.send_modify(|state| {
            state.loading = false;

            if let Err(error) = &result {
                state.error = Some(error.to_string());
            }
        });

        result
    }
}

fn oob_code(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;

    let mut mode = None;
    let mut code = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "mode" => mode = Some(value.into_owned()),
            "oobCode" => code = Some(value.into_owned()),
            _ => {}
        }
    }

    match mode.as_deref() {
        Some("signIn") => code.filter(|code| !code.is_empty()),
        _ => None,
    }
}

fn default_profile_name(user: &AuthUser) -> String {
    if let Some(name) = user.display_name.as_deref().filter(|name| !name.is_empty()) {
        return name.to_string();
    }

    user.email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or(FALLBACK_PROFILE_NAME)
        .to_string()
}
