//! Favorites state.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    auth::{AuthError, AuthSession},
    domain::{
        products::records::ProductId,
        profiles::{ProfileStore, records::favorite_key},
    },
};

const SIGN_IN_TO_ADD: &str = "Please sign in to add favorites";
const SIGN_IN_TO_MANAGE: &str = "Please sign in to manage favorites";

/// Mutation status shared by every favorites operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesStatus {
    /// Mutations currently in flight; concurrent calls are not queued.
    pub in_flight: usize,
    pub error: Option<String>,
}

impl FavoritesStatus {
    #[must_use]
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Add,
    Remove,
}

/// Favorite membership for the signed-in user.
///
/// Reads come from the session's profile replica. Each mutation is a single
/// idempotent store operation whose returned document replaces the replica.
pub struct FavoritesState {
    session: Arc<AuthSession>,
    profiles: Arc<dyn ProfileStore>,
    status: Mutex<FavoritesStatus>,
}

impl FavoritesState {
    #[must_use]
    pub fn new(session: Arc<AuthSession>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            session,
            profiles,
            status: Mutex::new(FavoritesStatus::default()),
        }
    }

    #[must_use]
    pub fn status(&self) -> FavoritesStatus {
        self.status.lock().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Whether `product` is a favorite; `false` when signed out.
    #[must_use]
    pub fn is_favorite(&self, product: ProductId) -> bool {
        self.session
            .current_profile()
            .is_some_and(|profile| profile.is_favorite(product))
    }

    /// Favorite product identifiers, in stored order.
    #[must_use]
    pub fn favorites(&self) -> Vec<String> {
        self.session
            .current_profile()
            .map(|profile| profile.favorites)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn favorites_count(&self) -> usize {
        self.favorites().len()
    }

    pub fn clear_error(&self) {
        self.status.lock().error = None;
    }

    /// Add a favorite. Returns whether the product is now a favorite.
    pub async fn add_to_favorites(&self, product: ProductId) -> bool {
        self.change(product, Change::Add).await
    }

    /// Remove a favorite. Returns whether the product is no longer a favorite.
    pub async fn remove_from_favorites(&self, product: ProductId) -> bool {
        self.change(product, Change::Remove).await
    }

    /// Add or remove depending on current membership.
    pub async fn toggle_favorite(&self, product: ProductId) -> bool {
        if self.is_favorite(product) {
            self.remove_from_favorites(product).await
        } else {
            self.add_to_favorites(product).await
        }
    }

    async fn change(&self, product: ProductId, change: Change) -> bool {
        if !self.session.is_authenticated() {
            self.status.lock().error = Some(
                match change {
                    Change::Add => SIGN_IN_TO_ADD,
                    Change::Remove => SIGN_IN_TO_MANAGE,
                }
                .to_string(),
            );

            return false;
        }

        let already = self.is_favorite(product);

        if already == (change == Change::Add) {
            debug!(product, ?change, "favorite already in the desired state");
            return true;
        }

        {
            let mut status = self.status.lock();
            status.in_flight += 1;
            status.error = None;
        }

        let key = favorite_key(product);

        let result = async {
            let user = self.session.active_user().await?;

            let profile = match change {
                Change::Add => self.profiles.add_favorite(&user, &key).await?,
                Change::Remove => self.profiles.remove_favorite(&user, &key).await?,
            };

            Ok::<_, AuthError>(profile)
        }
        .await;

        let mut status = self.status.lock();
        status.in_flight = status.in_flight.saturating_sub(1);

        match result {
            Ok(profile) => {
                self.session.publish_profile(profile);
                true
            }
            Err(error) => {
                warn!(%error, product, ?change, "favorite update failed");
                status.error = Some(error.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;

    use crate::{
        auth::{IdpCredential, MockIdentityProvider, SecretToken},
        domain::profiles::{MockProfileStore, ProfileStoreError, records::UserProfile},
        storage::MemoryStore,
        test::helpers::{make_profile, make_user},
    };

    use super::*;

    fn profile_with(favorites: &[&str]) -> UserProfile {
        let mut profile = make_profile("u-1");
        profile.favorites = favorites.iter().map(ToString::to_string).collect();
        profile
    }

    /// Signed-in favorites state whose stored profile starts with `initial`.
    async fn signed_in(
        initial: &'static [&'static str],
        configure: impl FnOnce(&mut MockProfileStore),
    ) -> FavoritesState {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in_with_idp()
            .returning(|_| Ok(make_user("u-1")));

        let mut profiles = MockProfileStore::new();
        profiles
            .expect_get_profile()
            .returning(move |_| Ok(Some(profile_with(initial))));
        configure(&mut profiles);

        let profiles: Arc<dyn ProfileStore> = Arc::new(profiles);
        let session = Arc::new(AuthSession::new(
            Arc::new(identity),
            profiles.clone(),
            Arc::new(MemoryStore::new()),
            "http://localhost:3000/auth/complete",
        ));

        // The tests only care about the resulting session.
        let _user = session
            .sign_in_with_idp(IdpCredential::google(SecretToken::new("g")))
            .await;

        FavoritesState::new(session, profiles)
    }

    fn signed_out(profiles: MockProfileStore) -> FavoritesState {
        let profiles: Arc<dyn ProfileStore> = Arc::new(profiles);
        let session = Arc::new(AuthSession::new(
            Arc::new(MockIdentityProvider::new()),
            profiles.clone(),
            Arc::new(MemoryStore::new()),
            "http://localhost:3000/auth/complete",
        ));

        FavoritesState::new(session, profiles)
    }

    #[tokio::test]
    async fn signed_out_user_has_no_favorites() {
        let favorites = signed_out(MockProfileStore::new());

        assert!(!favorites.is_authenticated());
        assert!(!favorites.is_favorite(1));
        assert_eq!(favorites.favorites_count(), 0);
    }

    #[tokio::test]
    async fn signed_out_add_fails_without_remote_call() {
        let mut profiles = MockProfileStore::new();
        profiles.expect_add_favorite().never();
        profiles.expect_remove_favorite().never();

        let favorites = signed_out(profiles);

        assert!(!favorites.add_to_favorites(1).await);
        assert_eq!(favorites.status().error.as_deref(), Some(SIGN_IN_TO_ADD));

        assert!(!favorites.remove_from_favorites(1).await);
        assert_eq!(favorites.status().error.as_deref(), Some(SIGN_IN_TO_MANAGE));

        favorites.clear_error();

        assert!(favorites.status().error.is_none());
    }

    #[tokio::test]
    async fn add_then_is_favorite() {
        let favorites = signed_in(&["7"], |profiles| {
            profiles
                .expect_add_favorite()
                .withf(|_, key| key == "42")
                .times(1)
                .returning(|_, _| Ok(profile_with(&["7", "42"])));
        })
        .await;

        assert!(favorites.add_to_favorites(42).await);
        assert!(favorites.is_favorite(42));
        assert_eq!(favorites.favorites(), vec!["7", "42"]);

        // Repeating is a local no-op success.
        assert!(favorites.add_to_favorites(42).await);
        assert!(!favorites.status().loading());
    }

    #[tokio::test]
    async fn remove_then_not_favorite() {
        let favorites = signed_in(&["7", "42"], |profiles| {
            profiles
                .expect_remove_favorite()
                .withf(|_, key| key == "42")
                .times(1)
                .returning(|_, _| Ok(profile_with(&["7"])));
        })
        .await;

        assert!(favorites.remove_from_favorites(42).await);
        assert!(!favorites.is_favorite(42));
        assert!(favorites.remove_from_favorites(42).await);
        assert_eq!(favorites.favorites_count(), 1);
    }

    #[tokio::test]
    async fn toggle_flips_membership_both_ways() {
        let favorites = signed_in(&["7"], |profiles| {
            profiles
                .expect_remove_favorite()
                .withf(|_, key| key == "7")
                .times(1)
                .returning(|_, _| Ok(profile_with(&[])));
            profiles
                .expect_add_favorite()
                .withf(|_, key| key == "8")
                .times(1)
                .returning(|_, _| Ok(profile_with(&["8"])));
        })
        .await;

        assert!(favorites.toggle_favorite(7).await);
        assert!(!favorites.is_favorite(7));

        assert!(favorites.toggle_favorite(8).await);
        assert!(favorites.is_favorite(8));
    }

    #[tokio::test]
    async fn failed_mutation_keeps_replica_and_reports() {
        let favorites = signed_in(&[], |profiles| {
            profiles
                .expect_add_favorite()
                .with(always(), always())
                .returning(|_, _| Err(ProfileStoreError::Unauthorized));
        })
        .await;

        assert!(!favorites.add_to_favorites(3).await);
        assert!(!favorites.is_favorite(3));

        let status = favorites.status();

        assert!(status.error.is_some());
        assert_eq!(status.in_flight, 0);
    }
}
