//! Search-as-you-type.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::catalog::CatalogState;

/// Quiet period before a typed query is searched.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Quiet period before an emptied search box restores the default listing.
pub const CLEAR_DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounces search box input into catalog searches.
///
/// Every keystroke cancels the pending dispatch. Requests already sent to the
/// source are not aborted; the catalog discards their responses instead.
pub struct SearchDebouncer {
    catalog: Arc<CatalogState>,
    search_delay: Duration,
    clear_delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    #[must_use]
    pub fn new(catalog: Arc<CatalogState>) -> Self {
        Self::with_delays(catalog, SEARCH_DEBOUNCE, CLEAR_DEBOUNCE)
    }

    #[must_use]
    pub fn with_delays(
        catalog: Arc<CatalogState>,
        search_delay: Duration,
        clear_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            search_delay,
            clear_delay,
            pending: Mutex::new(None),
        }
    }

    /// Record the search box contents after a keystroke.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn input(&self, text: &str) {
        let query = text.trim().to_string();
        let mut pending = self.pending.lock();

        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let catalog = self.catalog.clone();

        *pending = if !query.is_empty() {
            let delay = self.search_delay;

            Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!(%query, "dispatching debounced search");
                catalog.search_products(&query).await;
            }))
        } else if !catalog.filters().search.is_empty() {
            let delay = self.clear_delay;

            Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!("search cleared, restoring default listing");
                catalog.reset_filters().await;
            }))
        } else {
            None
        };
    }

    /// Search immediately, as when the search form is submitted.
    pub async fn submit(&self, text: &str) {
        self.cancel();

        let query = text.trim();

        if !query.is_empty() {
            self.catalog.search_products(query).await;
        } else if !self.catalog.filters().search.is_empty() {
            self.catalog.reset_filters().await;
        }
    }

    /// Cancel the pending dispatch, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
