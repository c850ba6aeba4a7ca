//! Catalog state.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::domain::{
    catalog::{
        categories::category_labels,
        filters::{ProductFilters, ProductFiltersUpdate, QueryMode, filter_by_price, sort_products},
    },
    products::{
        ProductSource, ProductSourceError,
        records::{Product, ProductId, ProductPage},
    },
};

/// Products requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Everything the catalog currently displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    /// Displayed products, in display order.
    pub products: Vec<Product>,

    pub categories: Vec<String>,
    pub current_product: Option<Product>,
    pub filters: ProductFilters,

    /// Total reported by the source for the current query mode.
    pub total: u64,

    /// Offset of the next page.
    pub skip: u64,

    pub limit: u64,

    /// `skip < total`, recomputed after every successful list fetch.
    pub has_more: bool,

    pub loading: bool,
    pub loading_more: bool,
    pub loading_product: bool,
    pub loading_categories: bool,

    /// Last list failure.
    pub error: Option<String>,

    /// Last detail-view failure.
    pub product_error: Option<String>,
}

impl CatalogSnapshot {
    fn new(limit: u64) -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            current_product: None,
            filters: ProductFilters::default(),
            total: 0,
            skip: 0,
            limit,
            has_more: false,
            loading: false,
            loading_more: false,
            loading_product: false,
            loading_categories: false,
            error: None,
            product_error: None,
        }
    }
}

/// A list fetch that has been issued but not yet applied.
struct ListRequest {
    sequence: u64,
    reset: bool,
    filters: ProductFilters,
    skip: u64,
    limit: u64,
}

/// Source of truth for the displayed product list.
///
/// Responses are fenced by request sequence: only the latest list request
/// and the latest detail request are ever applied.
pub struct CatalogState {
    source: Arc<dyn ProductSource>,
    state: Mutex<CatalogSnapshot>,
    list_sequence: AtomicU64,
    product_sequence: AtomicU64,
}

impl CatalogState {
    #[must_use]
    pub fn new(source: Arc<dyn ProductSource>, page_size: u64) -> Self {
        Self {
            source,
            state: Mutex::new(CatalogSnapshot::new(page_size.max(1))),
            list_sequence: AtomicU64::new(0),
            product_sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.lock().clone()
    }

    #[must_use]
    pub fn filters(&self) -> ProductFilters {
        self.state.lock().filters.clone()
    }

    /// Fetch products for the current filters.
    ///
    /// With `reset` the list is replaced from offset zero; otherwise the next
    /// page is appended. Failures are recorded in `error` and leave the
    /// displayed products in place.
    pub async fn fetch_products(&self, reset: bool) {
        let request = {
            let mut state = self.state.lock();
            self.begin_list_fetch(&mut state, reset)
        };

        self.run_list_fetch(request).await;
    }

    /// Fetch the next page when one exists and nothing is loading.
    ///
    /// Returns whether a fetch was issued.
    pub async fn load_more(&self) -> bool {
        let request = {
            let mut state = self.state.lock();

            if !state.has_more || state.loading || state.loading_more {
                return false;
            }

            self.begin_list_fetch(&mut state, false)
        };

        self.run_list_fetch(request).await;

        true
    }

    /// Search by free text, clearing any category filter.
    pub async fn search_products(&self, query: &str) {
        self.state.lock().filters.merge(ProductFiltersUpdate {
            search: Some(query.to_string()),
            category: Some(String::new()),
            ..ProductFiltersUpdate::default()
        });

        self.fetch_products(true).await;
    }

    /// Browse one category, clearing any search text.
    pub async fn fetch_products_by_category(&self, category: &str) {
        self.state.lock().filters.merge(ProductFiltersUpdate {
            search: Some(String::new()),
            category: Some(category.to_string()),
            ..ProductFiltersUpdate::default()
        });

        self.fetch_products(true).await;
    }

    /// Merge a partial filter update and refetch from the first page.
    pub async fn set_filters(&self, update: ProductFiltersUpdate) {
        self.state.lock().filters.merge(update);

        self.fetch_products(true).await;
    }

    /// Restore the default filters and refetch from the first page.
    pub async fn reset_filters(&self) {
        self.state.lock().filters = ProductFilters::default();

        self.fetch_products(true).await;
    }

    /// Fetch a single product for the detail view.
    ///
    /// Failures are recorded in `product_error`; the list is never touched.
    pub async fn fetch_product(&self, id: ProductId) {
        let sequence = self.product_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.lock();
            state.loading_product = true;
            state.product_error = None;
        }

        debug!(id, sequence, "fetching product");

        let result = self.source.get_product(id).await;

        let mut state = self.state.lock();

        if sequence != self.product_sequence.load(Ordering::SeqCst) {
            debug!(id, sequence, "discarding stale product response");
            return;
        }

        state.loading_product = false;

        match result {
            Ok(product) => state.current_product = Some(product),
            Err(error) => {
                warn!(%error, id, "failed to fetch product");
                state.product_error = Some(error.to_string());
            }
        }
    }

    /// Fetch category labels.
    ///
    /// Never fails: a failed listing resolves to no categories.
    pub async fn fetch_categories(&self) -> Vec<String> {
        self.state.lock().loading_categories = true;

        let categories = match self.source.list_categories().await {
            Ok(entries) => category_labels(entries),
            Err(error) => {
                warn!(%error, "failed to fetch categories");
                Vec::new()
            }
        };

        let mut state = self.state.lock();
        state.loading_categories = false;
        state.categories.clone_from(&categories);

        categories
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    pub fn clear_product_error(&self) {
        self.state.lock().product_error = None;
    }

    /// Set (or clear) the detail-view product directly, superseding any
    /// detail fetch in flight.
    pub fn set_current_product(&self, product: Option<Product>) {
        self.product_sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        state.current_product = product;
        state.loading_product = false;
    }

    fn begin_list_fetch(&self, state: &mut CatalogSnapshot, reset: bool) -> ListRequest {
        let sequence = self.list_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        if reset {
            state.loading = true;
        } else {
            state.loading_more = true;
        }

        state.error = None;

        ListRequest {
            sequence,
            reset,
            filters: state.filters.clone(),
            skip: if reset { 0 } else { state.skip },
            limit: state.limit,
        }
    }

    async fn run_list_fetch(&self, request: ListRequest) {
        debug!(
            sequence = request.sequence,
            reset = request.reset,
            skip = request.skip,
            mode = ?request.filters.mode(),
            "fetching products"
        );

        let result = self.query(&request).await;

        let mut state = self.state.lock();

        if request.sequence != self.list_sequence.load(Ordering::SeqCst) {
            debug!(sequence = request.sequence, "discarding stale product list response");
            return;
        }

        state.loading = false;
        state.loading_more = false;

        match result {
            Ok(page) => apply_page(&mut state, &request, page),
            Err(error) => {
                warn!(%error, "failed to fetch products");
                state.error = Some(error.to_string());
            }
        }
    }

    async fn query(&self, request: &ListRequest) -> Result<ProductPage, ProductSourceError> {
        match request.filters.mode() {
            QueryMode::Search(query) => {
                self.source
                    .search_products(query, request.limit, request.skip)
                    .await
            }
            QueryMode::Category(category) => {
                self.source
                    .products_by_category(category, request.limit, request.skip)
                    .await
            }
            QueryMode::All => self.source.list_products(request.limit, request.skip).await,
        }
    }
}

fn apply_page(state: &mut CatalogSnapshot, request: &ListRequest, page: ProductPage) {
    let fetched = u64::try_from(page.products.len()).unwrap_or(u64::MAX);
    let batch = filter_by_price(page.products, &request.filters);

    if request.reset {
        state.products = batch;
    } else {
        let mut seen: FxHashSet<ProductId> =
            state.products.iter().map(|product| product.id).collect();

        state
            .products
            .extend(batch.into_iter().filter(|product| seen.insert(product.id)));
    }

    // Ordering spans every loaded page, not just the latest one.
    sort_products(&mut state.products, request.filters.sort_by);

    state.total = page.total;
    state.skip = request.skip.saturating_add(fetched);
    state.has_more = state.skip < state.total;
}
