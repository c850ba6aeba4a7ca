//! Catalog

pub mod categories;
pub mod filters;
pub mod search;
mod state;

pub use filters::{ProductFilters, ProductFiltersUpdate, SortBy};
pub use search::SearchDebouncer;
pub use state::*;
