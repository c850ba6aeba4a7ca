//! Profiles

mod document;
pub mod errors;
pub mod records;
pub mod store;

pub use errors::ProfileStoreError;
pub use store::*;
