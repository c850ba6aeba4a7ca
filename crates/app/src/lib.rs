//! Storefront client: product catalog, favorites, language and account
//! session state.

pub mod auth;
pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod storage;

#[cfg(test)]
mod test;
