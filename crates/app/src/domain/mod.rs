//! Storefront Domain Concerns

pub mod catalog;
pub mod favorites;
pub mod language;
pub mod products;
pub mod profiles;
