//! Product Records

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product identifier, assigned by the remote catalog.
pub type ProductId = u64;

/// Product Record
///
/// An immutable snapshot of a product as returned by the remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Discount in the range 0-100.
    #[serde(default)]
    pub discount_percentage: f64,

    /// Rating in the range 0-5.
    #[serde(default)]
    pub rating: f64,

    #[serde(default)]
    pub stock: u32,

    // Some catalog entries (groceries, mostly) carry no brand at all.
    #[serde(default)]
    pub brand: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub images: Vec<String>,
}

/// A page of products together with the source's pagination counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,

    #[serde(default)]
    pub skip: u64,

    #[serde(default)]
    pub limit: u64,
}

/// Category descriptor object, as served by newer catalog versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
}

/// One entry of the category listing.
///
/// The listing is loosely typed: older catalogs serve plain labels, newer ones
/// serve descriptor objects, and anything else is kept verbatim so it can be
/// coerced (or dropped) instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryEntry {
    Label(String),
    Descriptor(CategoryDescriptor),
    Malformed(serde_json::Value),
}
