//! Catalog filters and client-side ordering.

use std::{cmp::Ordering, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::products::records::Product;

/// Upper price bound of the default filter set.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Product ordering applied after every fetch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    #[value(name = "newest")]
    Newest,

    #[value(name = "oldest")]
    Oldest,

    #[value(name = "priceLowToHigh")]
    PriceLowToHigh,

    #[value(name = "priceHighToLow")]
    PriceHighToLow,

    #[serde(rename = "nameAZ")]
    #[value(name = "nameAZ")]
    NameAz,

    #[serde(rename = "nameZA")]
    #[value(name = "nameZA")]
    NameZa,

    #[value(name = "topRated")]
    TopRated,
}

impl SortBy {
    /// Compare two products under this ordering.
    #[must_use]
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Newest => b.id.cmp(&a.id),
            Self::Oldest => a.id.cmp(&b.id),
            Self::PriceLowToHigh => a.price.cmp(&b.price),
            Self::PriceHighToLow => b.price.cmp(&a.price),
            Self::NameAz => compare_titles(a, b),
            Self::NameZa => compare_titles(b, a),
            Self::TopRated => b.rating.total_cmp(&a.rating),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceLowToHigh => "priceLowToHigh",
            Self::PriceHighToLow => "priceHighToLow",
            Self::NameAz => "nameAZ",
            Self::NameZa => "nameZA",
            Self::TopRated => "topRated",
        };

        f.write_str(name)
    }
}

fn compare_titles(a: &Product, b: &Product) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

/// Catalog filters.
///
/// `search` and `category` are mutually exclusive query modes; when both are
/// set, `search` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    pub search: String,
    pub category: String,
    pub min_price: Decimal,

    /// Not required to be at least `min_price`; an inverted range matches
    /// nothing.
    pub max_price: Decimal,

    pub sort_by: SortBy,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            min_price: Decimal::ZERO,
            max_price: DEFAULT_MAX_PRICE,
            sort_by: SortBy::default(),
        }
    }
}

impl ProductFilters {
    /// Shallow-merge a partial update.
    pub fn merge(&mut self, update: ProductFiltersUpdate) {
        if let Some(search) = update.search {
            self.search = search;
        }

        if let Some(category) = update.category {
            self.category = category;
        }

        if let Some(min_price) = update.min_price {
            self.min_price = min_price;
        }

        if let Some(max_price) = update.max_price {
            self.max_price = max_price;
        }

        if let Some(sort_by) = update.sort_by {
            self.sort_by = sort_by;
        }
    }

    /// The remote query mode selected by these filters.
    #[must_use]
    pub fn mode(&self) -> QueryMode<'_> {
        if !self.search.is_empty() {
            QueryMode::Search(&self.search)
        } else if !self.category.is_empty() {
            QueryMode::Category(&self.category)
        } else {
            QueryMode::All
        }
    }

    /// Whether `product` lies within the inclusive price range.
    #[must_use]
    pub fn price_matches(&self, product: &Product) -> bool {
        self.min_price <= product.price && product.price <= self.max_price
    }
}

/// Partial filter update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFiltersUpdate {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<SortBy>,
}

/// Remote query mode, by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode<'a> {
    Search(&'a str),
    Category(&'a str),
    All,
}

/// Stable sort by the given ordering.
pub fn sort_products(products: &mut [Product], sort_by: SortBy) {
    products.sort_by(|a, b| sort_by.compare(a, b));
}

/// Keep only products priced within the filters' inclusive range.
#[must_use]
pub fn filter_by_price(products: Vec<Product>, filters: &ProductFilters) -> Vec<Product> {
    products
        .into_iter()
        .filter(|product| filters.price_matches(product))
        .collect()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::helpers::make_product;

    use super::*;

    fn prices(products: &[Product]) -> Vec<Decimal> {
        products.iter().map(|product| product.price).collect()
    }

    fn titles(products: &[Product]) -> Vec<&str> {
        products.iter().map(|product| product.title.as_str()).collect()
    }

    #[test]
    fn price_low_to_high_sorts_ascending() {
        let mut products = vec![
            make_product(1, "A", 30),
            make_product(2, "B", 10),
            make_product(3, "C", 20),
        ];

        sort_products(&mut products, SortBy::PriceLowToHigh);

        assert_eq!(
            prices(&products),
            vec![Decimal::from(10), Decimal::from(20), Decimal::from(30)]
        );
    }

    #[test]
    fn name_za_sorts_descending() {
        let mut products = vec![make_product(1, "Apple", 1), make_product(2, "Banana", 1)];

        sort_products(&mut products, SortBy::NameZa);

        assert_eq!(titles(&products), vec!["Banana", "Apple"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut products = vec![make_product(1, "banana", 1), make_product(2, "Apple", 1)];

        sort_products(&mut products, SortBy::NameAz);

        assert_eq!(titles(&products), vec!["Apple", "banana"]);
    }

    #[test]
    fn identifier_orderings() {
        let mut products = vec![
            make_product(2, "B", 1),
            make_product(3, "C", 1),
            make_product(1, "A", 1),
        ];

        sort_products(&mut products, SortBy::Newest);
        assert_eq!(titles(&products), vec!["C", "B", "A"]);

        sort_products(&mut products, SortBy::Oldest);
        assert_eq!(titles(&products), vec!["A", "B", "C"]);
    }

    #[test]
    fn top_rated_is_stable_for_ties() {
        let mut products = vec![
            make_product(1, "A", 1),
            make_product(2, "B", 1),
            make_product(3, "C", 1),
        ];
        products[0].rating = 4.0;
        products[1].rating = 4.5;
        products[2].rating = 4.0;

        sort_products(&mut products, SortBy::TopRated);

        assert_eq!(titles(&products), vec!["B", "A", "C"]);
    }

    #[test]
    fn price_filter_is_inclusive() {
        let products = [5, 10, 15, 20, 25]
            .into_iter()
            .zip(1..)
            .map(|(price, id)| make_product(id, "P", price))
            .collect();

        let filters = ProductFilters {
            min_price: Decimal::from(10),
            max_price: Decimal::from(20),
            ..ProductFilters::default()
        };

        assert_eq!(
            prices(&filter_by_price(products, &filters)),
            vec![Decimal::from(10), Decimal::from(15), Decimal::from(20)]
        );
    }

    #[test]
    fn search_takes_priority_over_category() {
        let filters = ProductFilters {
            search: "phone".into(),
            category: "laptops".into(),
            ..ProductFilters::default()
        };

        assert_eq!(filters.mode(), QueryMode::Search("phone"));
        assert_eq!(ProductFilters::default().mode(), QueryMode::All);
    }

    #[test]
    fn default_filters_span_zero_to_ten_thousand() {
        let filters = ProductFilters::default();

        assert_eq!(filters.min_price, Decimal::ZERO);
        assert_eq!(filters.max_price, Decimal::from(10_000));
        assert_eq!(filters.sort_by, SortBy::Newest);
    }

    #[test]
    fn sort_keys_use_wire_names() -> TestResult {
        assert_eq!(serde_json::to_string(&SortBy::NameAz)?, r#""nameAZ""#);
        assert_eq!(serde_json::to_string(&SortBy::PriceHighToLow)?, r#""priceHighToLow""#);
        assert_eq!(SortBy::TopRated.to_string(), "topRated");

        Ok(())
    }
}
