//! Test Helpers

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;

use crate::{
    auth::{AuthUser, SecretToken},
    domain::{
        language::Language,
        products::records::{Product, ProductId, ProductPage},
        profiles::records::{Theme, UserProfile},
    },
};

pub(crate) fn make_product(id: ProductId, title: &str, price: i64) -> Product {
    Product {
        id,
        title: title.to_string(),
        description: format!("{title} description"),
        price: Decimal::from(price),
        discount_percentage: 0.0,
        rating: 4.0,
        stock: 10,
        brand: "Souq".to_string(),
        category: "misc".to_string(),
        thumbnail: format!("https://cdn.example.com/{id}/thumbnail.png"),
        images: Vec::new(),
    }
}

pub(crate) fn make_page(products: Vec<Product>, total: u64) -> ProductPage {
    let limit = u64::try_from(products.len()).unwrap_or(u64::MAX);

    ProductPage {
        products,
        total,
        skip: 0,
        limit,
    }
}

/// A signed-in user whose ID token is valid for another hour.
pub(crate) fn make_user(uid: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
        display_name: Some("Layla".to_string()),
        id_token: SecretToken::new(format!("id-token-{uid}")),
        refresh_token: SecretToken::new(format!("refresh-token-{uid}")),
        expires_at: Timestamp::now()
            .checked_add(SignedDuration::from_hours(1))
            .unwrap_or(Timestamp::MAX),
    }
}

pub(crate) fn make_profile(uid: &str) -> UserProfile {
    UserProfile {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        name: "Layla".to_string(),
        preferred_language: Language::En,
        theme: Theme::Light,
        favorites: Vec::new(),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
