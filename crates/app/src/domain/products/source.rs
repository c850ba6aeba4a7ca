//! Remote product source.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::products::{
    errors::ProductSourceError,
    records::{CategoryEntry, Product, ProductId, ProductPage},
};

/// Configuration for the catalog HTTP API.
#[derive(Debug, Clone)]
pub struct DummyJsonConfig {
    /// Base address, e.g. `"https://dummyjson.com"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// `reqwest` client for the dummyjson product API.
#[derive(Debug, Clone)]
pub struct DummyJsonSource {
    base_url: Url,
    http: Client,
}

impl DummyJsonSource {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is unusable or the HTTP client
    /// cannot be built.
    pub fn new(config: DummyJsonConfig) -> Result<Self, ProductSourceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|error| ProductSourceError::InvalidBaseUrl(error.to_string()))?;

        if base_url.cannot_be_a_base() {
            return Err(ProductSourceError::InvalidBaseUrl(config.base_url));
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { base_url, http })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProductSourceError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| ProductSourceError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ProductSourceError> {
        debug!(%url, ?query, "requesting product catalog");

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ProductSourceError::NotFound);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();

            return Err(ProductSourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ProductSource for DummyJsonSource {
    async fn list_products(&self, limit: u64, skip: u64) -> Result<ProductPage, ProductSourceError> {
        let url = self.endpoint(&["products"])?;

        self.get_json(
            url,
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )
        .await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ProductSourceError> {
        let url = self.endpoint(&["products", id.to_string().as_str()])?;

        self.get_json(url, &[]).await
    }

    async fn search_products(
        &self,
        query: &str,
        limit: u64,
        skip: u64,
    ) -> Result<ProductPage, ProductSourceError> {
        let url = self.endpoint(&["products", "search"])?;

        self.get_json(
            url,
            &[
                ("q", query.to_string()),
                ("limit", limit.to_string()),
                ("skip", skip.to_string()),
            ],
        )
        .await
    }

    async fn products_by_category(
        &self,
        category: &str,
        limit: u64,
        skip: u64,
    ) -> Result<ProductPage, ProductSourceError> {
        let url = self.endpoint(&["products", "category", category])?;

        self.get_json(
            url,
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )
        .await
    }

    async fn list_categories(&self) -> Result<Vec<CategoryEntry>, ProductSourceError> {
        let url = self.endpoint(&["products", "categories"])?;

        self.get_json(url, &[]).await
    }
}

#[automock]
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Retrieves a page of the unfiltered listing.
    async fn list_products(&self, limit: u64, skip: u64) -> Result<ProductPage, ProductSourceError>;

    /// Retrieve a single product.
    async fn get_product(&self, id: ProductId) -> Result<Product, ProductSourceError>;

    /// Free-text search over the catalog.
    async fn search_products(
        &self,
        query: &str,
        limit: u64,
        skip: u64,
    ) -> Result<ProductPage, ProductSourceError>;

    /// Retrieves a page of products in one category.
    async fn products_by_category(
        &self,
        category: &str,
        limit: u64,
        skip: u64,
    ) -> Result<ProductPage, ProductSourceError>;

    /// Retrieves the raw category listing.
    async fn list_categories(&self) -> Result<Vec<CategoryEntry>, ProductSourceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;

    fn source_for(server: &MockServer) -> Result<DummyJsonSource, ProductSourceError> {
        DummyJsonSource::new(DummyJsonConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
        })
    }

    fn product_json(id: u64, title: &str, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "description": "",
            "price": price,
            "discountPercentage": 0.0,
            "rating": 4.5,
            "stock": 3,
            "brand": "Acme",
            "category": "beauty",
            "thumbnail": "",
            "images": []
        })
    }

    #[tokio::test]
    async fn list_products_sends_pagination() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("limit", "20"))
            .and(query_param("skip", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [product_json(41, "Lipstick", 12.5)],
                "total": 194,
                "skip": 40,
                "limit": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = source_for(&server)?.list_products(20, 40).await?;

        assert_eq!(page.total, 194);
        assert_eq!(page.products.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn search_products_sends_query() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/search"))
            .and(query_param("q", "phone"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [product_json(121, "iPhone 5s", 199.99)],
                "total": 1,
                "skip": 0,
                "limit": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = source_for(&server)?
            .search_products("phone", 20, 0)
            .await?;

        assert_eq!(
            page.products.first().map(|product| product.id),
            Some(121)
        );

        Ok(())
    }

    #[tokio::test]
    async fn category_is_a_path_segment() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/category/mens-shirts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [],
                "total": 0,
                "skip": 0,
                "limit": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = source_for(&server)?
            .products_by_category("mens-shirts", 20, 0)
            .await?;

        assert!(page.products.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn get_product_missing_returns_not_found() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/9999"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Product with id '9999' not found"})),
            )
            .mount(&server)
            .await;

        let result = source_for(&server)?.get_product(9999).await;

        assert!(
            matches!(result, Err(ProductSourceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = source_for(&server)?.list_products(20, 0).await;

        assert!(
            matches!(result, Err(ProductSourceError::Status { status: 503, .. })),
            "expected Status 503, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn slow_response_times_out() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/categories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(["beauty"]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let source = DummyJsonSource::new(DummyJsonConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(50),
        })?;

        let result = source.list_categories().await;

        assert!(
            matches!(result, Err(ProductSourceError::Timeout)),
            "expected Timeout, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn categories_accept_mixed_shapes() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
                "fragrances",
                7
            ])))
            .mount(&server)
            .await;

        let entries = source_for(&server)?.list_categories().await?;

        assert_eq!(entries.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn categories_not_an_array_is_a_decode_error() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"categories": "nope"})))
            .mount(&server)
            .await;

        let result = source_for(&server)?.list_categories().await;

        assert!(
            matches!(result, Err(ProductSourceError::Decode(_))),
            "expected Decode, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let result = DummyJsonSource::new(DummyJsonConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        });

        assert!(
            matches!(result, Err(ProductSourceError::InvalidBaseUrl(_))),
            "expected InvalidBaseUrl, got {result:?}"
        );
    }
}
