//! Shared fixtures: tempdir-backed pools, a scripted in-memory catalog and
//! seed helpers.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{Request, header};
use sqlx::SqlitePool;
use tempfile::TempDir;

use review_cloud::auth::ShopIdentity;
use review_cloud::catalog::{BoxError, CatalogApi, CatalogNode, CatalogPage};
use review_cloud::db;
use review_cloud::db::models::{Product, Review, ReviewStatus};
use review_cloud::db::store;
use review_cloud::db::store::product::CatalogProduct;
use review_cloud::db::store::review::NewReview;
use review_cloud::state::AppState;

pub const SHOP: &str = "test-shop.myshopify.com";
pub const OTHER_SHOP: &str = "other-shop.myshopify.com";

/// Fresh migrated pool over a tempdir-backed database file. Keep the
/// returned TempDir alive for the duration of the test.
pub async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("reviews.db");
    let pool = db::connect(path.to_str().expect("utf-8 path"))
        .await
        .expect("connect");
    (dir, pool)
}

pub fn identity() -> ShopIdentity {
    ShopIdentity {
        shop: SHOP.to_string(),
    }
}

pub fn test_state(pool: &SqlitePool) -> AppState {
    state_with_catalog(pool, Arc::new(StubCatalog::default()))
}

pub fn state_with_catalog(pool: &SqlitePool, catalog: Arc<dyn CatalogApi>) -> AppState {
    AppState::with_catalog(
        pool.clone(),
        catalog,
        "test-jwt-secret",
        "test-webhook-secret",
    )
}

/// Scripted catalog: serves `pages` in order, using the page index as the
/// cursor.
#[derive(Default)]
pub struct StubCatalog {
    pub pages: Vec<CatalogPage>,
}

impl StubCatalog {
    /// Split `nodes` into pages of `per_page`, wiring up cursors.
    pub fn paged(nodes: Vec<CatalogNode>, per_page: usize) -> Self {
        let total = nodes.len();
        let mut pages: Vec<CatalogPage> = Vec::new();
        for (index, chunk) in nodes.chunks(per_page.max(1)).enumerate() {
            let consumed = (index + 1) * per_page.max(1);
            pages.push(CatalogPage {
                nodes: chunk.to_vec(),
                last_cursor: Some((index + 1).to_string()),
                has_next_page: consumed < total,
            });
        }
        if pages.is_empty() {
            pages.push(CatalogPage::default());
        }
        Self { pages }
    }
}

#[async_trait]
impl CatalogApi for StubCatalog {
    async fn fetch_page(
        &self,
        _shop: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, BoxError> {
        let index: usize = match cursor {
            None => 0,
            Some(c) => c.parse()?,
        };
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| format!("no page at cursor {index}").into())
    }
}

/// Catalog that always fails, for sync error paths.
pub struct FailingCatalog;

#[async_trait]
impl CatalogApi for FailingCatalog {
    async fn fetch_page(
        &self,
        _shop: &str,
        _cursor: Option<&str>,
    ) -> Result<CatalogPage, BoxError> {
        Err("catalog unavailable".into())
    }
}

pub fn node(external_id: &str, title: &str, handle: &str) -> CatalogNode {
    CatalogNode {
        external_id: external_id.to_string(),
        title: title.to_string(),
        handle: handle.to_string(),
        image_url: None,
    }
}

pub async fn seed_product(pool: &SqlitePool, shop: &str, handle: &str) -> Product {
    let external_id = format!("gid://shopify/Product/{handle}");
    store::product::upsert_from_catalog(
        pool,
        shop,
        &CatalogProduct {
            external_id: &external_id,
            title: &format!("The {handle}"),
            handle,
            image_url: None,
        },
    )
    .await
    .expect("seed product");

    store::product::find_by_handle(pool, shop, handle)
        .await
        .expect("query product")
        .expect("product row")
}

pub async fn seed_review(
    pool: &SqlitePool,
    product: &Product,
    rating: i64,
    status: ReviewStatus,
) -> Review {
    store::review::insert(
        pool,
        &NewReview {
            product_id: &product.id,
            shop_id: &product.shop_id,
            customer_name: "Test Customer",
            customer_email: None,
            rating,
            title: "A review",
            content: "Review body text",
            status,
            is_verified: false,
            image_url: None,
            helpful: 0,
            not_helpful: 0,
        },
    )
    .await
    .expect("seed review")
}

/// The product row as currently stored.
pub async fn product_row(pool: &SqlitePool, product_id: &str) -> Product {
    store::product::find_by_id(pool, product_id)
        .await
        .expect("query product")
        .expect("product row")
}

pub const BOUNDARY: &str = "reviewtestboundary";

pub fn text_part(name: &str, value: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

pub fn file_part(name: &str, filename: &str, content_type: &str, data: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
         filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n"
    )
}

/// Assemble form parts into a ready [`Multipart`] extractor.
pub async fn multipart_from(parts: Vec<String>) -> Multipart {
    let mut body = parts.concat();
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    let request = Request::builder()
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request");
    Multipart::from_request(request, &()).await.expect("multipart")
}
