//! Host-platform catalog access
//!
//! [`CatalogApi`] is the single outbound collaborator: a paginated product
//! query. [`HttpCatalogClient`] implements it against the platform's admin
//! GraphQL endpoint; tests substitute an in-memory implementation.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::store::product::{self, CatalogProduct, UpsertOutcome};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One product as delivered by the catalog.
#[derive(Debug, Clone)]
pub struct CatalogNode {
    pub external_id: String,
    pub title: String,
    pub handle: String,
    pub image_url: Option<String>,
}

/// One page of catalog products.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub nodes: Vec<CatalogNode>,
    pub last_cursor: Option<String>,
    pub has_next_page: bool,
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one page (at most 50 products) of the shop's products,
    /// resuming from `cursor` when given.
    async fn fetch_page(&self, shop: &str, cursor: Option<&str>)
    -> Result<CatalogPage, BoxError>;
}

/// Counters for one catalog sync run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncReport {
    pub synced: u64,
    pub updated: u64,
    pub total: u64,
}

/// Fetch the shop's full catalog page by page, then upsert every product.
/// Upserts already applied are kept if a later page fails.
pub async fn sync_products(
    pool: &SqlitePool,
    catalog: &dyn CatalogApi,
    shop: &str,
) -> Result<SyncReport, BoxError> {
    let mut nodes = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = catalog.fetch_page(shop, cursor.as_deref()).await?;
        nodes.extend(page.nodes);
        if !page.has_next_page {
            break;
        }
        let Some(next) = page.last_cursor else {
            break;
        };
        cursor = Some(next);
    }

    let mut report = SyncReport {
        total: nodes.len() as u64,
        ..SyncReport::default()
    };

    for node in &nodes {
        let outcome = product::upsert_from_catalog(
            pool,
            shop,
            &CatalogProduct {
                external_id: &node.external_id,
                title: &node.title,
                handle: &node.handle,
                image_url: node.image_url.as_deref(),
            },
        )
        .await?;

        match outcome {
            UpsertOutcome::Created => report.synced += 1,
            UpsertOutcome::Updated => report.updated += 1,
        }
    }

    Ok(report)
}

const PRODUCTS_QUERY: &str = r#"
query getProducts($cursor: String) {
  products(first: 50, after: $cursor) {
    edges {
      cursor
      node {
        id
        title
        handle
        status
        featuredImage {
          url
        }
      }
    }
    pageInfo {
      hasNextPage
    }
  }
}
"#;

/// Catalog client speaking the platform's admin GraphQL API.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    api_version: String,
    access_token: String,
}

impl HttpCatalogClient {
    pub fn new(api_version: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_version: api_version.to_string(),
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn fetch_page(
        &self,
        shop: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, BoxError> {
        let url = format!(
            "https://{shop}/admin/api/{}/graphql.json",
            self.api_version
        );

        let response: serde_json::Value = self
            .client
            .post(&url)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&serde_json::json!({
                "query": PRODUCTS_QUERY,
                "variables": { "cursor": cursor },
            }))
            .send()
            .await?
            .json()
            .await?;

        let products = response
            .get("data")
            .and_then(|d| d.get("products"))
            .ok_or("Failed to fetch products from Shopify")?;

        let empty = Vec::new();
        let edges = products
            .get("edges")
            .and_then(|e| e.as_array())
            .unwrap_or(&empty);

        let mut page = CatalogPage {
            has_next_page: products
                .pointer("/pageInfo/hasNextPage")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            last_cursor: edges
                .last()
                .and_then(|e| e.get("cursor"))
                .and_then(|c| c.as_str())
                .map(String::from),
            ..CatalogPage::default()
        };

        for edge in edges {
            let Some(node) = edge.get("node") else {
                continue;
            };
            page.nodes.push(CatalogNode {
                external_id: node
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                title: node
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                handle: node
                    .get("handle")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                image_url: node
                    .pointer("/featuredImage/url")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            });
        }

        Ok(page)
    }
}
