//! Application state for review-cloud

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::catalog::{CatalogApi, HttpCatalogClient};
use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Host platform catalog client
    pub catalog: Arc<dyn CatalogApi>,
    /// JWT secret for shop authentication
    pub jwt_secret: String,
    /// Webhook signing secret
    pub webhook_secret: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = crate::db::connect(&config.database_path).await?;

        let catalog = HttpCatalogClient::new(
            &config.catalog_api_version,
            &config.catalog_access_token,
        );

        Ok(Self {
            pool,
            catalog: Arc::new(catalog),
            jwt_secret: config.jwt_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    /// State over an existing pool and catalog implementation (tests use
    /// an in-memory catalog).
    pub fn with_catalog(
        pool: SqlitePool,
        catalog: Arc<dyn CatalogApi>,
        jwt_secret: &str,
        webhook_secret: &str,
    ) -> Self {
        Self {
            pool,
            catalog,
            jwt_secret: jwt_secret.to_string(),
            webhook_secret: webhook_secret.to_string(),
        }
    }
}
