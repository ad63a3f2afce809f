//! Catalog sync, first-run setup and the per-product review listing.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::ShopIdentity;
use crate::catalog::{self, SyncReport};
use crate::db::models::{ReviewStatus, ReviewWithProduct};
use crate::db::store;
use crate::db::store::review::ReviewFilter;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::reviews::{Pagination, parse_status_filter};

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub synced: u64,
    pub updated: u64,
    pub total: u64,
}

/// POST /api/products/sync - pull the shop's catalog and mirror it locally
pub async fn sync(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
) -> AppResult<Json<SyncResponse>> {
    let report = catalog::sync_products(&state.pool, state.catalog.as_ref(), &identity.shop)
        .await
        .map_err(|e| AppError::upstream("Failed to sync products", e))?;

    Ok(Json(SyncResponse {
        success: true,
        message: format!(
            "Successfully synced {} new products and updated {} existing products",
            report.synced, report.updated
        ),
        synced: report.synced,
        updated: report.updated,
        total: report.total,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub success: bool,
    pub message: String,
    pub settings: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

/// POST /api/setup - idempotent onboarding: default settings plus an
/// initial catalog sync. A sync failure does not fail setup; it is
/// reported in the response instead.
pub async fn setup(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
) -> AppResult<Json<SetupResponse>> {
    let created = store::settings::ensure_defaults(&state.pool, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Setup failed", e))?;
    let settings = if created { "created" } else { "already exists" };

    match catalog::sync_products(&state.pool, state.catalog.as_ref(), &identity.shop).await {
        Ok(report) => Ok(Json(SetupResponse {
            success: true,
            message: format!(
                "Setup complete! Synced {} new products and updated {} existing products.",
                report.synced, report.updated
            ),
            settings,
            products: Some(report),
            sync_error: None,
        })),
        Err(e) => {
            tracing::warn!(shop = %identity.shop, error = %e, "product sync failed during setup");
            Ok(Json(SetupResponse {
                success: true,
                message: "Setup complete, but product sync failed".to_string(),
                settings,
                products: None,
                sync_error: Some(e.to_string()),
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductReviewsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductReviewsResponse {
    pub reviews: Vec<ReviewWithProduct>,
    pub pagination: Pagination,
}

/// GET /api/products/{id}/reviews - reviews of one product, published by
/// default. A product outside the shop yields an empty page, not a 404.
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Path(product_id): Path<String>,
    Query(query): Query<ProductReviewsQuery>,
) -> AppResult<Json<ProductReviewsResponse>> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        None => Some(ReviewStatus::Published),
        token => parse_status_filter(token)?,
    };

    let filter = ReviewFilter {
        status,
        product_id: Some(product_id),
        rating: None,
        search: None,
        limit: query.limit.unwrap_or(50).max(0),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let (reviews, total) = tokio::try_join!(
        store::review::list(&state.pool, &identity.shop, &filter),
        store::review::count(&state.pool, &identity.shop, &filter),
    )
    .map_err(|e| AppError::internal("Failed to fetch reviews", e))?;

    Ok(Json(ProductReviewsResponse {
        reviews,
        pagination: Pagination {
            total,
            limit: filter.limit,
            offset: filter.offset,
            has_more: filter.offset + filter.limit < total,
        },
    }))
}
