//! Review moderation endpoints (admin API)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::ShopIdentity;
use crate::db::models::{ReviewStatus, ReviewWithProduct};
use crate::db::store;
use crate::db::store::review::{RatingFilter, ReviewFilter, ReviewPatch, StatusCounts};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub product_id: Option<String>,
    pub rating: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewWithProduct>,
    pub counts: StatusCounts,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: ReviewWithProduct,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Parse the optional status token. "all" and absence both mean
/// unfiltered.
pub(crate) fn parse_status_filter(status: Option<&str>) -> AppResult<Option<ReviewStatus>> {
    match status {
        None | Some("all") => Ok(None),
        Some(s) => ReviewStatus::parse(s)
            .map(Some)
            .ok_or_else(|| {
                AppError::validation("Status must be 'pending', 'published', or 'rejected'")
            }),
    }
}

fn build_filter(query: ListQuery) -> AppResult<ReviewFilter> {
    let status = parse_status_filter(query.status.as_deref().filter(|s| !s.is_empty()))?;

    let rating = match query.rating.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some("low") => Some(RatingFilter::AtMost(2)),
        Some(s) => {
            let rating = s
                .parse()
                .map_err(|_| AppError::validation("Invalid rating filter"))?;
            Some(RatingFilter::Exact(rating))
        }
    };

    Ok(ReviewFilter {
        status,
        product_id: query.product_id.filter(|s| !s.is_empty()),
        rating,
        search: query.search.filter(|s| !s.is_empty()),
        limit: query.limit.unwrap_or(50).max(0),
        offset: query.offset.unwrap_or(0).max(0),
    })
}

/// GET /api/reviews - filtered moderation listing with status counts
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ReviewListResponse>> {
    let filter = build_filter(query)?;

    let (reviews, total, counts) = tokio::try_join!(
        store::review::list(&state.pool, &identity.shop, &filter),
        store::review::count(&state.pool, &identity.shop, &filter),
        store::review::status_counts(&state.pool, &identity.shop),
    )
    .map_err(|e| AppError::internal("Failed to fetch reviews", e))?;

    Ok(Json(ReviewListResponse {
        reviews,
        counts,
        pagination: Pagination {
            total,
            limit: filter.limit,
            offset: filter.offset,
            has_more: filter.offset + filter.limit < total,
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_verified: Option<bool>,
}

/// POST /api/reviews - create a review on behalf of the shop
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Json(req): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    let missing_any = req.product_id.as_deref().is_none_or(str::is_empty)
        || req.customer_name.as_deref().is_none_or(str::is_empty)
        || req.rating.is_none()
        || req.title.as_deref().is_none_or(str::is_empty)
        || req.content.as_deref().is_none_or(str::is_empty);
    if missing_any {
        return Err(AppError::validation(
            "Missing required fields: productId, customerName, rating, title, content",
        ));
    }

    let product_id = req.product_id.unwrap_or_default();
    let customer_name = req.customer_name.unwrap_or_default();
    let rating = req.rating.unwrap_or_default();
    let title = req.title.unwrap_or_default();
    let content = req.content.unwrap_or_default();

    if !(1..=5).contains(&rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }

    let product = store::product::find_owned(&state.pool, &product_id, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Failed to create review", e))?
        .ok_or_else(|| {
            AppError::not_found("Product not found or does not belong to this shop")
        })?;

    let settings = store::settings::find(&state.pool, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Failed to create review", e))?;
    let status = settings
        .map(|s| s.initial_status(rating))
        .unwrap_or(ReviewStatus::Pending);

    let review = store::review::insert(
        &state.pool,
        &store::review::NewReview {
            product_id: &product.id,
            shop_id: &identity.shop,
            customer_name: &customer_name,
            customer_email: req.customer_email.as_deref().filter(|s| !s.is_empty()),
            rating,
            title: &title,
            content: &content,
            status,
            is_verified: req.is_verified.unwrap_or(false),
            image_url: req.image_url.as_deref().filter(|s| !s.is_empty()),
            helpful: 0,
            not_helpful: 0,
        },
    )
    .await
    .map_err(|e| AppError::internal("Failed to create review", e))?;

    if status == ReviewStatus::Published {
        store::review::recompute_stats(&state.pool, &product.id)
            .await
            .map_err(|e| AppError::internal("Failed to create review", e))?;
    }

    let message = if status == ReviewStatus::Published {
        "Review created and published successfully"
    } else {
        "Review created and pending moderation"
    };

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            success: true,
            review: ReviewWithProduct {
                review,
                product: product.summary(),
            },
            message: message.to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub is_verified: Option<bool>,
    pub image_url: Option<String>,
}

/// PATCH|PUT /api/reviews/{id} - partial update; absent fields keep their
/// current value
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Path(review_id): Path<String>,
    Json(req): Json<UpdateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    let existing = store::review::find_owned(&state.pool, &review_id, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Failed to update review", e))?
        .ok_or_else(|| {
            AppError::not_found("Review not found or does not belong to this shop")
        })?;

    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
    }

    let status = match req.status.as_deref() {
        None => None,
        Some(s) => Some(ReviewStatus::parse(s).ok_or_else(|| {
            AppError::validation("Status must be 'pending', 'published', or 'rejected'")
        })?),
    };

    // Published-set membership can shift on either of these
    let stats_affected = req.rating.is_some() || status.is_some();

    let patch = ReviewPatch {
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        rating: req.rating,
        title: req.title,
        content: req.content,
        status,
        is_verified: req.is_verified,
        image_url: req.image_url,
    };

    store::review::update(&state.pool, &review_id, &patch)
        .await
        .map_err(|e| AppError::internal("Failed to update review", e))?;

    if stats_affected {
        store::review::recompute_stats(&state.pool, &existing.product_id)
            .await
            .map_err(|e| AppError::internal("Failed to update review", e))?;
    }

    let review = store::review::find_with_product(&state.pool, &review_id)
        .await
        .map_err(|e| AppError::internal("Failed to update review", e))?
        .ok_or_else(|| {
            AppError::not_found("Review not found or does not belong to this shop")
        })?;

    Ok(Json(ReviewResponse {
        success: true,
        review,
        message: "Review updated successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub action: Option<String>,
}

/// POST|PATCH /api/reviews/{id}/publish - moderation status flip
pub async fn publish(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Path(review_id): Path<String>,
    Json(req): Json<PublishRequest>,
) -> AppResult<Json<ReviewResponse>> {
    let existing = store::review::find_owned(&state.pool, &review_id, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Failed to update review status", e))?
        .ok_or_else(|| {
            AppError::not_found("Review not found or does not belong to this shop")
        })?;

    let (new_status, label) = match req.action.as_deref() {
        Some("publish") => (ReviewStatus::Published, "published"),
        Some("unpublish") => (ReviewStatus::Pending, "unpublished"),
        _ => {
            return Err(AppError::validation(
                "Invalid action. Must be 'publish' or 'unpublish'",
            ));
        }
    };

    store::review::set_status(&state.pool, &review_id, new_status)
        .await
        .map_err(|e| AppError::internal("Failed to update review status", e))?;

    store::review::recompute_stats(&state.pool, &existing.product_id)
        .await
        .map_err(|e| AppError::internal("Failed to update review status", e))?;

    let review = store::review::find_with_product(&state.pool, &review_id)
        .await
        .map_err(|e| AppError::internal("Failed to update review status", e))?
        .ok_or_else(|| {
            AppError::not_found("Review not found or does not belong to this shop")
        })?;

    Ok(Json(ReviewResponse {
        success: true,
        review,
        message: format!("Review {label} successfully"),
    }))
}

/// DELETE /api/reviews/{id}
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Path(review_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let existing = store::review::find_owned(&state.pool, &review_id, &identity.shop)
        .await
        .map_err(|e| AppError::internal("Failed to delete review", e))?
        .ok_or_else(|| {
            AppError::not_found("Review not found or does not belong to this shop")
        })?;

    store::review::delete(&state.pool, &review_id)
        .await
        .map_err(|e| AppError::internal("Failed to delete review", e))?;

    store::review::recompute_stats(&state.pool, &existing.product_id)
        .await
        .map_err(|e| AppError::internal("Failed to delete review", e))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Review deleted successfully".to_string(),
    }))
}

#[derive(Debug, Clone, Copy)]
enum BulkAction {
    Publish,
    Unpublish,
    Reject,
    Delete,
}

impl BulkAction {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "publish" => Some(Self::Publish),
            "unpublish" => Some(Self::Unpublish),
            "reject" => Some(Self::Reject),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub review_ids: Option<Vec<String>>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub affected: u64,
    pub message: String,
}

/// POST /api/reviews/bulk - all-or-nothing batch transition
pub async fn bulk(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Json(req): Json<BulkRequest>,
) -> AppResult<Json<BulkResponse>> {
    let ids = match req.review_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            return Err(AppError::validation(
                "reviewIds array is required and must not be empty",
            ));
        }
    };

    let token = req.action.unwrap_or_default();
    let action = BulkAction::parse(&token).ok_or_else(|| {
        AppError::validation(
            "Invalid action. Must be 'publish', 'unpublish', 'delete', or 'reject'",
        )
    })?;

    // Membership check before any mutation: every id must resolve within
    // this shop or the whole batch is refused.
    let refs = store::review::find_owned_refs(&state.pool, &identity.shop, &ids)
        .await
        .map_err(|e| AppError::internal("Failed to perform bulk operation", e))?;

    if refs.len() != ids.len() {
        return Err(AppError::not_found(
            "Some reviews not found or do not belong to this shop",
        ));
    }

    let mut product_ids: Vec<String> = refs.into_iter().map(|(_, pid)| pid).collect();
    product_ids.sort();
    product_ids.dedup();

    let affected = match action {
        BulkAction::Publish => {
            store::review::bulk_set_status(&state.pool, &ids, ReviewStatus::Published).await
        }
        BulkAction::Unpublish => {
            store::review::bulk_set_status(&state.pool, &ids, ReviewStatus::Pending).await
        }
        BulkAction::Reject => {
            store::review::bulk_set_status(&state.pool, &ids, ReviewStatus::Rejected).await
        }
        BulkAction::Delete => store::review::bulk_delete(&state.pool, &ids).await,
    }
    .map_err(|e| AppError::internal("Failed to perform bulk operation", e))?;

    // Reject recomputes too: a rejected review may have been published
    // until this call.
    for product_id in &product_ids {
        store::review::recompute_stats(&state.pool, product_id)
            .await
            .map_err(|e| AppError::internal("Failed to perform bulk operation", e))?;
    }

    Ok(Json(BulkResponse {
        success: true,
        affected,
        message: format!("Successfully {token}ed {affected} review(s)"),
    }))
}
