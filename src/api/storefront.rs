//! Public storefront widget endpoints. No shop token here; every query is
//! scoped by product id and serves published reviews only.

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::db::models::{Review, ReviewStatus, StorefrontReview};
use crate::db::store;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontListQuery {
    pub product_id: Option<String>,
    pub rating: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StorefrontPagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct StorefrontListResponse {
    pub reviews: Vec<StorefrontReview>,
    pub pagination: StorefrontPagination,
}

/// GET /storefront/reviews - published reviews for the widget, page/limit
/// paginated
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<StorefrontListQuery>,
) -> AppResult<Json<StorefrontListResponse>> {
    let product_id = query
        .product_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("Product ID is required"))?;

    let rating = match query.rating.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(s) => Some(
            s.parse::<i64>()
                .map_err(|_| AppError::validation("Invalid rating filter"))?,
        ),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).max(1);
    let offset = (page - 1) * limit;

    let (reviews, total) = tokio::try_join!(
        store::review::list_published(&state.pool, &product_id, rating, limit, offset),
        store::review::count_published(&state.pool, &product_id, rating),
    )
    .map_err(|e| AppError::internal("Failed to fetch reviews", e))?;

    Ok(Json(StorefrontListResponse {
        reviews,
        pagination: StorefrontPagination {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub review: Review,
    pub message: String,
}

/// POST /storefront/reviews - customer submission, multipart form.
/// Submissions always land as pending regardless of shop settings.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SubmitResponse>> {
    let mut product_id = String::new();
    let mut shop_id = String::new();
    let mut rating_raw = String::new();
    let mut title = String::new();
    let mut content = String::new();
    let mut customer_name = String::new();
    let mut customer_email = String::new();
    let mut verified_raw = String::new();
    let mut image_url: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        // Photo parts arrive as files; they become inline data URLs
        if name.starts_with("photo") && field.file_name().is_some() {
            let mime = field.content_type().unwrap_or("image/jpeg").to_string();
            let data = field.bytes().await?;
            if !data.is_empty() {
                let encoded = general_purpose::STANDARD.encode(&data);
                image_url = Some(format!("data:{mime};base64,{encoded}"));
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "productId" => product_id = value,
            "shopId" => shop_id = value,
            "rating" => rating_raw = value,
            "title" => title = value,
            "content" => content = value,
            "customerName" => customer_name = value,
            "customerEmail" => customer_email = value,
            "verified" => verified_raw = value,
            _ => {}
        }
    }

    if product_id.is_empty()
        || shop_id.is_empty()
        || rating_raw.is_empty()
        || title.is_empty()
        || content.is_empty()
        || customer_name.is_empty()
    {
        return Err(AppError::validation("Missing required fields"));
    }

    let rating: i64 = rating_raw
        .parse()
        .map_err(|_| AppError::validation("Rating must be between 1 and 5"))?;
    if !(1..=5).contains(&rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }

    let product = store::product::find_by_id(&state.pool, &product_id)
        .await
        .map_err(|e| AppError::internal("Failed to submit review", e))?
        .filter(|p| p.shop_id == shop_id)
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let review = store::review::insert(
        &state.pool,
        &store::review::NewReview {
            product_id: &product.id,
            shop_id: &product.shop_id,
            customer_name: &customer_name,
            customer_email: (!customer_email.is_empty()).then_some(customer_email.as_str()),
            rating,
            title: &title,
            content: &content,
            status: ReviewStatus::Pending,
            is_verified: verified_raw == "true",
            image_url: image_url.as_deref(),
            helpful: 0,
            not_helpful: 0,
        },
    )
    .await
    .map_err(|e| AppError::internal("Failed to submit review", e))?;

    Ok(Json(SubmitResponse {
        success: true,
        review,
        message: "Review submitted successfully and is pending approval".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub product_id: Option<String>,
}

/// Count per star, keyed "1" through "5" on the wire.
#[derive(Debug, Default, Serialize)]
pub struct Distribution {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub distribution: Distribution,
}

/// GET /storefront/reviews/summary - rating histogram for the widget header
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<SummaryResponse>> {
    let product_id = query
        .product_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("Product ID is required"))?;

    let buckets = store::review::published_ratings(&state.pool, &product_id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch review summary", e))?;

    let mut distribution = Distribution::default();
    let mut total = 0i64;
    let mut weighted = 0i64;
    for (rating, count) in buckets {
        match rating {
            1 => distribution.one = count,
            2 => distribution.two = count,
            3 => distribution.three = count,
            4 => distribution.four = count,
            5 => distribution.five = count,
            _ => {}
        }
        total += count;
        weighted += rating * count;
    }

    // One decimal, same rounding the widget shows
    let average_rating = if total > 0 {
        (weighted as f64 / total as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };

    Ok(Json(SummaryResponse {
        total_reviews: total,
        average_rating,
        distribution,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulResponse {
    pub success: bool,
    pub helpful_count: i64,
    pub not_helpful_count: i64,
}

/// POST /storefront/reviews/{id}/helpful - vote on a review
pub async fn helpful_vote(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<HelpfulResponse>> {
    let helpful = body
        .get("helpful")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| AppError::validation("Invalid helpful value"))?;

    let (helpful_count, not_helpful_count) =
        store::review::helpful_vote(&state.pool, &review_id, helpful)
            .await
            .map_err(|e| AppError::internal("Failed to update review", e))?
            .ok_or_else(|| AppError::not_found("Review not found"))?;

    Ok(Json(HelpfulResponse {
        success: true,
        helpful_count,
        not_helpful_count,
    }))
}
