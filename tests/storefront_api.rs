//! Storefront widget endpoints: published-only listing, rating summary,
//! customer submission and helpful votes.

mod common;

use axum::Json;
use axum::extract::{Path, Query, State};
use base64::{Engine as _, engine::general_purpose};
use sqlx::SqlitePool;

use review_cloud::api::storefront::{self, StorefrontListQuery, SummaryQuery};
use review_cloud::db::models::ReviewStatus;
use review_cloud::db::store;
use review_cloud::error::AppError;

use common::*;

fn list_query(product_id: Option<&str>) -> StorefrontListQuery {
    StorefrontListQuery {
        product_id: product_id.map(String::from),
        rating: None,
        page: None,
        limit: None,
    }
}

fn submission_parts(product_id: &str, shop_id: &str) -> Vec<String> {
    vec![
        text_part("productId", product_id),
        text_part("shopId", shop_id),
        text_part("rating", "4"),
        text_part("title", "Great desk"),
        text_part("content", "Sturdy and easy to assemble."),
        text_part("customerName", "Sam Carter"),
        text_part("customerEmail", "sam@example.com"),
        text_part("verified", "true"),
    ]
}

async fn published_fixture(pool: &SqlitePool) -> String {
    let product = seed_product(pool, SHOP, "walnut-desk").await;
    seed_review(pool, &product, 5, ReviewStatus::Published).await;
    seed_review(pool, &product, 4, ReviewStatus::Published).await;
    seed_review(pool, &product, 2, ReviewStatus::Published).await;
    seed_review(pool, &product, 1, ReviewStatus::Pending).await;
    seed_review(pool, &product, 1, ReviewStatus::Rejected).await;
    product.id
}

#[tokio::test]
async fn list_serves_published_reviews_only() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let product_id = published_fixture(&pool).await;

    let Json(body) = storefront::list(
        State(state.clone()),
        Query(list_query(Some(&product_id))),
    )
    .await
    .expect("list");
    assert_eq!(body.reviews.len(), 3);
    assert!(body.reviews.iter().all(|r| r.rating >= 2));
    assert_eq!(body.pagination.page, 1);
    assert_eq!(body.pagination.limit, 10);
    assert_eq!(body.pagination.total, 3);
    assert_eq!(body.pagination.pages, 1);

    // page/limit pagination with a ceil page count
    let mut query = list_query(Some(&product_id));
    query.limit = Some(2);
    let Json(body) = storefront::list(State(state.clone()), Query(query))
        .await
        .expect("first page");
    assert_eq!(body.reviews.len(), 2);
    assert_eq!(body.pagination.pages, 2);

    let mut query = list_query(Some(&product_id));
    query.limit = Some(2);
    query.page = Some(2);
    let Json(body) = storefront::list(State(state.clone()), Query(query))
        .await
        .expect("second page");
    assert_eq!(body.reviews.len(), 1);

    let mut query = list_query(Some(&product_id));
    query.rating = Some("5".to_string());
    let Json(body) = storefront::list(State(state.clone()), Query(query))
        .await
        .expect("rating filter");
    assert_eq!(body.reviews.len(), 1);
    assert_eq!(body.reviews[0].rating, 5);

    // No published reviews: an empty page and a zero page count
    let bare = seed_product(&pool, SHOP, "brass-lamp").await;
    let Json(body) = storefront::list(State(state.clone()), Query(list_query(Some(&bare.id))))
        .await
        .expect("empty listing");
    assert!(body.reviews.is_empty());
    assert_eq!(body.pagination.total, 0);
    assert_eq!(body.pagination.pages, 0);

    let err = storefront::list(State(state), Query(list_query(None)))
        .await
        .err()
        .expect("missing product id rejected");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "Product ID is required");
}

#[tokio::test]
async fn summary_builds_histogram_and_rounds_average() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let product = seed_product(&pool, SHOP, "walnut-desk").await;
    seed_review(&pool, &product, 5, ReviewStatus::Published).await;
    seed_review(&pool, &product, 5, ReviewStatus::Published).await;
    seed_review(&pool, &product, 4, ReviewStatus::Published).await;
    seed_review(&pool, &product, 2, ReviewStatus::Published).await;
    seed_review(&pool, &product, 1, ReviewStatus::Pending).await;

    let Json(body) = storefront::summary(
        State(state.clone()),
        Query(SummaryQuery {
            product_id: Some(product.id.clone()),
        }),
    )
    .await
    .expect("summary");
    assert_eq!(body.total_reviews, 4);
    assert_eq!(body.average_rating, 4.0);
    assert_eq!(body.distribution.five, 2);
    assert_eq!(body.distribution.four, 1);
    assert_eq!(body.distribution.three, 0);
    assert_eq!(body.distribution.two, 1);
    assert_eq!(body.distribution.one, 0);

    // Products with no published reviews serve an explicit zero state
    let bare = seed_product(&pool, SHOP, "brass-lamp").await;
    let Json(body) = storefront::summary(
        State(state.clone()),
        Query(SummaryQuery {
            product_id: Some(bare.id.clone()),
        }),
    )
    .await
    .expect("zero state");
    assert_eq!(body.total_reviews, 0);
    assert_eq!(body.average_rating, 0.0);
    assert_eq!(body.distribution.five, 0);

    // 13/3 rounds to one decimal
    seed_review(&pool, &bare, 5, ReviewStatus::Published).await;
    seed_review(&pool, &bare, 4, ReviewStatus::Published).await;
    seed_review(&pool, &bare, 4, ReviewStatus::Published).await;
    let Json(body) = storefront::summary(
        State(state),
        Query(SummaryQuery {
            product_id: Some(bare.id),
        }),
    )
    .await
    .expect("rounded summary");
    assert_eq!(body.average_rating, 4.3);
}

#[tokio::test]
async fn submit_always_pends_and_inlines_photos() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let product = seed_product(&pool, SHOP, "walnut-desk").await;

    // Even a shop with auto-publish on moderates storefront submissions
    store::settings::ensure_defaults(&pool, SHOP)
        .await
        .expect("settings");
    sqlx::query("UPDATE settings SET auto_publish = 1 WHERE shop_id = ?")
        .bind(SHOP)
        .execute(&pool)
        .await
        .expect("auto publish on");

    let mut parts = submission_parts(&product.id, SHOP);
    parts.push(file_part("photo0", "desk.png", "image/png", "PNGDATA"));
    let multipart = multipart_from(parts).await;

    let Json(body) = storefront::submit(State(state.clone()), multipart)
        .await
        .expect("submit");
    assert!(body.success);
    assert_eq!(
        body.message,
        "Review submitted successfully and is pending approval"
    );
    assert_eq!(body.review.status, ReviewStatus::Pending);
    assert_eq!(body.review.customer_name, "Sam Carter");
    assert!(body.review.is_verified);
    let expected_url = format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(b"PNGDATA")
    );
    assert_eq!(body.review.image_url.as_deref(), Some(expected_url.as_str()));

    // Pending, so stats stay at zero
    let row = product_row(&pool, &product.id).await;
    assert_eq!(row.review_count, 0);
}

#[tokio::test]
async fn submit_validates_fields_and_product() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let product = seed_product(&pool, SHOP, "walnut-desk").await;

    // No rating part at all
    let parts = vec![
        text_part("productId", &product.id),
        text_part("shopId", SHOP),
        text_part("title", "Great desk"),
        text_part("content", "Sturdy."),
        text_part("customerName", "Sam Carter"),
    ];
    let err = storefront::submit(State(state.clone()), multipart_from(parts).await)
        .await
        .err()
        .expect("missing rating rejected");
    assert_eq!(err.to_string(), "Missing required fields");

    let mut parts = submission_parts(&product.id, SHOP);
    parts[2] = text_part("rating", "7");
    let err = storefront::submit(State(state.clone()), multipart_from(parts).await)
        .await
        .err()
        .expect("rating 7 rejected");
    assert_eq!(err.to_string(), "Rating must be between 1 and 5");

    // shopId must match the product's owner
    let parts = submission_parts(&product.id, OTHER_SHOP);
    let err = storefront::submit(State(state), multipart_from(parts).await)
        .await
        .err()
        .expect("shop mismatch rejected");
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Product not found");
}

#[tokio::test]
async fn helpful_votes_accumulate() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let product = seed_product(&pool, SHOP, "walnut-desk").await;
    let review = seed_review(&pool, &product, 4, ReviewStatus::Published).await;

    let Json(body) = storefront::helpful_vote(
        State(state.clone()),
        Path(review.id.clone()),
        Json(serde_json::json!({ "helpful": true })),
    )
    .await
    .expect("first vote");
    assert_eq!((body.helpful_count, body.not_helpful_count), (1, 0));

    let Json(body) = storefront::helpful_vote(
        State(state.clone()),
        Path(review.id.clone()),
        Json(serde_json::json!({ "helpful": false })),
    )
    .await
    .expect("second vote");
    assert_eq!((body.helpful_count, body.not_helpful_count), (1, 1));

    let row = store::review::find_owned(&pool, &review.id, SHOP)
        .await
        .expect("query")
        .expect("row");
    assert_eq!((row.helpful, row.not_helpful), (1, 1));

    let err = storefront::helpful_vote(
        State(state.clone()),
        Path(review.id.clone()),
        Json(serde_json::json!({ "helpful": "yes" })),
    )
    .await
    .err()
    .expect("non-bool rejected");
    assert_eq!(err.to_string(), "Invalid helpful value");

    let err = storefront::helpful_vote(
        State(state),
        Path("no-such-review".to_string()),
        Json(serde_json::json!({ "helpful": true })),
    )
    .await
    .err()
    .expect("unknown review rejected");
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Review not found");
}
