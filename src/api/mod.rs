//! API routes for review-cloud

pub mod health;
pub mod imports;
pub mod products;
pub mod reviews;
pub mod storefront;
pub mod webhooks;

use axum::routing::{get, post};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::shop_auth_middleware;
use crate::error::AppError;
use crate::state::AppState;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Merchant admin API (shop JWT)
    let admin = Router::new()
        .route("/api/reviews", get(reviews::list).post(reviews::create))
        .route("/api/reviews/bulk", post(reviews::bulk))
        .route("/api/reviews/import", post(imports::import_reviews))
        .route("/api/reviews/export", get(imports::export_reviews))
        .route("/api/reviews/template", get(imports::template))
        .route(
            "/api/reviews/{id}",
            axum::routing::patch(reviews::update)
                .put(reviews::update)
                .delete(reviews::remove),
        )
        .route(
            "/api/reviews/{id}/publish",
            post(reviews::publish).patch(reviews::publish),
        )
        .route("/api/products/sync", post(products::sync))
        .route("/api/products/{id}/reviews", get(products::list_reviews))
        .route("/api/setup", post(products::setup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            shop_auth_middleware,
        ));

    // Storefront widget API (public, scoped by product id)
    let storefront = Router::new()
        .route(
            "/storefront/reviews",
            get(storefront::list).post(storefront::submit),
        )
        .route("/storefront/reviews/summary", get(storefront::summary))
        .route(
            "/storefront/reviews/{id}/helpful",
            post(storefront::helpful_vote),
        );

    // Platform webhooks (signature-verified, raw body)
    let hooks = Router::new()
        .route("/webhooks/products/update", post(webhooks::product_update))
        .route("/webhooks/products/delete", post(webhooks::product_delete));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(admin)
        .merge(storefront)
        .merge(hooks)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        // ========== Tower HTTP Middleware ==========
        // CORS - the storefront widget calls from merchant domains
        .layer(CorsLayer::permissive())
        // Trace - request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
