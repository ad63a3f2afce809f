//! Health check endpoint

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use sqlx::SqlitePool;

use crate::db::store;
use crate::state::AppState;

/// GET /health - database probe plus table counts
pub async fn health_check(State(state): State<AppState>) -> Response {
    match probe(&state.pool).await {
        Ok((products, reviews, settings)) => Json(json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "counts": {
                "products": products,
                "reviews": reviews,
                "settings": settings,
            },
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "error": e.to_string(),
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
        )
            .into_response(),
    }
}

async fn probe(pool: &SqlitePool) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    tokio::try_join!(
        store::product::count(pool),
        store::review::count_all(pool),
        store::settings::count(pool),
    )
}
