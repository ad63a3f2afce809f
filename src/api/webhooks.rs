//! Platform product webhooks. The body is taken raw for HMAC verification
//! before any JSON parsing; replies are plain text.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::db::store::product::{self, CatalogProduct};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";
const SHOP_HEADER: &str = "x-shopify-shop-domain";
const TOPIC_HEADER: &str = "x-shopify-topic";

/// HMAC-SHA256 over the raw body; the header carries the expected MAC
/// base64-encoded.
fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

struct WebhookEvent {
    shop: String,
    payload: serde_json::Value,
}

fn verify_and_parse(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookEvent, (StatusCode, &'static str)> {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return Err((StatusCode::BAD_REQUEST, "Missing signature"));
    };

    if !verify_signature(&state.webhook_secret, body, signature) {
        return Err((StatusCode::BAD_REQUEST, "Invalid signature"));
    }

    let shop = headers
        .get(SHOP_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if shop.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing shop or payload"));
    }
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(body) else {
        return Err((StatusCode::BAD_REQUEST, "Missing shop or payload"));
    };

    let topic = headers
        .get(TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info!(%shop, topic, "webhook received");

    Ok(WebhookEvent { shop, payload })
}

/// POST /webhooks/products/update - mirror a catalog change
pub async fn product_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let event = match verify_and_parse(&state, &headers, &body) {
        Ok(event) => event,
        Err(reply) => return reply,
    };

    let external_id = event
        .payload
        .get("admin_graphql_api_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if external_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing shop or payload");
    }

    let incoming = CatalogProduct {
        external_id,
        title: event
            .payload
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default(),
        handle: event
            .payload
            .get("handle")
            .and_then(|v| v.as_str())
            .unwrap_or_default(),
        image_url: event.payload.pointer("/image/src").and_then(|v| v.as_str()),
    };

    match product::upsert_from_catalog(&state.pool, &event.shop, &incoming).await {
        Ok(_) => (StatusCode::OK, "Webhook processed"),
        Err(e) => {
            tracing::error!(shop = %event.shop, error = %e, "product update webhook failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed")
        }
    }
}

/// POST /webhooks/products/delete - drop the mirrored product and its
/// reviews; unknown products are acknowledged without effect
pub async fn product_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let event = match verify_and_parse(&state, &headers, &body) {
        Ok(event) => event,
        Err(reply) => return reply,
    };

    let external_id = event
        .payload
        .get("admin_graphql_api_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if external_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing shop or payload");
    }

    let existing = match product::find_by_external_id(&state.pool, &event.shop, external_id).await
    {
        Ok(existing) => existing,
        Err(e) => {
            tracing::error!(shop = %event.shop, error = %e, "product delete webhook failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed");
        }
    };

    let Some(existing) = existing else {
        tracing::warn!(shop = %event.shop, external_id, "delete webhook for unknown product");
        return (StatusCode::OK, "Webhook processed");
    };

    match product::delete_with_reviews(&state.pool, &existing.id).await {
        Ok(()) => (StatusCode::OK, "Webhook processed"),
        Err(e) => {
            tracing::error!(shop = %event.shop, error = %e, "product delete webhook failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed")
        }
    }
}
