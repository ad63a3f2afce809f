//! Per-shop settings rows.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::Settings;

/// Fetch the shop's settings, if the shop was ever set up. Review-creation
/// paths treat an absent row as "no auto-publish".
pub async fn find(pool: &SqlitePool, shop_id: &str) -> Result<Option<Settings>, sqlx::Error> {
    sqlx::query_as::<_, Settings>("SELECT * FROM settings WHERE shop_id = ?")
        .bind(shop_id)
        .fetch_optional(pool)
        .await
}

/// Create the default settings row if absent. Returns true when a row was
/// created by this call.
pub async fn ensure_defaults(pool: &SqlitePool, shop_id: &str) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO settings (
            shop_id, auto_publish, require_moderation, allow_guest_reviews,
            require_verified_purchase, min_rating_to_publish,
            enable_review_images, email_notifications, created_at, updated_at
        )
        VALUES (?, 0, 1, 1, 0, 1, 1, 1, ?, ?)
        ON CONFLICT (shop_id) DO NOTHING
        "#,
    )
    .bind(shop_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
