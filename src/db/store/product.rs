//! Product mirror operations

use chrono::Utc;
use sqlx::SqlitePool;

use super::new_id;
use crate::db::models::Product;

/// Whether a catalog upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Product identity as delivered by the catalog (sync pages and update
/// webhooks share this shape).
#[derive(Debug)]
pub struct CatalogProduct<'a> {
    pub external_id: &'a str,
    pub title: &'a str,
    pub handle: &'a str,
    pub image_url: Option<&'a str>,
}

/// Upsert by (shop_id, shopify_product_id). An existing row keeps its
/// review stats; only title/handle/image are overwritten.
pub async fn upsert_from_catalog(
    pool: &SqlitePool,
    shop_id: &str,
    incoming: &CatalogProduct<'_>,
) -> Result<UpsertOutcome, sqlx::Error> {
    let now = Utc::now();

    let updated = sqlx::query(
        r#"
        UPDATE products
        SET title = ?, handle = ?, image_url = ?, updated_at = ?
        WHERE shop_id = ? AND shopify_product_id = ?
        "#,
    )
    .bind(incoming.title)
    .bind(incoming.handle)
    .bind(incoming.image_url)
    .bind(now)
    .bind(shop_id)
    .bind(incoming.external_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated > 0 {
        return Ok(UpsertOutcome::Updated);
    }

    sqlx::query(
        r#"
        INSERT INTO products (
            id, shopify_product_id, shop_id, title, handle, image_url,
            review_count, average_rating, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(new_id())
    .bind(incoming.external_id)
    .bind(shop_id)
    .bind(incoming.title)
    .bind(incoming.handle)
    .bind(incoming.image_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::Created)
}

pub async fn find_by_id(
    pool: &SqlitePool,
    product_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await
}

/// Lookup scoped by the owning shop.
pub async fn find_owned(
    pool: &SqlitePool,
    product_id: &str,
    shop_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ? AND shop_id = ?")
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(pool)
        .await
}

/// Lookup by the catalog's external product id.
pub async fn find_by_external_id(
    pool: &SqlitePool,
    shop_id: &str,
    external_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE shop_id = ? AND shopify_product_id = ?",
    )
    .bind(shop_id)
    .bind(external_id)
    .fetch_optional(pool)
    .await
}

/// Lookup by handle within a shop (CSV import rows reference products by
/// handle, not id).
pub async fn find_by_handle(
    pool: &SqlitePool,
    shop_id: &str,
    handle: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE shop_id = ? AND handle = ?")
        .bind(shop_id)
        .bind(handle)
        .fetch_optional(pool)
        .await
}

/// Delete a product and all of its reviews in one transaction. The cascade
/// is executed here, not assumed from the schema.
pub async fn delete_with_reviews(pool: &SqlitePool, product_id: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reviews WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
