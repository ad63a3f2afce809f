//! Review CRUD, moderation listing, bulk transitions and the published
//! stats aggregator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;
use crate::db::models::{
    ProductSummary, Review, ReviewStatus, ReviewWithProduct, StorefrontReview,
};

/// Fields for a new review row.
#[derive(Debug)]
pub struct NewReview<'a> {
    pub product_id: &'a str,
    pub shop_id: &'a str,
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub rating: i64,
    pub title: &'a str,
    pub content: &'a str,
    pub status: ReviewStatus,
    pub is_verified: bool,
    pub image_url: Option<&'a str>,
    pub helpful: i64,
    pub not_helpful: i64,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Default)]
pub struct ReviewPatch {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ReviewStatus>,
    pub is_verified: Option<bool>,
    pub image_url: Option<String>,
}

/// Admin listing filter. All predicates are ANDed; `limit`/`offset` page
/// the result after `created_at DESC` ordering.
#[derive(Debug, Clone)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
    pub product_id: Option<String>,
    pub rating: Option<RatingFilter>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy)]
pub enum RatingFilter {
    Exact(i64),
    /// The "low" bucket: rating of 2 or less.
    AtMost(i64),
}

/// Shop-wide per-status totals, independent of any active list filter.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusCounts {
    pub all: i64,
    pub pending: i64,
    pub published: i64,
    pub rejected: i64,
}

/// Flat row for the review/product join.
#[derive(Debug, sqlx::FromRow)]
struct JoinedReviewRow {
    id: String,
    product_id: String,
    shop_id: String,
    customer_name: String,
    customer_email: Option<String>,
    rating: i64,
    title: String,
    content: String,
    status: ReviewStatus,
    is_verified: bool,
    image_url: Option<String>,
    helpful: i64,
    not_helpful: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_title: String,
    product_handle: String,
    product_image_url: Option<String>,
    shopify_product_id: String,
}

impl JoinedReviewRow {
    fn into_with_product(self) -> ReviewWithProduct {
        ReviewWithProduct {
            product: ProductSummary {
                id: self.product_id.clone(),
                title: self.product_title,
                handle: self.product_handle,
                image_url: self.product_image_url,
                shopify_product_id: self.shopify_product_id,
            },
            review: Review {
                id: self.id,
                product_id: self.product_id,
                shop_id: self.shop_id,
                customer_name: self.customer_name,
                customer_email: self.customer_email,
                rating: self.rating,
                title: self.title,
                content: self.content,
                status: self.status,
                is_verified: self.is_verified,
                image_url: self.image_url,
                helpful: self.helpful,
                not_helpful: self.not_helpful,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}

const JOINED_COLUMNS: &str = "r.id, r.product_id, r.shop_id, r.customer_name, \
     r.customer_email, r.rating, r.title, r.content, r.status, r.is_verified, \
     r.image_url, r.helpful, r.not_helpful, r.created_at, r.updated_at, \
     p.title AS product_title, p.handle AS product_handle, \
     p.image_url AS product_image_url, p.shopify_product_id";

pub async fn insert(pool: &SqlitePool, new: &NewReview<'_>) -> Result<Review, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (
            id, product_id, shop_id, customer_name, customer_email, rating,
            title, content, status, is_verified, image_url,
            helpful, not_helpful, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(new.product_id)
    .bind(new.shop_id)
    .bind(new.customer_name)
    .bind(new.customer_email)
    .bind(new.rating)
    .bind(new.title)
    .bind(new.content)
    .bind(new.status)
    .bind(new.is_verified)
    .bind(new.image_url)
    .bind(new.helpful)
    .bind(new.not_helpful)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_owned(
    pool: &SqlitePool,
    review_id: &str,
    shop_id: &str,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ? AND shop_id = ?")
        .bind(review_id)
        .bind(shop_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_product(
    pool: &SqlitePool,
    review_id: &str,
) -> Result<Option<ReviewWithProduct>, sqlx::Error> {
    let row: Option<JoinedReviewRow> = sqlx::query_as(&format!(
        "SELECT {JOINED_COLUMNS} FROM reviews r \
         JOIN products p ON p.id = r.product_id WHERE r.id = ?"
    ))
    .bind(review_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(JoinedReviewRow::into_with_product))
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ReviewFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND r.status = ").push_bind(status.as_str());
    }
    if let Some(ref product_id) = filter.product_id {
        qb.push(" AND r.product_id = ").push_bind(product_id.clone());
    }
    match filter.rating {
        Some(RatingFilter::Exact(rating)) => {
            qb.push(" AND r.rating = ").push_bind(rating);
        }
        Some(RatingFilter::AtMost(rating)) => {
            qb.push(" AND r.rating <= ").push_bind(rating);
        }
        None => {}
    }
    if let Some(ref term) = filter.search {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (r.customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR r.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR r.content LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Moderation listing: filtered, joined with product, newest first.
pub async fn list(
    pool: &SqlitePool,
    shop_id: &str,
    filter: &ReviewFilter,
) -> Result<Vec<ReviewWithProduct>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {JOINED_COLUMNS} FROM reviews r \
         JOIN products p ON p.id = r.product_id WHERE r.shop_id = "
    ));
    qb.push_bind(shop_id.to_string());
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY r.created_at DESC LIMIT ");
    qb.push_bind(filter.limit);
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset);

    let rows: Vec<JoinedReviewRow> = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(JoinedReviewRow::into_with_product)
        .collect())
}

/// Total matching the same predicates as [`list`], ignoring pagination.
pub async fn count(
    pool: &SqlitePool,
    shop_id: &str,
    filter: &ReviewFilter,
) -> Result<i64, sqlx::Error> {
    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM reviews r WHERE r.shop_id = ");
    qb.push_bind(shop_id.to_string());
    push_filter(&mut qb, filter);

    let (n,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(n)
}

/// Export rows: the full joined set for a shop, optionally one product,
/// every status included.
pub async fn list_for_export(
    pool: &SqlitePool,
    shop_id: &str,
    product_id: Option<&str>,
) -> Result<Vec<ReviewWithProduct>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {JOINED_COLUMNS} FROM reviews r \
         JOIN products p ON p.id = r.product_id WHERE r.shop_id = "
    ));
    qb.push_bind(shop_id.to_string());
    if let Some(product_id) = product_id {
        qb.push(" AND r.product_id = ").push_bind(product_id.to_string());
    }
    qb.push(" ORDER BY r.created_at DESC");

    let rows: Vec<JoinedReviewRow> = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(JoinedReviewRow::into_with_product)
        .collect())
}

/// Shop-wide totals per status, `all` being their sum.
pub async fn status_counts(
    pool: &SqlitePool,
    shop_id: &str,
) -> Result<StatusCounts, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM reviews WHERE shop_id = ? GROUP BY status",
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await?;

    let mut counts = StatusCounts::default();
    for (status, n) in rows {
        match status.as_str() {
            "pending" => counts.pending = n,
            "published" => counts.published = n,
            "rejected" => counts.rejected = n,
            _ => {}
        }
        counts.all += n;
    }
    Ok(counts)
}

/// Apply a partial update. Returns the number of rows touched.
pub async fn update(
    pool: &SqlitePool,
    review_id: &str,
    patch: &ReviewPatch,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE reviews SET
            customer_name = COALESCE(?, customer_name),
            customer_email = COALESCE(?, customer_email),
            rating = COALESCE(?, rating),
            title = COALESCE(?, title),
            content = COALESCE(?, content),
            status = COALESCE(?, status),
            is_verified = COALESCE(?, is_verified),
            image_url = COALESCE(?, image_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&patch.customer_name)
    .bind(&patch.customer_email)
    .bind(patch.rating)
    .bind(&patch.title)
    .bind(&patch.content)
    .bind(patch.status)
    .bind(patch.is_verified)
    .bind(&patch.image_url)
    .bind(Utc::now())
    .bind(review_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_status(
    pool: &SqlitePool,
    review_id: &str,
    status: ReviewStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE reviews SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(review_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, review_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// id + owning product id for each of the shop's reviews among `ids`.
/// Bulk handlers compare the result length against the request to enforce
/// all-or-nothing membership.
pub async fn find_owned_refs(
    pool: &SqlitePool,
    shop_id: &str,
    ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT id, product_id FROM reviews WHERE shop_id = ");
    qb.push_bind(shop_id.to_string());
    qb.push(" AND id IN (");
    let mut id_list = qb.separated(", ");
    for id in ids {
        id_list.push_bind(id.clone());
    }
    id_list.push_unseparated(")");

    qb.build_query_as().fetch_all(pool).await
}

pub async fn bulk_set_status(
    pool: &SqlitePool,
    ids: &[String],
    status: ReviewStatus,
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE reviews SET status = ");
    qb.push_bind(status.as_str());
    qb.push(", updated_at = ");
    qb.push_bind(Utc::now());
    qb.push(" WHERE id IN (");
    let mut id_list = qb.separated(", ");
    for id in ids {
        id_list.push_bind(id.clone());
    }
    id_list.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn bulk_delete(pool: &SqlitePool, ids: &[String]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM reviews WHERE id IN (");
    let mut id_list = qb.separated(", ");
    for id in ids {
        id_list.push_bind(id.clone());
    }
    id_list.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Increment one of the vote counters. Returns the updated pair
/// `(helpful, not_helpful)`, or `None` if the review does not exist.
pub async fn helpful_vote(
    pool: &SqlitePool,
    review_id: &str,
    helpful: bool,
) -> Result<Option<(i64, i64)>, sqlx::Error> {
    let sql = if helpful {
        "UPDATE reviews SET helpful = helpful + 1, updated_at = ? \
         WHERE id = ? RETURNING helpful, not_helpful"
    } else {
        "UPDATE reviews SET not_helpful = not_helpful + 1, updated_at = ? \
         WHERE id = ? RETURNING helpful, not_helpful"
    };

    sqlx::query_as(sql)
        .bind(Utc::now())
        .bind(review_id)
        .fetch_optional(pool)
        .await
}

/// Recompute a product's published-review aggregates and write them onto
/// the product row. Always a full recomputation, so concurrent writers
/// converge to the same result regardless of interleaving.
pub async fn recompute_stats(pool: &SqlitePool, product_id: &str) -> Result<(), sqlx::Error> {
    let (count, avg): (i64, Option<f64>) = sqlx::query_as(
        "SELECT COUNT(*), AVG(rating) FROM reviews \
         WHERE product_id = ? AND status = 'published'",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "UPDATE products SET review_count = ?, average_rating = ?, updated_at = ? WHERE id = ?",
    )
    .bind(count)
    .bind(avg.unwrap_or(0.0))
    .bind(Utc::now())
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Published reviews for one product, storefront projection, newest first.
pub async fn list_published(
    pool: &SqlitePool,
    product_id: &str,
    rating: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<StorefrontReview>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, rating, title, content, customer_name, customer_email, \
         is_verified, image_url, helpful, not_helpful, created_at, updated_at \
         FROM reviews WHERE status = 'published' AND product_id = ",
    );
    qb.push_bind(product_id.to_string());
    if let Some(rating) = rating {
        qb.push(" AND rating = ").push_bind(rating);
    }
    qb.push(" ORDER BY created_at DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    qb.build_query_as().fetch_all(pool).await
}

pub async fn count_published(
    pool: &SqlitePool,
    product_id: &str,
    rating: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM reviews WHERE status = 'published' AND product_id = ",
    );
    qb.push_bind(product_id.to_string());
    if let Some(rating) = rating {
        qb.push(" AND rating = ").push_bind(rating);
    }

    let (n,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(n)
}

/// `(rating, count)` buckets over a product's published reviews.
pub async fn published_ratings(
    pool: &SqlitePool,
    product_id: &str,
) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT rating, COUNT(*) FROM reviews \
         WHERE product_id = ? AND status = 'published' GROUP BY rating",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
}

pub async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
