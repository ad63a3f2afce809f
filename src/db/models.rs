//! Row types shared by the store and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation status of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Published,
    Rejected,
}

impl ReviewStatus {
    /// Parse the lowercase wire form ("pending", "published", "rejected").
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }
}

/// Local mirror of a catalog product, carrying denormalized review stats.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub shopify_product_id: String,
    pub shop_id: String,
    pub title: String,
    pub handle: String,
    pub image_url: Option<String>,
    pub review_count: i64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            handle: self.handle.clone(),
            image_url: self.image_url.clone(),
            shopify_product_id: self.shopify_product_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub shop_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub rating: i64,
    pub title: String,
    pub content: String,
    pub status: ReviewStatus,
    pub is_verified: bool,
    pub image_url: Option<String>,
    pub helpful: i64,
    pub not_helpful: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields embedded in admin review responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub image_url: Option<String>,
    pub shopify_product_id: String,
}

/// Review joined with its product summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithProduct {
    #[serde(flatten)]
    pub review: Review,
    pub product: ProductSummary,
}

/// Storefront projection of a published review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontReview {
    pub id: String,
    pub rating: i64,
    pub title: String,
    pub content: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub is_verified: bool,
    pub image_url: Option<String>,
    pub helpful: i64,
    pub not_helpful: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-shop moderation settings, created with fixed defaults at setup.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub shop_id: String,
    pub auto_publish: bool,
    pub require_moderation: bool,
    pub allow_guest_reviews: bool,
    pub require_verified_purchase: bool,
    pub min_rating_to_publish: i64,
    pub enable_review_images: bool,
    pub email_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Initial status for a new review under these settings.
    pub fn initial_status(&self, rating: i64) -> ReviewStatus {
        if self.auto_publish && rating >= self.min_rating_to_publish {
            ReviewStatus::Published
        } else {
            ReviewStatus::Pending
        }
    }
}
