//! CSV import, export and the downloadable import template.

use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::ShopIdentity;
use crate::csv;
use crate::db::models::ReviewStatus;
use crate::db::store;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const REQUIRED_HEADERS: [&str; 5] = [
    "Product Handle",
    "Customer Name",
    "Rating",
    "Review Title",
    "Review Content",
];

/// Header positions resolved from the file's first row. Optional columns
/// are `None` when the file omits them.
#[derive(Debug)]
struct Columns {
    handle: usize,
    customer_name: usize,
    rating: usize,
    title: usize,
    content: usize,
    email: Option<usize>,
    status: Option<usize>,
    verified: Option<usize>,
    helpful: Option<usize>,
    not_helpful: Option<usize>,
    image_url: Option<usize>,
}

impl Columns {
    fn locate(headers: &[&str]) -> Result<Self, Vec<&'static str>> {
        let find = |name: &str| headers.iter().position(|h| *h == name);

        let (Some(handle), Some(customer_name), Some(rating), Some(title), Some(content)) = (
            find("Product Handle"),
            find("Customer Name"),
            find("Rating"),
            find("Review Title"),
            find("Review Content"),
        ) else {
            let missing = REQUIRED_HEADERS
                .iter()
                .copied()
                .filter(|name| !headers.contains(name))
                .collect();
            return Err(missing);
        };

        Ok(Self {
            handle,
            customer_name,
            rating,
            title,
            content,
            email: find("Customer Email"),
            status: find("Status"),
            verified: find("Verified Purchase"),
            helpful: find("Helpful Votes"),
            not_helpful: find("Not Helpful Votes"),
            image_url: find("Image URL"),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub imported: u64,
    pub skipped: u64,
    /// First ten row errors; `total_errors` carries the full count.
    pub errors: Vec<String>,
    pub total_errors: usize,
}

/// Run one CSV import for a shop. Row failures are collected, not fatal;
/// a malformed file or header row fails the whole request.
pub async fn import_csv(
    pool: &SqlitePool,
    shop_id: &str,
    text: &str,
) -> AppResult<ImportReport> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(AppError::validation("CSV file is empty or invalid"));
    }

    // The header row is plain comma-separated; quoting only applies to
    // data rows.
    let headers: Vec<&str> = lines[0].split(',').map(str::trim).collect();
    let columns = Columns::locate(&headers).map_err(|missing| {
        AppError::validation(format!("Missing required headers: {}", missing.join(", ")))
    })?;

    let settings = store::settings::find(pool, shop_id)
        .await
        .map_err(|e| AppError::internal("Failed to import reviews", e))?;

    let mut imported = 0u64;
    let mut errors: Vec<String> = Vec::new();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let row_no = index + 1;
        let fields = csv::parse_row(line);
        if fields.len() != headers.len() {
            errors.push(format!("Row {row_no}: Column count mismatch"));
            continue;
        }

        let cell = |at: usize| fields.get(at).map(String::as_str).unwrap_or("");
        let opt_cell =
            |at: Option<usize>| at.and_then(|i| fields.get(i)).map(String::as_str).unwrap_or("");

        let rating = match cell(columns.rating).parse::<i64>() {
            Ok(r) if (1..=5).contains(&r) => r,
            _ => {
                errors.push(format!("Row {row_no}: Invalid rating (must be 1-5)"));
                continue;
            }
        };

        let handle = cell(columns.handle);
        let product = store::product::find_by_handle(pool, shop_id, handle)
            .await
            .map_err(|e| AppError::internal("Failed to import reviews", e))?;
        let Some(product) = product else {
            errors.push(format!(
                "Row {row_no}: Product with handle \"{handle}\" not found"
            ));
            continue;
        };

        // A recognized Status cell wins; otherwise the settings gate
        // decides per rating
        let status = ReviewStatus::parse(&opt_cell(columns.status).to_lowercase())
            .unwrap_or_else(|| {
                settings
                    .as_ref()
                    .map(|s| s.initial_status(rating))
                    .unwrap_or(ReviewStatus::Pending)
            });
        let email = opt_cell(columns.email);
        let image_url = opt_cell(columns.image_url);
        let verified = matches!(
            opt_cell(columns.verified).to_lowercase().as_str(),
            "yes" | "true"
        );

        store::review::insert(
            pool,
            &store::review::NewReview {
                product_id: &product.id,
                shop_id,
                customer_name: cell(columns.customer_name),
                customer_email: (!email.is_empty()).then_some(email),
                rating,
                title: cell(columns.title),
                content: cell(columns.content),
                status,
                is_verified: verified,
                image_url: (!image_url.is_empty()).then_some(image_url),
                helpful: opt_cell(columns.helpful).parse().unwrap_or(0),
                not_helpful: opt_cell(columns.not_helpful).parse().unwrap_or(0),
            },
        )
        .await
        .map_err(|e| AppError::internal("Failed to import reviews", e))?;
        imported += 1;

        if status == ReviewStatus::Published {
            store::review::recompute_stats(pool, &product.id)
                .await
                .map_err(|e| AppError::internal("Failed to import reviews", e))?;
        }
    }

    let total_errors = errors.len();
    errors.truncate(10);

    Ok(ImportReport {
        success: true,
        message: format!(
            "Import complete. Imported {imported} reviews, skipped {total_errors}."
        ),
        imported,
        skipped: total_errors as u64,
        errors,
        total_errors,
    })
}

/// POST /api/reviews/import - multipart upload, "file" field
pub async fn import_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    let mut upload: Option<(String, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let text = field.text().await?;
        upload = Some((file_name, text));
    }

    let Some((file_name, text)) = upload else {
        return Err(AppError::validation("No file provided"));
    };
    if !file_name.ends_with(".csv") {
        return Err(AppError::validation(
            "Invalid file type. Please upload a CSV file.",
        ));
    }

    let report = import_csv(&state.pool, &identity.shop, &text).await?;
    Ok(Json(report))
}

const EXPORT_HEADERS: [&str; 15] = [
    "Review ID",
    "Product Title",
    "Product Handle",
    "Customer Name",
    "Customer Email",
    "Rating",
    "Review Title",
    "Review Content",
    "Status",
    "Verified Purchase",
    "Helpful Votes",
    "Not Helpful Votes",
    "Image URL",
    "Created At",
    "Updated At",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub product_id: Option<String>,
}

/// GET /api/reviews/export - the shop's reviews (optionally one product's)
/// as a CSV attachment, every status included.
pub async fn export_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<ShopIdentity>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let product_id = query.product_id.filter(|s| !s.is_empty());
    let rows = store::review::list_for_export(&state.pool, &identity.shop, product_id.as_deref())
        .await
        .map_err(|e| AppError::internal("Failed to export reviews", e))?;

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(EXPORT_HEADERS.join(","));
    for entry in &rows {
        let review = &entry.review;
        let product = &entry.product;
        let cells = [
            review.id.clone(),
            csv::quote(&product.title),
            product.handle.clone(),
            csv::quote(&review.customer_name),
            review.customer_email.clone().unwrap_or_default(),
            review.rating.to_string(),
            csv::quote(&review.title),
            csv::quote(&review.content),
            review.status.as_str().to_string(),
            if review.is_verified { "Yes" } else { "No" }.to_string(),
            review.helpful.to_string(),
            review.not_helpful.to_string(),
            review.image_url.clone().unwrap_or_default(),
            review.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            review.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ];
        lines.push(cells.join(","));
    }

    let date = Utc::now().format("%Y-%m-%d");
    let scope = if product_id.is_some() { "product" } else { "all" };
    let filename = format!("reviews-{scope}-{date}.csv");

    Ok(csv_attachment(&filename, lines.join("\n")))
}

/// GET /api/reviews/template - importable example file
pub async fn template() -> Response {
    let examples = [
        [
            "product-handle-1",
            "John Doe",
            "john@example.com",
            "5",
            "Amazing product!",
            "This product exceeded my expectations. Highly recommend it to everyone!",
            "published",
            "Yes",
            "0",
            "0",
            "",
        ],
        [
            "product-handle-2",
            "Jane Smith",
            "jane@example.com",
            "4",
            "Pretty good",
            "Good quality product. Delivery was fast and packaging was secure.",
            "pending",
            "No",
            "0",
            "0",
            "",
        ],
        [
            "product-handle-1",
            "Mike Johnson",
            "",
            "3",
            "It's okay",
            "Average product. Does the job but nothing special.",
            "published",
            "Yes",
            "0",
            "0",
            "",
        ],
    ];

    let template_headers = [
        "Product Handle",
        "Customer Name",
        "Customer Email",
        "Rating",
        "Review Title",
        "Review Content",
        "Status",
        "Verified Purchase",
        "Helpful Votes",
        "Not Helpful Votes",
        "Image URL",
    ];

    let mut lines = vec![template_headers.join(",")];
    for row in examples {
        let cells: Vec<String> = row.iter().map(|cell| csv::quote(cell)).collect();
        lines.push(cells.join(","));
    }

    csv_attachment("reviews-import-template.csv", lines.join("\n"))
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
