//! CSV round trips: bulk import with per-row error collection, the export
//! attachment, and the downloadable template.

mod common;

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::header;
use axum::response::Response;
use sqlx::SqlitePool;

use review_cloud::api::imports::{self, ExportQuery, import_csv};
use review_cloud::csv;
use review_cloud::db::models::ReviewStatus;
use review_cloud::db::store;
use review_cloud::db::store::review::NewReview;
use review_cloud::error::AppError;

use common::*;

const IMPORT_HEADER: &str = "Product Handle,Customer Name,Customer Email,Rating,Review Title,\
Review Content,Status,Verified Purchase,Helpful Votes,Not Helpful Votes,Image URL";

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn import_collects_row_errors_and_imports_the_rest() {
    let (_dir, pool) = test_pool().await;
    seed_product(&pool, SHOP, "walnut-desk").await;
    seed_product(&pool, SHOP, "brass-lamp").await;

    let file = format!(
        "{IMPORT_HEADER}\n\
         walnut-desk,John Doe,john@example.com,5,\"Amazing, truly\",\"He said \"\"superb\"\", and meant it\",published,Yes,3,1,\n\
         brass-lamp,Jane Smith,,4,Bright,Lights the whole room,pending,No,0,0,\n\
         missing-product,Mike,,3,Meh,Average,published,No,0,0,\n\
         walnut-desk,Rita,,abc,Bad rating,Text,published,No,0,0,\n\
         walnut-desk,Short Row,3\n"
    );

    let report = import_csv(&pool, SHOP, &file).await.expect("import");
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total_errors, 3);
    assert_eq!(
        report.message,
        "Import complete. Imported 2 reviews, skipped 3."
    );
    assert_eq!(
        report.errors,
        vec![
            "Row 4: Product with handle \"missing-product\" not found".to_string(),
            "Row 5: Invalid rating (must be 1-5)".to_string(),
            "Row 6: Column count mismatch".to_string(),
        ]
    );

    // Quoted commas and doubled quotes survived the trip in
    let desk = store::product::find_by_handle(&pool, SHOP, "walnut-desk")
        .await
        .expect("query")
        .expect("product");
    let rows = store::review::list_for_export(&pool, SHOP, Some(&desk.id))
        .await
        .expect("rows");
    assert_eq!(rows.len(), 1);
    let imported = &rows[0].review;
    assert_eq!(imported.title, "Amazing, truly");
    assert_eq!(imported.content, "He said \"superb\", and meant it");
    assert_eq!(imported.status, ReviewStatus::Published);
    assert!(imported.is_verified);
    assert_eq!((imported.helpful, imported.not_helpful), (3, 1));

    // The published row refreshed the product stats on the spot
    let row = product_row(&pool, &desk.id).await;
    assert_eq!((row.review_count, row.average_rating), (1, 5.0));
}

#[tokio::test]
async fn import_defaults_status_from_settings() {
    let (_dir, pool) = test_pool().await;
    let product = seed_product(&pool, SHOP, "walnut-desk").await;

    // No Status column in the file; auto-publish gated on a minimum rating
    store::settings::ensure_defaults(&pool, SHOP)
        .await
        .expect("settings");
    sqlx::query(
        "UPDATE settings SET auto_publish = 1, min_rating_to_publish = 4 WHERE shop_id = ?",
    )
    .bind(SHOP)
    .execute(&pool)
    .await
    .expect("auto publish on");

    let file = "Product Handle,Customer Name,Rating,Review Title,Review Content\n\
                walnut-desk,John Doe,5,Good,Works\n\
                walnut-desk,Jane Smith,2,Meh,Wobbles\n";
    let report = import_csv(&pool, SHOP, file).await.expect("import");
    assert_eq!(report.imported, 2);

    let rows = store::review::list_for_export(&pool, SHOP, Some(&product.id))
        .await
        .expect("rows");
    let status_of = |rating: i64| {
        rows.iter()
            .find(|r| r.review.rating == rating)
            .expect("imported row")
            .review
            .status
    };
    // The gate applies per row: at or above the minimum publishes, below pends
    assert_eq!(status_of(5), ReviewStatus::Published);
    assert_eq!(status_of(2), ReviewStatus::Pending);

    // Only the published row reached the product stats
    let row = product_row(&pool, &product.id).await;
    assert_eq!((row.review_count, row.average_rating), (1, 5.0));
}

#[tokio::test]
async fn import_rejects_malformed_files() {
    let (_dir, pool) = test_pool().await;

    let err = import_csv(&pool, SHOP, "Product Handle,Customer Name\n")
        .await
        .err()
        .expect("header-only file rejected");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "CSV file is empty or invalid");

    let err = import_csv(
        &pool,
        SHOP,
        "Product Handle,Customer Name\nwalnut-desk,John\n",
    )
    .await
    .err()
    .expect("missing headers rejected");
    assert_eq!(
        err.to_string(),
        "Missing required headers: Rating, Review Title, Review Content"
    );
}

#[tokio::test]
async fn import_handler_checks_the_upload_itself() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    seed_product(&pool, SHOP, "walnut-desk").await;

    // No "file" field in the form
    let parts = vec![text_part("note", "hello")];
    let err = imports::import_reviews(
        State(state.clone()),
        Extension(identity()),
        multipart_from(parts).await,
    )
    .await
    .err()
    .expect("missing file rejected");
    assert_eq!(err.to_string(), "No file provided");

    let csv_body = "Product Handle,Customer Name,Rating,Review Title,Review Content\n\
                    walnut-desk,John Doe,5,Good,Works\n";

    let parts = vec![file_part("file", "reviews.txt", "text/plain", csv_body)];
    let err = imports::import_reviews(
        State(state.clone()),
        Extension(identity()),
        multipart_from(parts).await,
    )
    .await
    .err()
    .expect("non-csv filename rejected");
    assert_eq!(
        err.to_string(),
        "Invalid file type. Please upload a CSV file."
    );

    let parts = vec![file_part("file", "reviews.csv", "text/csv", csv_body)];
    let Json(report) = imports::import_reviews(
        State(state),
        Extension(identity()),
        multipart_from(parts).await,
    )
    .await
    .expect("csv upload accepted");
    assert_eq!(report.imported, 1);
    assert_eq!(report.total_errors, 0);
}

#[tokio::test]
async fn export_writes_the_full_column_set() {
    let (_dir, pool) = test_pool().await;
    let state = test_state(&pool);
    let desk = seed_product(&pool, SHOP, "walnut-desk").await;
    let lamp = seed_product(&pool, SHOP, "brass-lamp").await;

    store::review::insert(
        &pool,
        &NewReview {
            product_id: &desk.id,
            shop_id: SHOP,
            customer_name: "John Doe",
            customer_email: None,
            rating: 5,
            title: "Amazing, truly",
            content: "He said \"superb\", and meant it",
            status: ReviewStatus::Published,
            is_verified: true,
            image_url: None,
            helpful: 3,
            not_helpful: 1,
        },
    )
    .await
    .expect("insert");
    seed_review(&pool, &lamp, 2, ReviewStatus::Pending).await;

    let response = imports::export_reviews(
        State(state.clone()),
        Extension(identity()),
        Query(ExportQuery { product_id: None }),
    )
    .await
    .expect("export");
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("disposition")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"reviews-all-"));

    let body = body_text(response).await;
    let lines: Vec<&str> = body.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Review ID,Product Title,Product Handle,Customer Name,Customer Email,Rating,\
         Review Title,Review Content,Status,Verified Purchase,Helpful Votes,\
         Not Helpful Votes,Image URL,Created At,Updated At"
    );

    // Both data rows parse back into exactly 15 fields
    let desk_line = lines
        .iter()
        .find(|l| l.contains("walnut-desk"))
        .expect("desk row");
    let fields = csv::parse_row(desk_line);
    assert_eq!(fields.len(), 15);
    assert_eq!(fields[1], "The walnut-desk");
    assert_eq!(fields[3], "John Doe");
    assert_eq!(fields[4], "");
    assert_eq!(fields[5], "5");
    assert_eq!(fields[6], "Amazing, truly");
    assert_eq!(fields[7], "He said \"superb\", and meant it");
    assert_eq!(fields[8], "published");
    assert_eq!(fields[9], "Yes");
    assert_eq!((fields[10].as_str(), fields[11].as_str()), ("3", "1"));
    // Millisecond UTC timestamps
    assert!(fields[13].ends_with('Z') && fields[13].contains('.'));

    // Product-scoped export drops the other product's rows
    let response = imports::export_reviews(
        State(state),
        Extension(identity()),
        Query(ExportQuery {
            product_id: Some(lamp.id.clone()),
        }),
    )
    .await
    .expect("scoped export");
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("disposition")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"reviews-product-"));
    let body = body_text(response).await;
    assert_eq!(body.split('\n').count(), 2);
    assert!(body.contains("brass-lamp"));
}

#[tokio::test]
async fn template_imports_cleanly() {
    let (_dir, pool) = test_pool().await;
    seed_product(&pool, SHOP, "product-handle-1").await;
    seed_product(&pool, SHOP, "product-handle-2").await;

    let response = imports::template().await;
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("disposition");
    assert_eq!(
        disposition,
        "attachment; filename=\"reviews-import-template.csv\""
    );

    let body = body_text(response).await;
    let lines: Vec<&str> = body.split('\n').collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(csv::parse_row(lines[1]).len(), 11);

    // The template is itself a valid import file
    let report = import_csv(&pool, SHOP, &body).await.expect("import template");
    assert_eq!(report.imported, 3);
    assert_eq!(report.total_errors, 0);

    let product = store::product::find_by_handle(&pool, SHOP, "product-handle-1")
        .await
        .expect("query")
        .expect("product");
    let rows = store::review::list_for_export(&pool, SHOP, Some(&product.id))
        .await
        .expect("rows");
    assert_eq!(rows.len(), 2);
    assert!(
        rows.iter()
            .all(|r| r.review.status == ReviewStatus::Published)
    );
}
