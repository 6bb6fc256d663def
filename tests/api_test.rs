/*!
 * HTTP API Tests
 *
 * Drives the service through the router: banner and health endpoints, the
 * multipart CSV preview, confirm, and export.
 */

mod common;

use axum::http::StatusCode;
use budget_tracker_server::constants::{SERVICE_VERSION, ERR_INVALID_AMOUNT};
use budget_tracker_server::models::{
    ExportResponse, HealthResponse, ImportPreview, ImportResult, ServiceInfo,
};
use common::*;
use serde_json::json;

const UPLOAD_CSV: &str = "date,amount,category,description,user
2025-06-01,12.5,Food,Lunch,You
2025-06-02,-1,Food,Refund,You
2025-06-03,40,Transportation,Taxi,Sam
";

#[tokio::test]
async fn root_and_health() {
    let (db, temp_dir) = setup_test_environment().await;
    let server = test_server(db, &temp_dir);

    let info = server.get("/").await.json::<ServiceInfo>();
    assert_eq!(info.version, SERVICE_VERSION);
    assert!(info.message.ends_with("is running!"));

    let health = server.get("/health").await.json::<HealthResponse>();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn preview_upload_classifies_rows() {
    let (db, temp_dir) = setup_seeded_environment().await;
    let server = test_server(db, &temp_dir);

    let response = server
        .post("/api/import/csv/preview")
        .multipart(csv_upload("june.csv", UPLOAD_CSV))
        .await;

    response.assert_status_ok();
    let preview = response.json::<ImportPreview>();
    assert_eq!(preview.summary.valid_count, 2);
    assert_eq!(preview.summary.error_count, 1);
    assert_eq!(preview.error_rows[0].row, 2);
    assert_eq!(preview.error_rows[0].error, ERR_INVALID_AMOUNT);
    assert_eq!(preview.error_rows[0].data["description"], "Refund");
    assert_eq!(preview.new_users, vec!["Sam".to_string()]);
}

#[tokio::test]
async fn preview_rejects_non_csv_upload() {
    let (db, temp_dir) = setup_seeded_environment().await;
    let server = test_server(db, &temp_dir);

    let response = server
        .post("/api/import/csv/preview")
        .multipart(csv_upload("june.txt", UPLOAD_CSV))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "File must be a CSV");
}

#[tokio::test]
async fn preview_rejects_non_utf8_upload() {
    let (db, temp_dir) = setup_seeded_environment().await;
    let server = test_server(db, &temp_dir);
    let part = axum_test::multipart::Part::bytes(vec![0xff, 0xfe, 0x00, 0x41]).file_name("bad.csv");

    let response = server
        .post("/api/import/csv/preview")
        .multipart(axum_test::multipart::MultipartForm::new().add_part("file", part))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "File must be UTF-8 encoded");
}

#[tokio::test]
async fn preview_then_confirm_then_export() {
    let (db, temp_dir) = setup_seeded_environment().await;
    let server = test_server(db, &temp_dir);

    let preview = server
        .post("/api/import/csv/preview")
        .multipart(csv_upload("june.csv", UPLOAD_CSV))
        .await
        .json::<ImportPreview>();

    let response = server
        .post("/api/import/csv/confirm")
        .json(&json!({
            "valid_rows": preview.valid_rows,
            "new_users": preview.new_users,
        }))
        .await;
    response.assert_status_ok();
    let result = response.json::<ImportResult>();
    assert_eq!(result.created_count, 2);
    assert_eq!(result.message, "Successfully imported 2 expenses");

    let export = server
        .get("/api/export/csv")
        .await
        .json::<ExportResponse>();
    assert_eq!(
        export.csv_content,
        "date,amount,category,description,user\n\
         2025-06-03,40,Transportation,Taxi,Sam\n\
         2025-06-01,12.5,Food,Lunch,You\n"
    );
    assert!(export.filename.starts_with("expenses_"));
    assert!(export.filename.ends_with(".csv"));

    let filtered = server
        .get("/api/export/csv")
        .add_query_param("end_date", "2025-06-02")
        .await
        .json::<ExportResponse>();
    assert_eq!(
        filtered.csv_content,
        "date,amount,category,description,user\n2025-06-01,12.5,Food,Lunch,You\n"
    );
}

#[tokio::test]
async fn confirm_accepts_hand_written_payload() {
    let (db, temp_dir) = setup_seeded_environment().await;
    let server = test_server(db, &temp_dir);

    let response = server
        .post("/api/import/csv/confirm")
        .json(&json!({
            "valid_rows": [
                { "row": 1, "date": "2025-07-01", "amount": 9.5, "category": "FOOD", "user": "you" }
            ]
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<ImportResult>().created_count, 1);
}
