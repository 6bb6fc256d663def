#![allow(dead_code)]

use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use budget_tracker_server::build_router;
use budget_tracker_server::categories::insert_category;
use budget_tracker_server::config::Config;
use budget_tracker_server::constants::DEFAULT_COLOR;
use budget_tracker_server::database::{Db, ensure_defaults, init_db};
use budget_tracker_server::expenses::insert_expense;
use budget_tracker_server::models::{Category, CreateExpensePayload, Expense, User};
use budget_tracker_server::users::insert_user;
use budget_tracker_server::utils::parse_date;
use tempfile::{TempDir, tempdir};

/// Creates an empty database in a fresh temporary directory.
///
/// The returned `TempDir` must be kept alive for the duration of the test.
pub async fn setup_test_environment() -> (Db, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    (db, temp_dir)
}

/// Like `setup_test_environment`, with the default categories and user seeded.
pub async fn setup_seeded_environment() -> (Db, TempDir) {
    let (db, temp_dir) = setup_test_environment().await;
    ensure_defaults(&db)
        .await
        .expect("Failed to seed default data");
    (db, temp_dir)
}

pub fn test_server(db: Db, temp_dir: &TempDir) -> TestServer {
    let config = Config::for_data_path(temp_dir.path().to_str().expect("non UTF-8 temp path"));
    TestServer::try_new(build_router(db, &config)).expect("Could not create test server.")
}

pub async fn create_test_user(db: &Db, name: &str) -> User {
    insert_user(db, name, DEFAULT_COLOR)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test user '{}': {}", name, e))
}

pub async fn create_test_category(db: &Db, name: &str) -> Category {
    insert_category(db, name, DEFAULT_COLOR, false)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test category '{}': {}", name, e))
}

pub async fn create_test_expense(
    db: &Db,
    amount: f64,
    date: &str,
    user: &User,
    category: &Category,
    description: Option<&str>,
) -> Expense {
    let payload = CreateExpensePayload {
        amount,
        description: description.map(str::to_string),
        date: parse_date(date).unwrap_or_else(|| panic!("Bad test date '{}'", date)),
        user_id: user.id.clone(),
        category_id: category.id.clone(),
    };
    insert_expense(db, &payload)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test expense on {}: {}", date, e))
}

pub fn csv_upload(file_name: &str, content: &str) -> MultipartForm {
    let part = Part::bytes(content.as_bytes().to_vec())
        .file_name(file_name)
        .mime_type("text/csv");
    MultipartForm::new().add_part("file", part)
}
