/*!
 * CSV Import Tests
 *
 * Exercises the preview/confirm pipeline against a real database:
 * - one expense per valid row, none for error rows
 * - creation of previously unseen users, deduplicated and re-checked at confirm time
 * - rows whose category disappears between preview and confirm are skipped and reported
 * - export followed by re-import reproduces the data
 */

mod common;

use budget_tracker_server::categories::{fetch_categories, insert_category};
use budget_tracker_server::constants::{DEFAULT_COLOR, MAX_DESCRIPTION_LENGTH, MAX_USER_NAME_LENGTH};
use budget_tracker_server::database::Db;
use budget_tracker_server::export::expenses_to_csv;
use budget_tracker_server::import::{commit_import, preview_csv};
use budget_tracker_server::models::{ConfirmImportPayload, ExpenseFilter, ImportPreview, SkippedRow};
use budget_tracker_server::expenses::query_expenses;
use budget_tracker_server::users::fetch_users;
use common::*;

async fn preview(db: &Db, text: &str) -> ImportPreview {
    let users = fetch_users(db, 0, None).await.unwrap();
    let categories = fetch_categories(db, 0, None).await.unwrap();
    preview_csv(text, &users, &categories).expect("Failed to preview CSV")
}

fn confirm_payload(preview: &ImportPreview) -> ConfirmImportPayload {
    ConfirmImportPayload {
        valid_rows: preview.valid_rows.clone(),
        new_users: preview.new_users.clone(),
    }
}

const MIXED_CSV: &str = "date,amount,category,description,user
2025-01-05,12.50,Food,Groceries,You
2025-01-06,0,Food,Free sample,You
2025-13-01,5,Food,Bad date,You
2025-01-07,30,Travel,Train,Bob
2025-01-08,7.25,Rent,Unknown category,Carol
2025-01-09,4,food,Snack,bob 
";

#[tokio::test]
async fn preview_does_not_modify_the_store() {
    let (db, _temp_dir) = setup_seeded_environment().await;

    let result = preview(&db, MIXED_CSV).await;

    assert_eq!(result.summary.total_rows, 6);
    assert_eq!(result.summary.valid_count, 3);
    assert_eq!(result.summary.error_count, 3);
    assert_eq!(result.new_users, vec!["Bob".to_string(), "Carol".to_string()]);
    assert_eq!(fetch_users(&db, 0, None).await.unwrap().len(), 1);
    assert!(query_expenses(&db, &ExpenseFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn confirm_creates_one_expense_per_valid_row() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let result = preview(&db, MIXED_CSV).await;

    let outcome = commit_import(&db, confirm_payload(&result)).await.unwrap();

    assert_eq!(outcome.created_count, 3);
    assert!(outcome.skipped_rows.is_empty());
    assert_eq!(outcome.message, "Successfully imported 3 expenses");

    let expenses = query_expenses(&db, &ExpenseFilter::default()).await.unwrap();
    assert_eq!(expenses.len(), 3);
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    assert!((total - 46.5).abs() < 1e-9);
    assert!(expenses.iter().all(|e| e.amount > 0.0));
}

#[tokio::test]
async fn confirm_creates_each_new_user_once() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let result = preview(&db, MIXED_CSV).await;

    commit_import(&db, confirm_payload(&result)).await.unwrap();

    let users = fetch_users(&db, 0, None).await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["You", "Bob", "Carol"]);
    assert!(users.iter().all(|u| u.color == DEFAULT_COLOR));

    let bob = &users[1];
    let bob_expenses = query_expenses(
        &db,
        &ExpenseFilter {
            user_id: Some(bob.id.clone()),
            ..ExpenseFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(bob_expenses.len(), 2);
}

#[tokio::test]
async fn repeated_confirm_does_not_duplicate_users() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let result = preview(&db, MIXED_CSV).await;

    commit_import(&db, confirm_payload(&result)).await.unwrap();
    let payload = ConfirmImportPayload {
        valid_rows: Vec::new(),
        new_users: vec!["BOB".to_string(), " carol ".to_string(), "Dana".to_string(), "dana".to_string()],
    };
    let outcome = commit_import(&db, payload).await.unwrap();

    assert_eq!(outcome.created_count, 0);
    let names: Vec<String> = fetch_users(&db, 0, None)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["You", "Bob", "Carol", "Dana"]);
}

#[tokio::test]
async fn rows_with_vanished_category_are_skipped_and_reported() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    insert_category(&db, "Pets", DEFAULT_COLOR, false).await.unwrap();
    let text = "date,amount,category,description,user
2025-02-01,20,Pets,Vet,You
2025-02-02,8,Food,Lunch,You
";
    let result = preview(&db, text).await;
    assert_eq!(result.summary.valid_count, 2);

    {
        let conn = db.write().await;
        conn.execute("DELETE FROM categories WHERE name = 'Pets'", ())
            .await
            .unwrap();
    }
    let outcome = commit_import(&db, confirm_payload(&result)).await.unwrap();

    assert_eq!(outcome.created_count, 1);
    assert_eq!(
        outcome.skipped_rows,
        vec![SkippedRow {
            row: 1,
            reason: "Unknown category: Pets".to_string(),
        }]
    );
    assert_eq!(
        query_expenses(&db, &ExpenseFilter::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn tampered_rows_are_skipped() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let mut result = preview(&db, "date,amount,category,user\n2025-02-01,20,Food,You\n2025-02-02,5,Food,Zed\n").await;
    result.valid_rows[0].amount = -3.0;
    result.new_users.clear();

    let outcome = commit_import(&db, confirm_payload(&result)).await.unwrap();

    assert_eq!(outcome.created_count, 0);
    assert_eq!(outcome.skipped_rows.len(), 2);
    assert_eq!(outcome.skipped_rows[0].row, 1);
    assert_eq!(
        outcome.skipped_rows[1],
        SkippedRow {
            row: 2,
            reason: "Unknown user: Zed".to_string(),
        }
    );
}

#[tokio::test]
async fn every_previewed_valid_row_is_created_on_confirm() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let text = format!(
        "date,amount,category,description,user\n\
         2025-02-01,5,Food,,{}\n\
         2025-02-02,6,Food,{},You\n\
         2025-02-03,7,Food,Tea,You\n",
        "U".repeat(MAX_USER_NAME_LENGTH + 1),
        "d".repeat(MAX_DESCRIPTION_LENGTH + 1),
    );
    let result = preview(&db, &text).await;
    assert_eq!(result.summary.valid_count, 1);
    assert_eq!(result.summary.error_count, 2);
    assert!(result.new_users.is_empty());

    let outcome = commit_import(&db, confirm_payload(&result)).await.unwrap();

    assert_eq!(outcome.created_count, result.valid_rows.len());
    assert!(outcome.skipped_rows.is_empty());
}

#[tokio::test]
async fn non_ascii_names_match_regardless_of_case() {
    let (db, _temp_dir) = setup_seeded_environment().await;
    let epicerie = insert_category(&db, "Épicerie", DEFAULT_COLOR, false).await.unwrap();
    let text = "date,amount,category,description,user
2025-02-01,9,ÉPICERIE,Pain,Émile
2025-02-02,4,épicerie,Lait,ÉMILE
";
    let result = preview(&db, text).await;
    assert_eq!(result.summary.valid_count, 2);
    assert_eq!(result.new_users, vec!["Émile".to_string()]);

    let outcome = commit_import(&db, confirm_payload(&result)).await.unwrap();

    assert_eq!(outcome.created_count, 2);
    let expenses = query_expenses(&db, &ExpenseFilter::default()).await.unwrap();
    assert!(expenses.iter().all(|e| e.category_id == epicerie.id));
    assert!(expenses.iter().all(|e| e.user.name == "Émile"));
    assert_eq!(fetch_users(&db, 0, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn export_then_import_round_trips() {
    let (source, _source_dir) = setup_seeded_environment().await;
    let text = "date,amount,category,description,user
2025-03-01,19.99,Food,\"Pizza, large\",Alice
2025-03-02,120,Travel,Flight,bob
2025-02-27,3.5,Other,,Alice
";
    let result = preview(&source, text).await;
    commit_import(&source, confirm_payload(&result)).await.unwrap();
    let seeded = query_expenses(&source, &ExpenseFilter::default()).await.unwrap();
    let exported = expenses_to_csv(&seeded).unwrap();

    let (target, _target_dir) = setup_seeded_environment().await;
    let reimport = preview(&target, &exported).await;
    assert_eq!(reimport.summary.error_count, 0);
    commit_import(&target, confirm_payload(&reimport)).await.unwrap();
    let copied = query_expenses(&target, &ExpenseFilter::default()).await.unwrap();

    assert_eq!(copied.len(), seeded.len());
    let source_total: f64 = seeded.iter().map(|e| e.amount).sum();
    let copied_total: f64 = copied.iter().map(|e| e.amount).sum();
    assert!((source_total - copied_total).abs() < 1e-9);
    for (before, after) in seeded.iter().zip(copied.iter()) {
        assert_eq!(before.date, after.date);
        assert_eq!(before.description, after.description);
        assert_eq!(before.user.name, after.user.name);
        assert_eq!(before.category.name, after.category.name);
    }
}
