use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateUserPayload {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub is_default: bool,
    pub created_at: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateCategoryPayload {
    pub name: String,
    pub color: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateCategoryPayload {
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_default: Option<bool>,
}

/// An expense together with the user and category it references.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub description: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub user_id: String,
    pub category_id: String,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub user: User,
    pub category: Category,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateExpensePayload {
    pub amount: f64,
    pub description: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub user_id: String,
    pub category_id: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateExpensePayload {
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub user_id: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GetExpensesQuery {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated filter applied by the record store when selecting expenses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub offset: u32,
    pub limit: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// One CSV row keyed by header name.
pub type RawRow = BTreeMap<String, String>;

/// A CSV row that passed validation and is ready to be committed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportRow {
    #[serde(default)]
    pub row: usize,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub user: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportErrorRow {
    pub row: usize,
    pub data: RawRow,
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub valid_count: usize,
    pub error_count: usize,
    pub new_user_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImportPreview {
    pub valid_rows: Vec<ImportRow>,
    pub error_rows: Vec<ImportErrorRow>,
    pub new_users: Vec<String>,
    pub summary: ImportSummary,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ConfirmImportPayload {
    #[serde(default)]
    pub valid_rows: Vec<ImportRow>,
    #[serde(default)]
    pub new_users: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub message: String,
    pub created_count: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ExportQuery {
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub user_id: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExportResponse {
    pub csv_content: String,
    pub filename: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category_id: String,
    pub category_name: String,
    pub category_color: String,
    pub total_amount: f64,
    pub expense_count: usize,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user_id: String,
    pub user_name: String,
    pub user_color: String,
    pub total_amount: f64,
    pub expense_count: usize,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u8,
    pub total_amount: f64,
    pub expense_count: usize,
    pub daily_average: f64,
    pub categories: Vec<CategorySummary>,
    pub users: Vec<UserSummary>,
}
