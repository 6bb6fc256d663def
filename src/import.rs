//! Two-phase CSV import.
//!
//! The preview phase classifies every row as valid or erroneous and collects
//! user names that do not exist yet, without touching the record store. The
//! confirm phase creates the missing users and one expense per valid row.

use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::categories::{fetch_categories, find_category_by_name};
use crate::constants::*;
use crate::database::Db;
use crate::error::AppError;
use crate::expenses::{insert_expense, validate_description};
use crate::models::{
    Category, ConfirmImportPayload, CreateExpensePayload, ImportErrorRow, ImportPreview,
    ImportResult, ImportRow, ImportSummary, RawRow, SkippedRow, User,
};
use crate::users::{fetch_users, find_user_by_name, insert_user, validate_user_name};
use crate::utils::{name_key, parse_date};

/// Parses an amount, accepting only finite values greater than zero.
fn parse_amount(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

/// Accumulates the preview of an import one row at a time.
pub struct Reconciler {
    known_users: HashSet<String>,
    known_categories: HashSet<String>,
    new_user_keys: HashSet<String>,
    preview: ImportPreview,
}

impl Reconciler {
    pub fn new(users: &[User], categories: &[Category]) -> Self {
        Reconciler {
            known_users: users.iter().map(|u| name_key(&u.name)).collect(),
            known_categories: categories.iter().map(|c| name_key(&c.name)).collect(),
            new_user_keys: HashSet::new(),
            preview: ImportPreview::default(),
        }
    }

    /// Validates one row. `row_number` is 1-based and counts data rows only.
    pub fn add_row(&mut self, row_number: usize, raw: RawRow) {
        match self.reconcile_row(row_number, &raw) {
            Ok(row) => {
                tracing::debug!(row = row_number, "Import row is valid");
                self.preview.valid_rows.push(row);
            }
            Err(error) => self.add_error_row(row_number, raw, error),
        }
    }

    /// Records a row that could not even be read, keeping whatever content was recovered.
    pub fn add_error_row(&mut self, row_number: usize, data: RawRow, error: String) {
        tracing::debug!(row = row_number, %error, "Import row rejected");
        self.preview.error_rows.push(ImportErrorRow {
            row: row_number,
            data,
            error,
        });
    }

    fn reconcile_row(&mut self, row_number: usize, raw: &RawRow) -> Result<ImportRow, String> {
        let [Some(date), Some(amount), Some(category), Some(user)] =
            REQUIRED_IMPORT_COLUMNS.map(|column| raw.get(column))
        else {
            return Err(ERR_MISSING_COLUMNS.to_string());
        };

        let date = parse_date(date).ok_or_else(|| ERR_INVALID_DATE.to_string())?;
        let amount = parse_amount(amount).ok_or_else(|| ERR_INVALID_AMOUNT.to_string())?;

        // Unknown users are collected even when the row later fails on its category.
        let user = user.trim();
        if user.is_empty() {
            return Err(ERR_EMPTY_USER_NAME.to_string());
        }
        validate_user_name(user).map_err(|e| e.to_string())?;
        self.note_user(user);

        let category = category.trim();
        if !self.known_categories.contains(&name_key(category)) {
            return Err(format!("Unknown category: {category}"));
        }

        let description = raw
            .get("description")
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        validate_description(Some(&description)).map_err(|e| e.to_string())?;

        Ok(ImportRow {
            row: row_number,
            date,
            amount,
            category: category.to_string(),
            description,
            user: user.to_string(),
        })
    }

    fn note_user(&mut self, user: &str) {
        let key = name_key(user);
        if !self.known_users.contains(&key) && self.new_user_keys.insert(key) {
            self.preview.new_users.push(user.to_string());
        }
    }

    pub fn finish(mut self) -> ImportPreview {
        self.preview.summary = ImportSummary {
            total_rows: self.preview.valid_rows.len() + self.preview.error_rows.len(),
            valid_count: self.preview.valid_rows.len(),
            error_count: self.preview.error_rows.len(),
            new_user_count: self.preview.new_users.len(),
        };
        self.preview
    }
}

/// Previews already-split rows, numbering them from 1 in input order.
pub fn preview_rows<I>(rows: I, users: &[User], categories: &[Category]) -> ImportPreview
where
    I: IntoIterator<Item = RawRow>,
{
    let mut reconciler = Reconciler::new(users, categories);
    for (index, row) in rows.into_iter().enumerate() {
        reconciler.add_row(index + 1, row);
    }
    reconciler.finish()
}

/// Previews CSV text with a header row.
///
/// Returns `AppError::InvalidCsv` only when the header itself cannot be read;
/// problems with individual records become error rows.
pub fn preview_csv(
    text: &str,
    users: &[User],
    categories: &[Category],
) -> Result<ImportPreview, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidCsv(format!("Could not read the CSV header: {e}")))?
        .clone();

    let mut reconciler = Reconciler::new(users, categories);
    for (index, result) in reader.records().enumerate() {
        let row_number = index + 1;
        match result {
            Ok(record) => {
                let raw: RawRow = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, value)| (header.to_string(), value.to_string()))
                    .collect();
                reconciler.add_row(row_number, raw);
            }
            Err(e) => {
                reconciler.add_error_row(row_number, RawRow::new(), format!("Could not read row: {e}"))
            }
        }
    }

    Ok(reconciler.finish())
}

/// Looks up the id of the user named `name`, caching the result by name key.
async fn resolve_user_id(
    db: &Db,
    cache: &mut HashMap<String, Option<String>>,
    name: &str,
) -> Result<Option<String>, AppError> {
    let key = name_key(name);
    if let Some(id) = cache.get(&key) {
        return Ok(id.clone());
    }
    let id = find_user_by_name(db, name).await?.map(|user| user.id);
    cache.insert(key, id.clone());
    Ok(id)
}

/// Looks up the id of the category named `name`, caching the result by name key.
async fn resolve_category_id(
    db: &Db,
    cache: &mut HashMap<String, Option<String>>,
    name: &str,
) -> Result<Option<String>, AppError> {
    let key = name_key(name);
    if let Some(id) = cache.get(&key) {
        return Ok(id.clone());
    }
    let id = find_category_by_name(db, name).await?.map(|category| category.id);
    cache.insert(key, id.clone());
    Ok(id)
}

/// Creates the new users and one expense per valid row.
///
/// Rows whose user or category cannot be resolved against the current store,
/// or which fail expense validation, are skipped and reported. Rows written
/// before a store failure stay committed.
pub async fn commit_import(
    db: &Db,
    payload: ConfirmImportPayload,
) -> Result<ImportResult, AppError> {
    let mut user_ids: HashMap<String, Option<String>> = HashMap::new();
    let mut category_ids: HashMap<String, Option<String>> = HashMap::new();

    for name in &payload.new_users {
        if name_key(name).is_empty() || resolve_user_id(db, &mut user_ids, name).await?.is_some() {
            continue;
        }
        if let Err(error) = validate_user_name(name) {
            tracing::warn!(%name, %error, "Not creating imported user");
            continue;
        }
        let user = insert_user(db, name, DEFAULT_COLOR).await?;
        user_ids.insert(name_key(name), Some(user.id));
    }

    let mut created_count = 0;
    let mut skipped_rows = Vec::new();
    for row in payload.valid_rows {
        let user_id = resolve_user_id(db, &mut user_ids, &row.user).await?;
        let category_id = resolve_category_id(db, &mut category_ids, &row.category).await?;
        let resolved = match (user_id, category_id) {
            (Some(user_id), Some(category_id)) => Ok((user_id, category_id)),
            (None, _) => Err(format!("Unknown user: {}", row.user.trim())),
            (_, None) => Err(format!("Unknown category: {}", row.category.trim())),
        };

        let result = match resolved {
            Ok((user_id, category_id)) => {
                let expense = CreateExpensePayload {
                    amount: row.amount,
                    description: Some(row.description),
                    date: row.date,
                    user_id,
                    category_id,
                };
                match insert_expense(db, &expense).await {
                    Ok(_) => Ok(()),
                    Err(AppError::BadRequest(reason)) => Err(reason),
                    Err(error) => return Err(error),
                }
            }
            Err(reason) => Err(reason),
        };

        match result {
            Ok(()) => created_count += 1,
            Err(reason) => {
                tracing::warn!(row = row.row, %reason, "Skipping import row");
                skipped_rows.push(SkippedRow {
                    row: row.row,
                    reason,
                });
            }
        }
    }

    tracing::info!(created_count, skipped = skipped_rows.len(), "Import committed");
    Ok(ImportResult {
        message: format!("Successfully imported {} expenses", created_count),
        created_count,
        skipped_rows,
    })
}

pub async fn preview_import(
    State(db): State<Db>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportPreview>), AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidCsv(format!("Could not parse multipart form: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_lowercase();
        if !file_name.ends_with(".csv") {
            return Err(AppError::InvalidCsv("File must be a CSV".to_string()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidCsv(format!("Could not read uploaded file: {e}")))?;
        upload = Some(bytes);
        break;
    }

    let bytes = upload.ok_or_else(|| AppError::InvalidCsv("No CSV file was uploaded".to_string()))?;
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| AppError::InvalidCsv("File must be UTF-8 encoded".to_string()))?;

    let users = fetch_users(&db, 0, None).await?;
    let categories = fetch_categories(&db, 0, None).await?;
    let preview = preview_csv(&text, &users, &categories)?;

    tracing::info!(
        total_rows = preview.summary.total_rows,
        valid = preview.summary.valid_count,
        errors = preview.summary.error_count,
        new_users = preview.summary.new_user_count,
        "Previewed CSV import"
    );
    Ok((StatusCode::OK, Json(preview)))
}

pub async fn confirm_import(
    State(db): State<Db>,
    Json(payload): Json<ConfirmImportPayload>,
) -> Result<(StatusCode, Json<ImportResult>), AppError> {
    let result = commit_import(&db, payload).await?;
    Ok((StatusCode::OK, Json(result)))
}
