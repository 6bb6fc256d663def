use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::Value;
use uuid::Uuid;

use crate::categories::{extract_category_from_row, fetch_category};
use crate::constants::*;
use crate::database::Db;
use crate::error::AppError;
use crate::models::{
    CreateExpensePayload, Expense, ExpenseFilter, GetExpensesQuery, MessageResponse,
    UpdateExpensePayload,
};
use crate::users::{extract_user_from_row, fetch_user};
use crate::utils::{
    format_date, now_timestamp, parse_date, validate_amount, validate_limit, validate_offset,
};

const EXPENSE_SELECT: &str = "SELECT e.id, e.amount, e.description, e.date, e.user_id, e.category_id, e.created_at, e.updated_at, \
     u.id, u.name, u.color, u.created_at, \
     c.id, c.name, c.color, c.is_default, c.created_at \
     FROM expenses e \
     JOIN users u ON u.id = e.user_id \
     JOIN categories c ON c.id = e.category_id";

const EXPENSE_ORDER: &str = "ORDER BY e.date DESC, e.created_at DESC, e.rowid DESC";

pub fn extract_expense_from_row(row: &libsql::Row) -> Result<Expense, AppError> {
    let date: String = row.get(3)?;
    let date = parse_date(&date)
        .ok_or_else(|| AppError::Database(format!("invalid expense date '{date}'")))?;

    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        date,
        user_id: row.get(4)?,
        category_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        user: extract_user_from_row(row, 8)?,
        category: extract_category_from_row(row, 12)?,
    })
}

/// Trims a description, treating blank text as no description.
fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(AppError::BadRequest(
            format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            ),
        )),
        _ => Ok(()),
    }
}

pub async fn validate_expense_references(
    db: &Db,
    user_id: &str,
    category_id: &str,
) -> Result<(), AppError> {
    if fetch_user(db, user_id).await?.is_none() {
        return Err(AppError::BadRequest("User does not exist".to_string()));
    }
    if fetch_category(db, category_id).await?.is_none() {
        return Err(AppError::BadRequest("Category does not exist".to_string()));
    }
    Ok(())
}

/// Selects expenses matching `filter`, newest date first.
///
/// Date bounds are inclusive. Dates are stored as `YYYY-MM-DD` text, so the
/// comparison is done on the formatted strings.
pub async fn query_expenses(db: &Db, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
    let mut conditions = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(user_id) = &filter.user_id {
        conditions.push("e.user_id = ?");
        params.push(user_id.clone().into());
    }
    if let Some(category_id) = &filter.category_id {
        conditions.push("e.category_id = ?");
        params.push(category_id.clone().into());
    }
    if let Some(start_date) = filter.start_date {
        conditions.push("e.date >= ?");
        params.push(format_date(start_date)?.into());
    }
    if let Some(end_date) = filter.end_date {
        conditions.push("e.date <= ?");
        params.push(format_date(end_date)?.into());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    params.push(filter.limit.map(i64::from).unwrap_or(-1).into());
    params.push(i64::from(filter.offset).into());

    let sql = format!("{EXPENSE_SELECT} {where_clause} {EXPENSE_ORDER} LIMIT ? OFFSET ?");
    let conn = db.read().await;
    let mut rows = conn.query(&sql, params).await?;

    let mut expenses = Vec::new();
    while let Some(row) = rows.next().await? {
        expenses.push(extract_expense_from_row(&row)?);
    }
    Ok(expenses)
}

pub async fn fetch_expense(db: &Db, expense_id: &str) -> Result<Option<Expense>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(&format!("{EXPENSE_SELECT} WHERE e.id = ?"), [expense_id])
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_expense_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Validates and stores a new expense, returning it with its user and category.
pub async fn insert_expense(db: &Db, payload: &CreateExpensePayload) -> Result<Expense, AppError> {
    validate_amount(payload.amount)?;
    let description = normalize_description(payload.description.as_deref());
    validate_description(description.as_deref())?;
    validate_expense_references(db, &payload.user_id, &payload.category_id).await?;

    let expense_id = Uuid::new_v4().to_string();
    let params: Vec<Value> = vec![
        expense_id.clone().into(),
        payload.amount.into(),
        description.map(Value::from).unwrap_or(Value::Null),
        format_date(payload.date)?.into(),
        payload.user_id.clone().into(),
        payload.category_id.clone().into(),
        now_timestamp().into(),
    ];

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO expenses (id, amount, description, date, user_id, category_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params,
        )
        .await?;
    }

    fetch_expense(db, &expense_id)
        .await?
        .ok_or(AppError::NotFound("Expense"))
}

pub async fn create_expense(
    State(db): State<Db>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let expense = insert_expense(&db, &payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expenses(
    State(db): State<Db>,
    Query(query): Query<GetExpensesQuery>,
) -> Result<(StatusCode, Json<Vec<Expense>>), AppError> {
    let filter = ExpenseFilter {
        user_id: query.user_id,
        category_id: query.category_id,
        start_date: query.start_date,
        end_date: query.end_date,
        offset: validate_offset(query.skip)?,
        limit: Some(validate_limit(query.limit, DEFAULT_LIST_LIMIT)?),
    };

    let expenses = query_expenses(&db, &filter).await?;
    Ok((StatusCode::OK, Json(expenses)))
}

pub async fn get_expense(
    State(db): State<Db>,
    Path(expense_id): Path<String>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let expense = fetch_expense(&db, &expense_id)
        .await?
        .ok_or(AppError::NotFound("Expense"))?;
    Ok((StatusCode::OK, Json(expense)))
}

pub async fn update_expense(
    State(db): State<Db>,
    Path(expense_id): Path<String>,
    Json(payload): Json<UpdateExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let existing = fetch_expense(&db, &expense_id)
        .await?
        .ok_or(AppError::NotFound("Expense"))?;

    let amount = payload.amount.unwrap_or(existing.amount);
    validate_amount(amount)?;
    let description = match payload.description {
        Some(description) => normalize_description(Some(&description)),
        None => existing.description,
    };
    validate_description(description.as_deref())?;
    let date = payload.date.unwrap_or(existing.date);
    let user_id = payload.user_id.unwrap_or(existing.user_id);
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    validate_expense_references(&db, &user_id, &category_id).await?;

    let params: Vec<Value> = vec![
        amount.into(),
        description.map(Value::from).unwrap_or(Value::Null),
        format_date(date)?.into(),
        user_id.into(),
        category_id.into(),
        now_timestamp().into(),
        expense_id.clone().into(),
    ];

    {
        let conn = db.write().await;
        let updated = conn
            .execute(
                "UPDATE expenses SET amount = ?, description = ?, date = ?, user_id = ?, category_id = ?, updated_at = ? WHERE id = ?",
                params,
            )
            .await?;
        if updated == 0 {
            return Err(AppError::NotFound("Expense"));
        }
    }

    let expense = fetch_expense(&db, &expense_id)
        .await?
        .ok_or(AppError::NotFound("Expense"))?;
    Ok((StatusCode::OK, Json(expense)))
}

pub async fn delete_expense(
    State(db): State<Db>,
    Path(expense_id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let conn = db.write().await;
    let deleted = conn
        .execute("DELETE FROM expenses WHERE id = ?", [expense_id.as_str()])
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Expense"));
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Expense deleted successfully".to_string(),
        }),
    ))
}
