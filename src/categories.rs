use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::constants::*;
use crate::database::Db;
use crate::error::AppError;
use crate::models::{
    Category, CreateCategoryPayload, ListQuery, MessageResponse, UpdateCategoryPayload,
};
use crate::utils::{
    name_key, now_timestamp, validate_color, validate_limit, validate_offset,
    validate_string_length,
};

const CATEGORY_COLUMNS: &str = "id, name, color, is_default, created_at";

pub fn validate_category_name(name: &str) -> Result<(), AppError> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

fn duplicate_name_error() -> AppError {
    AppError::Conflict("Category name already exists (case-insensitive)".to_string())
}

fn map_unique_violation(error: libsql::Error) -> AppError {
    if error.to_string().contains("UNIQUE constraint failed") {
        duplicate_name_error()
    } else {
        error.into()
    }
}

/// Reads a category from five consecutive columns starting at `start`.
pub fn extract_category_from_row(row: &libsql::Row, start: i32) -> Result<Category, AppError> {
    let is_default: i64 = row.get(start + 3)?;
    Ok(Category {
        id: row.get(start)?,
        name: row.get(start + 1)?,
        color: row.get(start + 2)?,
        is_default: is_default != 0,
        created_at: row.get(start + 4)?,
    })
}

pub async fn insert_category(
    db: &Db,
    name: &str,
    color: &str,
    is_default: bool,
) -> Result<Category, AppError> {
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        color: color.to_string(),
        is_default,
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO categories (id, name, name_key, color, is_default, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        (
            category.id.as_str(),
            category.name.as_str(),
            name_key(&category.name),
            category.color.as_str(),
            i64::from(category.is_default),
            category.created_at,
        ),
    )
    .await
    .map_err(map_unique_violation)?;

    Ok(category)
}

pub async fn fetch_categories(
    db: &Db,
    offset: u32,
    limit: Option<u32>,
) -> Result<Vec<Category>, AppError> {
    let conn = db.read().await;
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut rows = conn
        .query(
            &format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?"
            ),
            (limit, i64::from(offset)),
        )
        .await?;

    let mut categories = Vec::new();
    while let Some(row) = rows.next().await? {
        categories.push(extract_category_from_row(&row, 0)?);
    }
    Ok(categories)
}

pub async fn fetch_category(db: &Db, category_id: &str) -> Result<Option<Category>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"),
            [category_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_category_from_row(&row, 0)?)),
        None => Ok(None),
    }
}

/// Finds the category named `name`, ignoring case (Unicode-aware) and surrounding whitespace.
pub async fn find_category_by_name(db: &Db, name: &str) -> Result<Option<Category>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name_key = ?"),
            [name_key(name)],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_category_from_row(&row, 0)?)),
        None => Ok(None),
    }
}

pub async fn validate_category_not_in_use(db: &Db, category_id: &str) -> Result<(), AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ?",
            [category_id],
        )
        .await?;

    let count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    if count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete category: it has associated expenses".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_category(
    State(db): State<Db>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    // Input validation and sanitization
    validate_category_name(&payload.name)?;
    let color = payload.color.as_deref().unwrap_or(DEFAULT_COLOR);
    validate_color(color)?;

    if find_category_by_name(&db, &payload.name).await?.is_some() {
        return Err(duplicate_name_error());
    }

    let category = insert_category(
        &db,
        &payload.name,
        color,
        payload.is_default.unwrap_or(false),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<Vec<Category>>), AppError> {
    let limit = validate_limit(query.limit, DEFAULT_LIST_LIMIT)?;
    let offset = validate_offset(query.skip)?;

    let categories = fetch_categories(&db, offset, Some(limit)).await?;
    Ok((StatusCode::OK, Json(categories)))
}

pub async fn get_category(
    State(db): State<Db>,
    Path(category_id): Path<String>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = fetch_category(&db, &category_id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    Ok((StatusCode::OK, Json(category)))
}

pub async fn update_category(
    State(db): State<Db>,
    Path(category_id): Path<String>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let mut category = fetch_category(&db, &category_id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    if let Some(name) = payload.name {
        validate_category_name(&name)?;
        if let Some(existing) = find_category_by_name(&db, &name).await? {
            if existing.id != category.id {
                return Err(duplicate_name_error());
            }
        }
        category.name = name.trim().to_string();
    }
    if let Some(color) = payload.color {
        validate_color(&color)?;
        category.color = color;
    }
    if let Some(is_default) = payload.is_default {
        category.is_default = is_default;
    }

    let conn = db.write().await;
    let updated = conn
        .execute(
            "UPDATE categories SET name = ?, name_key = ?, color = ?, is_default = ? WHERE id = ?",
            (
                category.name.as_str(),
                name_key(&category.name),
                category.color.as_str(),
                i64::from(category.is_default),
                category.id.as_str(),
            ),
        )
        .await
        .map_err(map_unique_violation)?;
    if updated == 0 {
        return Err(AppError::NotFound("Category"));
    }

    Ok((StatusCode::OK, Json(category)))
}

pub async fn delete_category(
    State(db): State<Db>,
    Path(category_id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if fetch_category(&db, &category_id).await?.is_none() {
        return Err(AppError::NotFound("Category"));
    }
    if let Err(error) = validate_category_not_in_use(&db, &category_id).await {
        tracing::warn!(%category_id, "Refusing to delete category with expenses");
        return Err(error);
    }

    let conn = db.write().await;
    conn.execute(
        "DELETE FROM categories WHERE id = ?",
        [category_id.as_str()],
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Category deleted successfully".to_string(),
        }),
    ))
}
