use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::constants::*;
use crate::database::Db;
use crate::error::AppError;
use crate::models::{CreateUserPayload, ListQuery, MessageResponse, UpdateUserPayload, User};
use crate::utils::{
    name_key, now_timestamp, validate_color, validate_limit, validate_offset,
    validate_string_length,
};

const USER_COLUMNS: &str = "id, name, color, created_at";

pub fn validate_user_name(name: &str) -> Result<(), AppError> {
    validate_string_length(name, "User name", MAX_USER_NAME_LENGTH)
}

/// Reads a user from four consecutive columns starting at `start`.
pub fn extract_user_from_row(row: &libsql::Row, start: i32) -> Result<User, AppError> {
    Ok(User {
        id: row.get(start)?,
        name: row.get(start + 1)?,
        color: row.get(start + 2)?,
        created_at: row.get(start + 3)?,
    })
}

pub async fn insert_user(db: &Db, name: &str, color: &str) -> Result<User, AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        color: color.to_string(),
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, name_key, color, created_at) VALUES (?, ?, ?, ?, ?)",
        (
            user.id.as_str(),
            user.name.as_str(),
            name_key(&user.name),
            user.color.as_str(),
            user.created_at,
        ),
    )
    .await?;

    tracing::debug!(user_id = %user.id, name = %user.name, "Created user");
    Ok(user)
}

/// Lists users in creation order. `limit` of `None` returns every user.
pub async fn fetch_users(db: &Db, offset: u32, limit: Option<u32>) -> Result<Vec<User>, AppError> {
    let conn = db.read().await;
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut rows = conn
        .query(
            &format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?"
            ),
            (limit, i64::from(offset)),
        )
        .await?;

    let mut users = Vec::new();
    while let Some(row) = rows.next().await? {
        users.push(extract_user_from_row(&row, 0)?);
    }
    Ok(users)
}

pub async fn fetch_user(db: &Db, user_id: &str) -> Result<Option<User>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row, 0)?)),
        None => Ok(None),
    }
}

/// Finds the oldest user whose name matches `name`, ignoring case (Unicode-aware) and
/// surrounding whitespace.
pub async fn find_user_by_name(db: &Db, name: &str) -> Result<Option<User>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {USER_COLUMNS} FROM users WHERE name_key = ? ORDER BY created_at ASC, rowid ASC LIMIT 1"
            ),
            [name_key(name)],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row, 0)?)),
        None => Ok(None),
    }
}

pub async fn count_users(db: &Db) -> Result<i64, AppError> {
    let conn = db.read().await;
    let mut rows = conn.query("SELECT COUNT(*) FROM users", ()).await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

pub async fn validate_user_not_in_use(db: &Db, user_id: &str) -> Result<(), AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query("SELECT COUNT(*) FROM expenses WHERE user_id = ?", [user_id])
        .await?;

    let count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    if count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete user: it has associated expenses".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_user(
    State(db): State<Db>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_user_name(&payload.name)?;
    let color = payload.color.as_deref().unwrap_or(DEFAULT_COLOR);
    validate_color(color)?;

    let user = insert_user(&db, &payload.name, color).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<Vec<User>>), AppError> {
    let limit = validate_limit(query.limit, DEFAULT_LIST_LIMIT)?;
    let offset = validate_offset(query.skip)?;

    let users = fetch_users(&db, offset, Some(limit)).await?;
    Ok((StatusCode::OK, Json(users)))
}

pub async fn get_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = fetch_user(&db, &user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn update_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut user = fetch_user(&db, &user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(name) = payload.name {
        validate_user_name(&name)?;
        user.name = name.trim().to_string();
    }
    if let Some(color) = payload.color {
        validate_color(&color)?;
        user.color = color;
    }

    let conn = db.write().await;
    let updated = conn
        .execute(
            "UPDATE users SET name = ?, name_key = ?, color = ? WHERE id = ?",
            (
                user.name.as_str(),
                name_key(&user.name),
                user.color.as_str(),
                user.id.as_str(),
            ),
        )
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound("User"));
    }

    Ok((StatusCode::OK, Json(user)))
}

pub async fn delete_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if fetch_user(&db, &user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    if let Err(error) = validate_user_not_in_use(&db, &user_id).await {
        tracing::warn!(%user_id, "Refusing to delete user with expenses");
        return Err(error);
    }

    let conn = db.write().await;
    conn.execute("DELETE FROM users WHERE id = ?", [user_id.as_str()])
        .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "User deleted successfully".to_string(),
        }),
    ))
}
