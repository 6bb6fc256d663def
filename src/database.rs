use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::categories::{find_category_by_name, insert_category};
use crate::constants::*;
use crate::users::{count_users, insert_user};

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    name_key    TEXT    NOT NULL,
    color       TEXT    NOT NULL,
    created_at  INTEGER NOT NULL
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    name_key    TEXT    UNIQUE NOT NULL,
    color       TEXT    NOT NULL,
    is_default  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id           TEXT    PRIMARY KEY,
    amount       REAL    NOT NULL,
    description  TEXT,
    date         TEXT    NOT NULL,
    user_id      TEXT    NOT NULL REFERENCES users(id),
    category_id  TEXT    NOT NULL REFERENCES categories(id),
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER
);
"#;

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_users_name_key ON users(name_key);",
    "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);",
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_id ON expenses(user_id);",
    "CREATE INDEX IF NOT EXISTS idx_expenses_category_id ON expenses(category_id);",
];

pub type Db = Arc<RwLock<Connection>>;

/// Opens (creating if needed) the budget database in `data_dir` and ensures the schema exists.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE_NAME);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_EXPENSES_TABLE, ()).await?;
    for statement in CREATE_INDEXES {
        conn.execute(statement, ()).await?;
    }

    Ok(Arc::new(RwLock::new(conn)))
}

/// Seeds the default categories and the placeholder user.
///
/// Safe to call on every start: categories are only created when no category
/// with the same name (ignoring case) exists, and the default user only when
/// there are no users at all.
pub async fn ensure_defaults(db: &Db) -> Result<()> {
    let mut created_categories = 0;
    for (name, color) in DEFAULT_CATEGORIES {
        if find_category_by_name(db, name).await?.is_none() {
            insert_category(db, name, color, true).await?;
            created_categories += 1;
        }
    }

    let created_user = if count_users(db).await? == 0 {
        insert_user(db, DEFAULT_USER_NAME, DEFAULT_COLOR).await?;
        true
    } else {
        false
    };

    tracing::info!(created_categories, created_user, "Default data ensured");
    Ok(())
}
