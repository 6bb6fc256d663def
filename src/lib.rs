//! Personal expense tracking server.
//!
//! Users record expenses tagged with a category and the person who spent the
//! money. The server provides CRUD endpoints for users, categories and
//! expenses, monthly summaries, and CSV import (preview then confirm) and
//! export, all backed by a local libsql database.

use axum::{
    Json, Router,
    extract::{MatchedPath, Request},
    routing::get,
    routing::post,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod categories;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod expenses;
pub mod export;
pub mod import;
pub mod models;
pub mod summary;
pub mod users;
pub mod utils;

use crate::config::Config;
use crate::constants::{SERVICE_NAME, SERVICE_VERSION};
use crate::database::Db;
use crate::models::{HealthResponse, ServiceInfo};

/// Builds the application router with CORS and request tracing applied.
pub fn build_router(db: Db, config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
        .allow_methods(Any)
        .allow_headers(Any);

    let tracing_layer = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        let method = req.method();
        let uri = req.uri();
        let matched_path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|matched_path| matched_path.as_str());

        tracing::debug_span!("request", %method, %uri, matched_path)
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route(
            "/api/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/categories",
            post(categories::create_category).get(categories::list_categories),
        )
        .route(
            "/api/categories/{category_id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/expenses",
            post(expenses::create_expense).get(expenses::get_expenses),
        )
        .route(
            "/api/expenses/{expense_id}",
            get(expenses::get_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .route(
            "/api/summary/monthly/{year}/{month}",
            get(summary::get_monthly_summary),
        )
        .route(
            "/api/summary/current-month",
            get(summary::get_current_month_summary),
        )
        .route("/api/import/csv/preview", post(import::preview_import))
        .route("/api/import/csv/confirm", post(import::confirm_import))
        .route("/api/export/csv", get(export::export_csv))
        .layer(cors)
        .layer(tracing_layer)
        .with_state(db)
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: format!("{SERVICE_NAME} is running!"),
        version: SERVICE_VERSION.to_string(),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
