//! The application error type and its mapping onto HTTP responses.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::constants::ERR_DATABASE_OPERATION;

/// The errors a request handler may return.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AppError {
    /// The request payload or query failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The referenced resource does not exist. Holds the resource name,
    /// e.g. "User".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request clashes with existing data, e.g. a duplicate category name.
    #[error("{0}")]
    Conflict(String),

    /// The uploaded file could not be read as CSV at all.
    ///
    /// Problems with individual rows are reported in the import preview
    /// instead of through this error.
    #[error("{0}")]
    InvalidCsv(String),

    /// An unexpected error from the record store.
    ///
    /// The detail is logged on the server and never sent to the client.
    #[error("database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidCsv(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<libsql::Error> for AppError {
    fn from(error: libsql::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::Database(detail) => {
                tracing::error!("Database operation failed: {detail}");
                (status, ERR_DATABASE_OPERATION.to_string()).into_response()
            }
            error => (status, error.to_string()).into_response(),
        }
    }
}
