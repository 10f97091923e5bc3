use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body was not parseable JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// Body parsed but a field is missing, mistyped or out of range.
    #[error("{0}")]
    Validation(String),

    #[error("Student not found")]
    NotFound { id: i64 },

    #[error("Unauthorized")]
    Unauthorized,

    /// The database could not be opened.
    #[error("database unavailable: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Query(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidJson => "bad_json",
            AppError::Validation(_) => "bad_params",
            AppError::NotFound { .. } => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Connection(_) => "db_open_failed",
            AppError::Query(_) => "db_query_failed",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::NotFound { id } => tracing::warn!(id, "student not found"),
            _ if status.is_server_error() => {
                tracing::error!(code = self.code(), error = %self, "request failed")
            }
            _ => tracing::debug!(code = self.code(), error = %self, "request rejected"),
        }
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}

/// Maps rusqlite's "cannot open" family onto [`AppError::Connection`].
pub fn classify_db_error(e: rusqlite::Error) -> AppError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if matches!(
                f.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::PermissionDenied
            ) =>
        {
            AppError::Connection(e)
        }
        _ => AppError::Query(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_message_is_stable() {
        let e = AppError::InvalidJson;
        assert_eq!(e.to_string(), "Invalid JSON");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.code(), "bad_json");
    }

    #[test]
    fn not_found_maps_to_404() {
        let e = AppError::NotFound { id: 7 };
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "Student not found");
    }

    #[test]
    fn query_errors_are_server_errors() {
        let e = classify_db_error(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(e.code(), "db_query_failed");
        assert!(e.status().is_server_error());
    }
}
