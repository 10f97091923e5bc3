pub mod auth;
pub mod core;
pub mod pages;
pub mod students;

use rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::http::types::AppState;

/// Runs `f` on the blocking pool with a leased connection.
pub(crate) async fn with_conn<T, F>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await
    .map_err(|e| AppError::Internal(format!("database task failed: {e}")))?
}

pub(crate) fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("student id must be an integer, got {raw:?}")))
}
