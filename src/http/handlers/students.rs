use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use super::{parse_id, with_conn};
use crate::error::Result;
use crate::filter::{self, StudentFilter};
use crate::http::types::AppState;
use crate::students::{self, StudentInput, StudentRecord};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StudentRecord>>> {
    let rows = with_conn(&state, students::list_all).await?;
    Ok(Json(rows))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<StudentRecord>> {
    let id = parse_id(&raw_id)?;
    let row = with_conn(&state, move |conn| students::get(conn, id)).await?;
    Ok(Json(row))
}

pub async fn create(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let input = StudentInput::from_json(&body)?;
    let id = with_conn(&state, move |conn| students::create(conn, &input)).await?;
    Ok(Json(json!({
        "message": "Student added successfully!",
        "StudentID": id,
    })))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let id = parse_id(&raw_id)?;
    let input = StudentInput::from_json(&body)?;
    with_conn(&state, move |conn| students::update(conn, id, &input)).await?;
    Ok(Json(json!({ "message": "Student updated successfully!" })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&raw_id)?;
    with_conn(&state, move |conn| students::delete(conn, id)).await?;
    Ok(Json(json!({ "message": "Student deleted successfully!" })))
}

pub async fn filter(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<StudentRecord>>> {
    let params = StudentFilter::from_pairs(pairs);
    let rows = with_conn(&state, move |conn| filter::filter(conn, &params)).await?;
    Ok(Json(rows))
}
