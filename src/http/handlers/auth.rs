use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::http::types::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let req: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        if e.is_syntax() || e.is_eof() {
            AppError::InvalidJson
        } else {
            AppError::Validation("username and password are required".to_string())
        }
    })?;

    if !state.auth.verify(&req.username, &req.password) {
        tracing::info!(username = %req.username, "login rejected");
        return Ok(Json(json!({
            "success": false,
            "message": "Invalid credentials",
        }))
        .into_response());
    }

    let token = state.sessions.issue(&req.username);
    tracing::info!(username = %req.username, "login accepted");
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": token })),
    )
        .into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_token(&headers) {
        if state.sessions.revoke(&token) {
            tracing::info!("session revoked");
        }
    }
    let clear = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    ([(SET_COOKIE, clear)], Redirect::to("/login")).into_response()
}

/// Gate for data routes when sessions are required.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.require_session {
        return next.run(req).await;
    }
    let live = request_token(req.headers())
        .and_then(|token| state.sessions.validate(&token))
        .is_some();
    if !live {
        return AppError::Unauthorized.into_response();
    }
    next.run(req).await
}

fn request_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}
