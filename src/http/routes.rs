use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{auth, core, pages, students};
use super::types::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let data = Router::new()
        .route("/api/students", get(students::list).post(students::create))
        .route(
            "/api/students/:id",
            get(students::get_one)
                .put(students::update)
                .delete(students::delete),
        )
        .route("/api/filter", get(students::filter))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/students-page", get(pages::students_page))
        .route("/logout", get(auth::logout))
        .route("/api/login", post(auth::login))
        .route("/health", get(core::health))
        .merge(data)
        .fallback(core::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
