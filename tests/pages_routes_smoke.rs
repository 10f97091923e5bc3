use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use marksd::config::Config;
use marksd::http::{router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn test_app(prefix: &str) -> Router {
    let mut config = Config::default();
    config.sql_server = temp_dir(prefix).to_string_lossy().to_string();
    let state = AppState::from_config(&config).expect("build app state");
    router(Arc::new(state))
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(req).await.expect("response")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

fn location(resp: &axum::response::Response) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn root_and_logout_redirect_to_login() {
    let app = test_app("marksd-pages-redirects");
    for uri in ["/", "/logout"] {
        let resp = get(&app, uri).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&resp), Some("/login"), "{uri}");
    }
}

#[tokio::test]
async fn static_pages_render_html() {
    let app = test_app("marksd-pages-html");
    for (uri, marker) in [
        ("/login", "<h1>Login</h1>"),
        ("/dashboard", "<h1>Dashboard</h1>"),
        ("/students-page", "<h1>Students</h1>"),
    ] {
        let resp = get(&app, uri).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert!(content_type.starts_with("text/html"), "{uri}: {content_type}");
        assert!(body_text(resp).await.contains(marker), "{uri}");
    }
}

#[tokio::test]
async fn health_reports_version() {
    let app = test_app("marksd-pages-health");
    let resp = get(&app, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(v["status"], "ok");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_paths_are_json_404() {
    let app = test_app("marksd-pages-404");
    let resp = get(&app, "/nope").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(v["error"], "Not found");
}
