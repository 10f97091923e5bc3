use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use marksd::config::Config;
use marksd::http::{router, AppState};
use serde_json::{json, Value};
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

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.map(|v| v.to_string()).unwrap_or_default()))
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn seed(app: &Router) {
    let rows = [
        ("Alice", "1", "Math"),
        ("Bob", "1", "Science"),
        ("Cara", "2", "Math"),
        ("Dev", "2", "Science"),
        ("Eli", "3", "Math"),
    ];
    for (name, semester, subject) in rows {
        let (status, _) = send(
            app,
            "POST",
            "/api/students",
            Some(json!({
                "Name": name,
                "Semester": semester,
                "Subject": subject,
                "Marks": 50,
                "TotalMarks": 100
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

fn names(rows: &Value) -> Vec<String> {
    rows.as_array()
        .expect("array body")
        .iter()
        .map(|r| r["Name"].as_str().expect("Name").to_string())
        .collect()
}

#[tokio::test]
async fn subject_filter_returns_only_matching_rows() {
    let app = test_app("marksd-filter-subject");
    seed(&app).await;

    let (status, rows) = send(&app, "GET", "/api/filter?subject=Math", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&rows), vec!["Alice", "Cara", "Eli"]);
    for r in rows.as_array().expect("array") {
        assert_eq!(r["Subject"], "Math");
    }
}

#[tokio::test]
async fn both_constraints_are_conjunctive() {
    let app = test_app("marksd-filter-both");
    seed(&app).await;

    let (_, rows) = send(&app, "GET", "/api/filter?subject=Science&semester=2", None).await;
    assert_eq!(names(&rows), vec!["Dev"]);

    let (_, rows) = send(&app, "GET", "/api/filter?semester=1", None).await;
    assert_eq!(names(&rows), vec!["Alice", "Bob"]);

    let (_, rows) = send(&app, "GET", "/api/filter?subject=History", None).await;
    assert!(names(&rows).is_empty());
}

#[tokio::test]
async fn repeated_parameter_uses_first_value() {
    let app = test_app("marksd-filter-repeated");
    seed(&app).await;

    let (status, rows) = send(&app, "GET", "/api/filter?subject=Math&subject=Art", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&rows), vec!["Alice", "Cara", "Eli"]);

    let (status, rows) = send(
        &app,
        "GET",
        "/api/filter?semester=2&subject=Science&semester=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&rows), vec!["Dev"]);
}

#[tokio::test]
async fn no_or_empty_parameters_match_full_listing() {
    let app = test_app("marksd-filter-none");
    seed(&app).await;

    let (_, all) = send(&app, "GET", "/api/students", None).await;
    let (_, unfiltered) = send(&app, "GET", "/api/filter", None).await;
    assert_eq!(unfiltered, all);

    let (_, blank) = send(&app, "GET", "/api/filter?subject=&semester=", None).await;
    assert_eq!(blank, all);
}

#[tokio::test]
async fn filter_value_is_not_sql() {
    let app = test_app("marksd-filter-injection");
    seed(&app).await;

    let (status, rows) = send(
        &app,
        "GET",
        "/api/filter?subject=Math%27%20OR%20%271%27%3D%271",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&rows).is_empty());
}
