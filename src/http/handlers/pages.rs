use axum::response::{Html, Redirect};

const LOGIN_PAGE: &str = include_str!("../../../pages/login.html");
const DASHBOARD_PAGE: &str = include_str!("../../../pages/dashboard.html");
const STUDENTS_PAGE: &str = include_str!("../../../pages/students.html");

pub async fn home() -> Redirect {
    Redirect::to("/login")
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

pub async fn students_page() -> Html<&'static str> {
    Html(STUDENTS_PAGE)
}
