use axum::http::StatusCode;

pub mod onboarding;
pub mod profile;
pub mod scans;

pub(crate) fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
