use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::internal;
use crate::{
    error::RecognitionError,
    scan::{DashboardSummary, ImageUpload, RecognitionSnapshot, ScanResult},
    state::AppState,
};

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scans", post(create_scan))
        .route("/scans/latest", get(latest_scan))
        .route("/scans/status", get(scan_status))
        .route("/dashboard", get(dashboard))
}

/// POST /scans (multipart)
/// Fields: `file` (the image), optional `user_id`.
#[instrument(skip(state, mp))]
pub async fn create_scan(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<ScanResult>, (StatusCode, String)> {
    let mut image: Option<ImageUpload> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                let mut upload = ImageUpload::new(data, content_type);
                if let Some(name) = file_name {
                    upload = upload.with_file_name(name);
                }
                image = Some(upload);
            }
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                user_id = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let Some(image) = image else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };
    let user_id = user_id.unwrap_or_else(|| state.config.recognizer.default_user_id.clone());

    state
        .session
        .scan(state.recognizer.as_ref(), image, &user_id)
        .await
        .map(Json)
        .map_err(recognition_rejection)
}

#[instrument(skip(state))]
pub async fn latest_scan(
    State(state): State<AppState>,
) -> Result<Json<ScanResult>, (StatusCode, String)> {
    state
        .session
        .latest_scan()
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No scan results".into()))
}

#[instrument(skip(state))]
pub async fn scan_status(State(state): State<AppState>) -> Json<RecognitionSnapshot> {
    Json(state.session.recognition().await)
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, (StatusCode, String)> {
    let Some(result) = state.session.latest_scan().await else {
        return Err((StatusCode::NOT_FOUND, "No scan results".into()));
    };
    let profile = state.session.profile().await;
    Ok(Json(DashboardSummary::build(&result, profile.as_ref())))
}

fn recognition_rejection(e: RecognitionError) -> (StatusCode, String) {
    let status = match &e {
        RecognitionError::Busy => StatusCode::CONFLICT,
        RecognitionError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        RecognitionError::EmptyImage => StatusCode::BAD_REQUEST,
        RecognitionError::Rejected { .. }
        | RecognitionError::Transport(_)
        | RecognitionError::UnexpectedShape(_) => StatusCode::BAD_GATEWAY,
    };
    if status == StatusCode::BAD_GATEWAY {
        warn!(error = %e, "scan failed");
    }
    (status, e.display_message())
}
