use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::internal;
use crate::{
    error::OnboardingError,
    onboarding::{Step, WizardView},
    profile::ProfileDraft,
    state::AppState,
};

pub fn onboarding_routes() -> Router<AppState> {
    Router::new()
        .route("/onboarding", get(get_onboarding))
        .route("/onboarding/draft", patch(update_draft))
        .route("/onboarding/next", post(next_step))
        .route("/onboarding/back", post(previous_step))
}

#[instrument(skip(state))]
pub async fn get_onboarding(State(state): State<AppState>) -> Json<WizardView> {
    Json(state.wizard.lock().await.view())
}

#[instrument(skip(state, patch))]
pub async fn update_draft(
    State(state): State<AppState>,
    Json(patch): Json<ProfileDraft>,
) -> Result<Json<WizardView>, (StatusCode, String)> {
    let mut wizard = state.wizard.lock().await;
    if !wizard.update(patch) {
        return Err((StatusCode::CONFLICT, "Onboarding already complete".into()));
    }
    Ok(Json(wizard.view()))
}

#[instrument(skip(state))]
pub async fn next_step(
    State(state): State<AppState>,
) -> Result<Json<WizardView>, (StatusCode, String)> {
    let mut wizard = state.wizard.lock().await;
    match wizard.advance(&state.session).await {
        Ok(Step::Complete) => {
            info!("onboarding finished");
            Ok(Json(wizard.view()))
        }
        Ok(_) => Ok(Json(wizard.view())),
        Err(OnboardingError::Incomplete(e)) => {
            warn!(step = ?e.step, missing = ?e.missing, "step incomplete");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(OnboardingError::AlreadyComplete) => {
            Err((StatusCode::CONFLICT, "Onboarding already complete".into()))
        }
        Err(e @ OnboardingError::Persist(_)) => {
            error!(error = %e, "onboarding persist failed");
            Err(internal(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn previous_step(State(state): State<AppState>) -> Json<WizardView> {
    let mut wizard = state.wizard.lock().await;
    wizard.back();
    Json(wizard.view())
}
