use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, instrument, warn};

use super::internal;
use crate::{
    onboarding::Wizard,
    profile::{BmiCategory, Profile, ProfileDraft},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub bmi: Option<f64>,
    pub bmi_category: BmiCategory,
    pub bmi_label: &'static str,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let bmi_category = profile.bmi_category();
        Self {
            bmi: profile.bmi(),
            bmi_category,
            bmi_label: bmi_category.label(),
            profile,
        }
    }
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile).put(replace_profile).delete(reset_profile),
    )
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    match state.session.profile().await {
        Some(profile) => Ok(Json(profile.into())),
        None => Err((StatusCode::NOT_FOUND, "Profile not found".into())),
    }
}

/// PUT /profile: the body is a full profile; it replaces the stored one.
#[instrument(skip(state, draft))]
pub async fn replace_profile(
    State(state): State<AppState>,
    Json(draft): Json<ProfileDraft>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    if !state.session.is_onboarded().await {
        return Err((StatusCode::CONFLICT, "Onboarding not complete".into()));
    }
    let profile = Profile::try_from(draft).map_err(|e| {
        warn!(missing = ?e.missing, "profile incomplete");
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;
    state.session.save_profile(profile.clone()).await.map_err(|e| {
        error!(error = %e, "save_profile failed");
        internal(e)
    })?;
    Ok(Json(profile.into()))
}

/// DELETE /profile: forget the profile and restart onboarding.
#[instrument(skip(state))]
pub async fn reset_profile(
    State(state): State<AppState>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut wizard = state.wizard.lock().await;
    state.session.reset().await.map_err(|e| {
        error!(error = %e, "reset failed");
        internal(e)
    })?;
    *wizard = Wizard::new();
    Ok(StatusCode::NO_CONTENT)
}
