// SPDX-License-Identifier: MIT

//! Peer recognition and reaction routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Recognition, RecognitionInteraction};
use crate::services::recognition::RecognitionLimits;
use crate::services::RecognitionService;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Recognition routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/teams/{team_id}/recognitions", post(give_recognition))
        .route("/api/recognitions/limits", get(get_limits))
        .route(
            "/api/recognitions/{recognition_id}/interactions",
            post(create_interaction),
        )
        .route(
            "/api/recognitions/{recognition_id}/interactions/{interaction_type}",
            delete(remove_interaction),
        )
}

fn service(state: &AppState) -> RecognitionService {
    RecognitionService::new(
        state.db.clone(),
        state.notifier.clone(),
        state.config.dispatcher_url.clone(),
    )
}

#[derive(Deserialize, Validate)]
pub struct GiveRecognitionRequest {
    #[validate(length(min = 1))]
    pub to_user_id: String,
    /// One of: clap, fire, heart, flex, zap, trophy
    pub recognition_type: String,
    #[validate(length(max = 280))]
    pub message: Option<String>,
}

/// Give a recognition, counted against the sender's daily quota.
async fn give_recognition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Json(payload): Json<GiveRecognitionRequest>,
) -> Result<Json<Recognition>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let recognition_type = payload
        .recognition_type
        .parse()
        .map_err(AppError::Validation)?;

    let recognition = service(&state)
        .give_recognition(
            &team_id,
            &user.user_id,
            &payload.to_user_id,
            recognition_type,
            payload.message,
        )
        .await?;

    Ok(Json(recognition))
}

/// Today's per-type counters for the authenticated user.
async fn get_limits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecognitionLimits>> {
    let limits = service(&state).get_limits(&user.user_id).await?;
    Ok(Json(limits))
}

#[derive(Deserialize)]
pub struct CreateInteractionRequest {
    /// One of: like, celebrate, support
    pub interaction_type: String,
}

/// React to a recognition.
async fn create_interaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(recognition_id): Path<String>,
    Json(payload): Json<CreateInteractionRequest>,
) -> Result<Json<RecognitionInteraction>> {
    let interaction_type = payload
        .interaction_type
        .parse()
        .map_err(AppError::Validation)?;

    let interaction = service(&state)
        .create_interaction(&recognition_id, &user.user_id, interaction_type)
        .await?;

    Ok(Json(interaction))
}

/// Remove a reaction.
async fn remove_interaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((recognition_id, interaction_type)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    let interaction_type = interaction_type.parse().map_err(AppError::Validation)?;

    service(&state)
        .remove_interaction(&recognition_id, &user.user_id, interaction_type)
        .await?;

    Ok(Json(serde_json::json!({ "removed": true })))
}
