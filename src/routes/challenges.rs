// SPDX-License-Identifier: MIT

//! Challenge lifecycle routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, ChallengeMilestone, ChallengeParticipant, ProgressEntry};
use crate::services::ChallengeService;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Challenge routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/teams/{team_id}/challenges", post(create_challenge))
        .route("/api/challenges/{challenge_id}/join", post(join_challenge))
        .route(
            "/api/teams/{team_id}/challenges/{challenge_id}/progress",
            post(update_progress),
        )
        .route(
            "/api/challenges/{challenge_id}/progress",
            get(get_progress_history),
        )
        .route(
            "/api/challenges/{challenge_id}/leaderboard",
            get(get_leaderboard),
        )
        .route(
            "/api/challenges/{challenge_id}/milestones",
            post(create_milestone).get(get_milestones),
        )
}

fn service(state: &AppState) -> ChallengeService {
    ChallengeService::new(
        state.db.clone(),
        state.notifier.clone(),
        state.config.dispatcher_url.clone(),
    )
}

// ─── Challenge Creation & Joining ────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    /// One of: step_competition, workout, habit, skill, team_building
    pub challenge_type: String,
    #[validate(range(min = 1, max = 365))]
    pub duration_days: u32,
    pub participant_user_ids: Vec<String>,
}

/// Create a challenge and invite participants.
async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Json(payload): Json<CreateChallengeRequest>,
) -> Result<Json<Challenge>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Closed enum resolved once at the boundary
    let challenge_type = payload
        .challenge_type
        .parse()
        .map_err(AppError::Validation)?;

    let challenge = service(&state)
        .create_challenge(crate::services::challenges::CreateChallengeInput {
            team_id,
            title: payload.title,
            description: payload.description,
            challenge_type,
            duration_days: payload.duration_days,
            created_by: user.user_id,
            participant_user_ids: payload.participant_user_ids,
        })
        .await?;

    Ok(Json(challenge))
}

/// Join a challenge as the authenticated user.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengeParticipant>> {
    let participant = service(&state)
        .join_challenge(&challenge_id, &user.user_id)
        .await?;
    Ok(Json(participant))
}

// ─── Progress ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UpdateProgressRequest {
    pub progress: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ProgressUpdateResponse {
    pub participant: ChallengeParticipant,
    pub entry: ProgressEntry,
    pub achieved_milestones: Vec<ChallengeMilestone>,
}

/// Record a progress update for the authenticated user.
async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((team_id, challenge_id)): Path<(String, String)>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<Json<ProgressUpdateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if !payload.progress.is_finite() || payload.progress < 0.0 {
        return Err(AppError::Validation(
            "Progress must be a non-negative number".to_string(),
        ));
    }

    let update = service(&state)
        .update_progress(
            &team_id,
            &challenge_id,
            &user.user_id,
            payload.progress,
            payload.notes,
        )
        .await?;

    Ok(Json(ProgressUpdateResponse {
        participant: update.participant,
        entry: update.entry,
        achieved_milestones: update.achieved_milestones,
    }))
}

#[derive(Deserialize)]
struct ProgressHistoryQuery {
    /// Filter by user
    user_id: Option<String>,
}

/// Progress history for a challenge, newest first.
async fn get_progress_history(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
    Query(params): Query<ProgressHistoryQuery>,
) -> Result<Json<Vec<ProgressEntry>>> {
    let entries = service(&state)
        .get_progress_history(&challenge_id, params.user_id.as_deref())
        .await?;
    Ok(Json(entries))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub score: f64,
    pub progress: f64,
    pub last_updated: String,
}

/// Ranked participants for a challenge.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let ranked = service(&state).get_leaderboard(&challenge_id).await?;

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: p.user_id,
            score: p.score,
            progress: p.progress,
            last_updated: p.last_updated,
        })
        .collect();

    Ok(Json(entries))
}

// ─── Milestones ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateMilestoneRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub target_value: f64,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Create a milestone on a challenge.
async fn create_milestone(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
    Json(payload): Json<CreateMilestoneRequest>,
) -> Result<Json<ChallengeMilestone>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let milestone = service(&state)
        .create_milestone(
            &challenge_id,
            &payload.title,
            payload.target_value,
            payload.description,
        )
        .await?;

    Ok(Json(milestone))
}

/// All milestones for a challenge, ascending by target.
async fn get_milestones(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Vec<ChallengeMilestone>>> {
    let milestones = service(&state).get_milestones(&challenge_id).await?;
    Ok(Json(milestones))
}
