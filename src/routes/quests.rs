// SPDX-License-Identifier: MIT

//! Quest rotation, completion and history routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::quests::{AssignedQuest, CompletedQuest, QuestCompletion};
use crate::services::QuestService;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use std::sync::Arc;

/// Quest routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quests/daily", post(assign_daily_quests))
        .route("/api/quests/{quest_id}/complete", post(complete_quest))
        .route("/api/quests/completed", get(get_completed_quests))
}

#[derive(Deserialize, Default)]
pub struct CompleteQuestRequest {
    pub notes: Option<String>,
}

/// Complete an assigned quest and award its points.
async fn complete_quest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
    payload: Option<Json<CompleteQuestRequest>>,
) -> Result<Json<QuestCompletion>> {
    let notes = payload.and_then(|Json(p)| p.notes);

    let completion = QuestService::new(state.db.clone())
        .complete_quest(&user.user_id, &quest_id, notes)
        .await?;

    Ok(Json(completion))
}

/// Assign a fresh daily rotation, expiring the previous one.
async fn assign_daily_quests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AssignedQuest>>> {
    // StdRng is Send; the thread-local rng cannot be held across awaits.
    let mut rng = StdRng::from_entropy();
    let assigned = QuestService::new(state.db.clone())
        .assign_daily_quests(&user.user_id, &mut rng)
        .await?;

    Ok(Json(assigned))
}

/// Completed quests, newest first.
async fn get_completed_quests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CompletedQuest>>> {
    let completed = QuestService::new(state.db.clone())
        .get_completed_quests(&user.user_id)
        .await?;

    Ok(Json(completed))
}
