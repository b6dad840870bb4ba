// SPDX-License-Identifier: MIT

//! Performance metric routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::PerformanceMetric;
use crate::services::leaderboard::UserStanding;
use crate::services::PerformanceService;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Performance routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/performance/compute", post(compute_metrics))
        .route("/api/performance/leaderboard", get(get_leaderboard))
}

/// Compute today's performance snapshot from recent journal entries.
async fn compute_metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PerformanceMetric>> {
    let metric = PerformanceService::new(state.db.clone())
        .compute_metrics(&user.user_id)
        .await?;
    Ok(Json(metric))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    /// Scope to one school
    school_id: Option<String>,
}

/// Top-20 user leaderboard by latest performance score.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<Vec<UserStanding>>> {
    let standings = PerformanceService::new(state.db.clone())
        .get_leaderboard(params.school_id.as_deref())
        .await?;
    Ok(Json(standings))
}
