// SPDX-License-Identifier: MIT

//! Deterministic leaderboard ranking.
//!
//! All ordering rules live here so the rest of the engine never sorts
//! scores itself. The challenge score is currently the identity mapping
//! of progress; if challenge types ever need their own scoring function,
//! only `score_for` changes.

use crate::models::{ChallengeParticipant, ParticipantStatus, PerformanceMetric};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Maximum entries in the user/school leaderboard.
pub const USER_LEADERBOARD_SIZE: usize = 20;

/// Score for one challenge participant.
pub fn score_for(participant: &ChallengeParticipant) -> f64 {
    participant.score
}

/// Rank challenge participants: accepted/completed only, descending by
/// score, ties broken by earliest last update (rewards consistency).
pub fn rank_participants(
    mut participants: Vec<ChallengeParticipant>,
) -> Vec<ChallengeParticipant> {
    participants.retain(|p| {
        matches!(
            p.status,
            ParticipantStatus::Accepted | ParticipantStatus::Completed
        )
    });

    participants.sort_by(|a, b| {
        score_for(b)
            .partial_cmp(&score_for(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.last_updated.cmp(&b.last_updated))
    });

    participants
}

/// Score movement between a user's two most recent snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    None,
}

/// One row of the user/school leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct UserStanding {
    pub user_id: String,
    pub display_name: String,
    pub latest_score: u32,
    pub trend: Trend,
}

/// Standing from a user's most recent snapshots (newest first).
///
/// Trend is `None` when fewer than two snapshots exist.
pub fn standing_from_snapshots(
    user_id: &str,
    display_name: &str,
    snapshots: &[PerformanceMetric],
) -> Option<UserStanding> {
    let latest = snapshots.first()?;
    let trend = match snapshots.get(1) {
        Some(previous) => match latest.performance_score.cmp(&previous.performance_score) {
            Ordering::Greater => Trend::Up,
            Ordering::Less => Trend::Down,
            Ordering::Equal => Trend::None,
        },
        None => Trend::None,
    };

    Some(UserStanding {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        latest_score: latest.performance_score,
        trend,
    })
}

/// Rank user standings descending by latest score, truncated to the top 20.
pub fn rank_standings(mut standings: Vec<UserStanding>) -> Vec<UserStanding> {
    standings.sort_by(|a, b| b.latest_score.cmp(&a.latest_score));
    standings.truncate(USER_LEADERBOARD_SIZE);
    standings
}
