// SPDX-License-Identifier: MIT

//! Challenge, participant, progress and milestone models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of challenge types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    StepCompetition,
    Workout,
    Habit,
    Skill,
    TeamBuilding,
}

impl FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step_competition" => Ok(Self::StepCompetition),
            "workout" => Ok(Self::Workout),
            "habit" => Ok(Self::Habit),
            "skill" => Ok(Self::Skill),
            "team_building" => Ok(Self::TeamBuilding),
            other => Err(format!("Unknown challenge type: {}", other)),
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StepCompetition => "step_competition",
            Self::Workout => "workout",
            Self::Habit => "habit",
            Self::Skill => "skill",
            Self::TeamBuilding => "team_building",
        };
        f.write_str(s)
    }
}

/// Stored challenge record.
///
/// Immutable after creation except `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge ID (uuid, also the document ID)
    pub id: String,
    /// Owning team
    pub team_id: String,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub duration_days: u32,
    /// User who created the challenge
    pub created_by: String,
    /// Start date (ISO 8601)
    pub start_date: String,
    /// End date = start + duration (ISO 8601)
    pub end_date: String,
    pub is_active: bool,
}

/// Participant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Invited,
    Accepted,
    Completed,
}

/// A user's membership and progress record within one challenge.
///
/// Document ID: `{challenge_id}_{user_id}`. The store enforces the
/// one-row-per-(challenge, user) invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeParticipant {
    pub challenge_id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub progress: f64,
    /// Currently the identity mapping of `progress`; ranking goes
    /// through the leaderboard module so this can diverge later.
    pub score: f64,
    /// When the user joined or was invited (ISO 8601)
    pub joined_at: String,
    /// Last progress update (ISO 8601)
    pub last_updated: String,
}

impl ChallengeParticipant {
    /// Natural document ID for a participant row.
    pub fn doc_id(challenge_id: &str, user_id: &str) -> String {
        format!("{}_{}", challenge_id, user_id)
    }
}

/// Append-only progress audit row. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Entry ID (uuid, also the document ID)
    pub id: String,
    pub challenge_id: String,
    pub user_id: String,
    pub progress: f64,
    pub notes: Option<String>,
    /// When the update was recorded (ISO 8601)
    pub timestamp: String,
}

/// A threshold on a challenge's progress metric.
///
/// `achieved_at`/`achieved_by` are both null or both set exactly once;
/// once set they never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeMilestone {
    /// Milestone ID (uuid, also the document ID)
    pub id: String,
    pub challenge_id: String,
    pub title: String,
    pub target_value: f64,
    pub description: Option<String>,
    pub achieved_at: Option<String>,
    pub achieved_by: Option<String>,
}

impl ChallengeMilestone {
    pub fn is_achieved(&self) -> bool {
        self.achieved_at.is_some()
    }
}

/// Milestones a progress value qualifies for, unachieved only,
/// ascending by target.
///
/// This is the pre-filter; the actual claim is a conditional write and
/// may still lose to a concurrent update.
pub fn eligible_milestones(
    milestones: &[ChallengeMilestone],
    progress: f64,
) -> Vec<&ChallengeMilestone> {
    let mut eligible: Vec<&ChallengeMilestone> = milestones
        .iter()
        .filter(|m| !m.is_achieved() && m.target_value <= progress)
        .collect();
    eligible.sort_by(|a, b| {
        a.target_value
            .partial_cmp(&b.target_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    eligible
}
