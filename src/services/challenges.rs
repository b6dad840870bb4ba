// SPDX-License-Identifier: MIT

//! Challenge lifecycle: creation, invitation, joining, progress updates
//! and milestone achievement.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::challenge::eligible_milestones;
use crate::models::{
    Challenge, ChallengeMilestone, ChallengeParticipant, ChallengeType, ParticipantStatus,
    ProgressEntry,
};
use crate::services::leaderboard::rank_participants;
use crate::services::notifier::{NotificationEvent, NotificationKind, NotifierService};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use std::sync::Arc;

/// Input for challenge creation, already parsed and typed.
#[derive(Debug, Clone)]
pub struct CreateChallengeInput {
    pub team_id: String,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub duration_days: u32,
    pub created_by: String,
    pub participant_user_ids: Vec<String>,
}

/// Result of a progress update, including any milestones the update won.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub participant: ChallengeParticipant,
    pub entry: ProgressEntry,
    pub achieved_milestones: Vec<ChallengeMilestone>,
}

/// Challenge lifecycle manager.
///
/// Composes the store, the milestone engine and the notifier; one
/// instance is built per request from shared state.
pub struct ChallengeService {
    db: FirestoreDb,
    notifier: Arc<NotifierService>,
    dispatcher_url: String,
}

impl ChallengeService {
    pub fn new(db: FirestoreDb, notifier: Arc<NotifierService>, dispatcher_url: String) -> Self {
        Self {
            db,
            notifier,
            dispatcher_url,
        }
    }

    /// Create a challenge with its invited participants.
    ///
    /// The challenge row and every participant row are written in one
    /// transaction; invite notifications go out only after the commit.
    pub async fn create_challenge(&self, input: CreateChallengeInput) -> Result<Challenge> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if input.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        if input.duration_days == 0 {
            return Err(AppError::Validation(
                "Duration must be at least one day".to_string(),
            ));
        }

        let start = chrono::Utc::now();
        let end = start + chrono::Duration::days(i64::from(input.duration_days));
        let now = format_utc_rfc3339(start);

        let challenge = Challenge {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: input.team_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            challenge_type: input.challenge_type,
            duration_days: input.duration_days,
            created_by: input.created_by.clone(),
            start_date: now.clone(),
            end_date: format_utc_rfc3339(end),
            is_active: true,
        };

        let participants: Vec<ChallengeParticipant> = input
            .participant_user_ids
            .iter()
            .map(|user_id| ChallengeParticipant {
                challenge_id: challenge.id.clone(),
                user_id: user_id.clone(),
                status: ParticipantStatus::Invited,
                progress: 0.0,
                score: 0.0,
                joined_at: now.clone(),
                last_updated: now.clone(),
            })
            .collect();

        self.db
            .create_challenge_atomic(&challenge, &participants)
            .await?;

        // Invitees are notified after the commit; the creator is not.
        let events: Vec<NotificationEvent> = input
            .participant_user_ids
            .iter()
            .filter(|user_id| **user_id != input.created_by)
            .map(|user_id| NotificationEvent {
                recipient_user_id: user_id.clone(),
                actor_user_id: input.created_by.clone(),
                kind: NotificationKind::ChallengeInvite,
                message: format!("You were invited to the challenge \"{}\"", challenge.title),
                link: format!("challenge/{}", challenge.id),
            })
            .collect();

        self.notifier
            .queue_events_best_effort(&self.dispatcher_url, events)
            .await;

        Ok(challenge)
    }

    /// Join a challenge as an accepted participant.
    ///
    /// Conflict if a participant row already exists for this user, in
    /// either invited or accepted state.
    pub async fn join_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<ChallengeParticipant> {
        if self.db.get_challenge(challenge_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge_id
            )));
        }

        let now = now_rfc3339();
        let participant = ChallengeParticipant {
            challenge_id: challenge_id.to_string(),
            user_id: user_id.to_string(),
            status: ParticipantStatus::Accepted,
            progress: 0.0,
            score: 0.0,
            joined_at: now.clone(),
            last_updated: now,
        };

        let created = self.db.create_participant_if_absent(&participant).await?;
        if !created {
            return Err(AppError::Conflict(
                "User is already a participant in this challenge".to_string(),
            ));
        }

        Ok(participant)
    }

    /// Record a progress update and sweep milestones.
    ///
    /// The caller-supplied team must own the challenge; a mismatch is an
    /// authorization failure and nothing is written.
    pub async fn update_progress(
        &self,
        team_id: &str,
        challenge_id: &str,
        user_id: &str,
        progress: f64,
        notes: Option<String>,
    ) -> Result<ProgressUpdate> {
        let mut participant = self
            .db
            .get_participant(challenge_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Participant not found for this challenge".to_string())
            })?;

        let challenge = self
            .db
            .get_challenge(challenge_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", challenge_id)))?;

        if challenge.team_id != team_id {
            return Err(AppError::Forbidden(
                "Challenge does not belong to this team".to_string(),
            ));
        }

        let now = now_rfc3339();
        participant.progress = progress;
        participant.score = progress;
        participant.last_updated = now.clone();
        self.db.set_participant(&participant).await?;

        let entry = ProgressEntry {
            id: uuid::Uuid::new_v4().to_string(),
            challenge_id: challenge_id.to_string(),
            user_id: user_id.to_string(),
            progress,
            notes,
            timestamp: now,
        };
        self.db.append_progress_entry(&entry).await?;

        let achieved_milestones = self.sweep_milestones(challenge_id, user_id, progress).await?;

        tracing::debug!(
            challenge_id,
            user_id,
            progress,
            achieved = achieved_milestones.len(),
            "Progress updated"
        );

        Ok(ProgressUpdate {
            participant,
            entry,
            achieved_milestones,
        })
    }

    /// Claim every unachieved milestone this progress value satisfies.
    ///
    /// Each claim is a conditional write; a milestone is reported as
    /// achieved only when our claim actually matched the unachieved row.
    /// Concurrent updaters crossing the same threshold get at most one
    /// winner per milestone.
    async fn sweep_milestones(
        &self,
        challenge_id: &str,
        user_id: &str,
        progress: f64,
    ) -> Result<Vec<ChallengeMilestone>> {
        let milestones = self.db.get_milestones(challenge_id).await?;
        let candidates: Vec<String> = eligible_milestones(&milestones, progress)
            .into_iter()
            .map(|m| m.id.clone())
            .collect();

        let mut achieved = Vec::new();
        for milestone_id in candidates {
            if let Some(won) = self.db.claim_milestone(&milestone_id, user_id).await? {
                tracing::info!(
                    challenge_id,
                    user_id,
                    milestone_id = %won.id,
                    target = won.target_value,
                    "Milestone achieved"
                );
                achieved.push(won);
            }
        }

        Ok(achieved)
    }

    /// Create a milestone on an existing challenge.
    pub async fn create_milestone(
        &self,
        challenge_id: &str,
        title: &str,
        target_value: f64,
        description: Option<String>,
    ) -> Result<ChallengeMilestone> {
        if target_value.is_nan() || target_value <= 0.0 {
            return Err(AppError::Validation(
                "Target value must be greater than zero".to_string(),
            ));
        }
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        if self.db.get_challenge(challenge_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge_id
            )));
        }

        let milestone = ChallengeMilestone {
            id: uuid::Uuid::new_v4().to_string(),
            challenge_id: challenge_id.to_string(),
            title: title.to_string(),
            target_value,
            description,
            achieved_at: None,
            achieved_by: None,
        };

        self.db.set_milestone(&milestone).await?;
        Ok(milestone)
    }

    /// All milestones for a challenge, ascending by target.
    pub async fn get_milestones(&self, challenge_id: &str) -> Result<Vec<ChallengeMilestone>> {
        if self.db.get_challenge(challenge_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge_id
            )));
        }
        self.db.get_milestones(challenge_id).await
    }

    /// Challenge leaderboard: accepted/completed participants ranked.
    pub async fn get_leaderboard(&self, challenge_id: &str) -> Result<Vec<ChallengeParticipant>> {
        let participants = self.db.get_participants(challenge_id).await?;
        Ok(rank_participants(participants))
    }

    /// Progress history, optionally filtered by user, newest first.
    pub async fn get_progress_history(
        &self,
        challenge_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ProgressEntry>> {
        self.db.get_progress_entries(challenge_id, user_id).await
    }
}
