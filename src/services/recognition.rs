// SPDX-License-Identifier: MIT

//! Peer recognition under the daily per-type quota, plus reactions.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::recognition::DAILY_RECOGNITION_LIMIT;
use crate::models::{
    InteractionType, Recognition, RecognitionInteraction, RecognitionQuota, RecognitionType,
};
use crate::services::notifier::{NotificationEvent, NotificationKind, NotifierService};
use crate::time_utils::{now_rfc3339, today_key};
use serde::Serialize;
use std::sync::Arc;

/// Today's per-type usage for one sender.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionLimits {
    pub day: String,
    pub limit_per_type: u32,
    pub claps_used: u32,
    pub fires_used: u32,
    pub hearts_used: u32,
    pub flexes_used: u32,
    pub zaps_used: u32,
    pub trophies_used: u32,
}

impl From<RecognitionQuota> for RecognitionLimits {
    fn from(quota: RecognitionQuota) -> Self {
        Self {
            day: quota.day,
            limit_per_type: DAILY_RECOGNITION_LIMIT,
            claps_used: quota.claps_used,
            fires_used: quota.fires_used,
            hearts_used: quota.hearts_used,
            flexes_used: quota.flexes_used,
            zaps_used: quota.zaps_used,
            trophies_used: quota.trophies_used,
        }
    }
}

/// Recognition quota enforcer.
pub struct RecognitionService {
    db: FirestoreDb,
    notifier: Arc<NotifierService>,
    dispatcher_url: String,
}

impl RecognitionService {
    pub fn new(db: FirestoreDb, notifier: Arc<NotifierService>, dispatcher_url: String) -> Self {
        Self {
            db,
            notifier,
            dispatcher_url,
        }
    }

    /// Give a recognition, counted against the sender's daily quota.
    ///
    /// The recognition row and the counter increment commit together;
    /// QuotaExceeded leaves nothing written. The recipient is notified
    /// after the commit.
    pub async fn give_recognition(
        &self,
        team_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        recognition_type: RecognitionType,
        message: Option<String>,
    ) -> Result<Recognition> {
        if to_user_id.trim().is_empty() {
            return Err(AppError::Validation("Recipient is required".to_string()));
        }

        let day = today_key();
        let recognition = Recognition {
            id: uuid::Uuid::new_v4().to_string(),
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            team_id: team_id.to_string(),
            recognition_type,
            message,
            created_at: now_rfc3339(),
        };

        let quota = self.db.give_recognition_atomic(&recognition, &day).await?;

        tracing::debug!(
            from = from_user_id,
            to = to_user_id,
            recognition_type = %recognition_type,
            used = quota.used(recognition_type),
            "Recognition given"
        );

        let event = NotificationEvent {
            recipient_user_id: to_user_id.to_string(),
            actor_user_id: from_user_id.to_string(),
            kind: NotificationKind::RecognitionReceived,
            message: format!("You received a {}!", recognition_type),
            link: format!("recognition/{}", recognition.id),
        };
        self.notifier
            .queue_events_best_effort(&self.dispatcher_url, vec![event])
            .await;

        Ok(recognition)
    }

    /// Today's six per-type counters for a sender, zero-defaulted.
    pub async fn get_limits(&self, user_id: &str) -> Result<RecognitionLimits> {
        let day = today_key();
        let quota = self
            .db
            .get_recognition_quota(user_id, &day)
            .await?
            .unwrap_or_else(|| RecognitionQuota::new(user_id, &day));
        Ok(quota.into())
    }

    /// React to a recognition. One reaction per (user, type) per
    /// recognition.
    pub async fn create_interaction(
        &self,
        recognition_id: &str,
        user_id: &str,
        interaction_type: InteractionType,
    ) -> Result<RecognitionInteraction> {
        if self.db.get_recognition(recognition_id).await?.is_none() {
            return Err(AppError::NotFound("Recognition not found".to_string()));
        }

        let interaction = RecognitionInteraction {
            recognition_id: recognition_id.to_string(),
            user_id: user_id.to_string(),
            interaction_type,
            created_at: now_rfc3339(),
        };

        let created = self.db.create_interaction_if_absent(&interaction).await?;
        if !created {
            return Err(AppError::Conflict(format!(
                "User already has {} interaction for this recognition",
                interaction_type
            )));
        }

        Ok(interaction)
    }

    /// Remove a reaction.
    pub async fn remove_interaction(
        &self,
        recognition_id: &str,
        user_id: &str,
        interaction_type: InteractionType,
    ) -> Result<()> {
        let existing = self
            .db
            .get_interaction(recognition_id, user_id, interaction_type)
            .await?;
        if existing.is_none() {
            return Err(AppError::NotFound("Interaction not found".to_string()));
        }

        self.db
            .delete_interaction(recognition_id, user_id, interaction_type)
            .await
    }
}
