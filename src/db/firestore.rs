// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Challenges, participants, progress entries, milestones
//! - Recognitions, interactions, daily quota counters
//! - Quest catalog, user quests, point ledger
//! - Performance metrics and journal reference reads
//!
//! All cross-document invariants (participant uniqueness, milestone
//! claims, quota ceilings, point accrual) are enforced inside Firestore
//! transactions rather than application-level read-then-write. Reads in
//! those transactions go through a client clone tagged with the
//! transaction's consistency selector, so the commit conflicts when a
//! concurrent writer touched a read document; contended commits are
//! retried a bounded number of times with fresh reads.

use crate::db::collections;
use crate::error::AppError;
use crate::models::recognition::DAILY_RECOGNITION_LIMIT;
use crate::models::{
    Challenge, ChallengeMilestone, ChallengeParticipant, JournalEntry, PerformanceMetric,
    ProgressEntry, Quest, QuestCategory, Recognition, RecognitionInteraction, RecognitionQuota,
    User, UserQuest, UserStat,
};
use crate::time_utils::now_rfc3339;
use firestore::errors::FirestoreError;
use firestore::FirestoreConsistencySelector;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

// Read-check-write transactions whose commit loses to a concurrent
// writer are retried with fresh reads.
const TXN_MAX_ATTEMPTS: u32 = 3;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Clone of the client whose reads run inside the given transaction.
    ///
    /// Plain fluent reads carry no consistency selector and are invisible
    /// to the commit; the tagged clone registers every read document for
    /// commit-time conflict detection.
    fn transaction_reader(
        &self,
        transaction: &firestore::FirestoreTransaction<'_>,
    ) -> Result<firestore::FirestoreDb, AppError> {
        Ok(self.get_client()?.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        ))
    }

    /// A commit rejected because a concurrent transaction touched one of
    /// our read documents. Safe to retry with fresh reads.
    fn is_commit_contention(err: &FirestoreError) -> bool {
        matches!(err, FirestoreError::DatabaseError(db_err) if db_err.retry_possible)
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// Get a challenge by ID.
    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(challenge_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a challenge together with all its invited participant rows.
    ///
    /// A single transaction: the challenge must never exist without its
    /// participants, even if the process dies mid-create.
    pub async fn create_challenge_atomic(
        &self,
        challenge: &Challenge,
        participants: &[ChallengeParticipant],
    ) -> Result<(), AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.id)
            .object(challenge)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add challenge to transaction: {}", e))
            })?;

        for participant in participants {
            let doc_id =
                ChallengeParticipant::doc_id(&participant.challenge_id, &participant.user_id);
            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::CHALLENGE_PARTICIPANTS)
                .document_id(&doc_id)
                .object(participant)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add participant to transaction: {}",
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            challenge_id = %challenge.id,
            team_id = %challenge.team_id,
            participants = participants.len(),
            "Challenge created atomically"
        );

        Ok(())
    }

    // ─── Participant Operations ──────────────────────────────────

    /// Get one participant row.
    pub async fn get_participant(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<Option<ChallengeParticipant>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGE_PARTICIPANTS)
            .obj()
            .one(&ChallengeParticipant::doc_id(challenge_id, user_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all participant rows for a challenge.
    pub async fn get_participants(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ChallengeParticipant>, AppError> {
        let challenge_id = challenge_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGE_PARTICIPANTS)
            .filter(move |q| q.for_all([q.field("challenge_id").eq(challenge_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a participant row unless one already exists.
    ///
    /// The existence check reads through the transaction, so two
    /// concurrent joins for the same pair cannot both commit; the loser
    /// retries and observes the winner's row.
    /// Returns `true` if the row was created, `false` if the
    /// (challenge, user) pair was already present.
    pub async fn create_participant_if_absent(
        &self,
        participant: &ChallengeParticipant,
    ) -> Result<bool, AppError> {
        let doc_id = ChallengeParticipant::doc_id(&participant.challenge_id, &participant.user_id);

        for _ in 0..TXN_MAX_ATTEMPTS {
            let mut transaction = self
                .get_client()?
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let existing: Option<ChallengeParticipant> = self
                .transaction_reader(&transaction)?
                .fluent()
                .select()
                .by_id_in(collections::CHALLENGE_PARTICIPANTS)
                .obj()
                .one(&doc_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if existing.is_some() {
                let _ = transaction.rollback().await;
                return Ok(false);
            }

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::CHALLENGE_PARTICIPANTS)
                .document_id(&doc_id)
                .object(participant)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add participant to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(true),
                Err(e) if Self::is_commit_contention(&e) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Database(
            "Transaction contention persisted, giving up".to_string(),
        ))
    }

    /// Overwrite a participant row (progress updates).
    pub async fn set_participant(
        &self,
        participant: &ChallengeParticipant,
    ) -> Result<(), AppError> {
        let doc_id = ChallengeParticipant::doc_id(&participant.challenge_id, &participant.user_id);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGE_PARTICIPANTS)
            .document_id(&doc_id)
            .object(participant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Progress Entry Operations ───────────────────────────────

    /// Append one progress audit row. These rows are never updated.
    pub async fn append_progress_entry(&self, entry: &ProgressEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRESS_ENTRIES)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Progress history for a challenge, optionally filtered by user,
    /// newest first.
    pub async fn get_progress_entries(
        &self,
        challenge_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ProgressEntry>, AppError> {
        let challenge_id = challenge_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PROGRESS_ENTRIES);

        let query = if let Some(user_id) = user_id {
            let user_id = user_id.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("challenge_id").eq(challenge_id.clone()),
                    q.field("user_id").eq(user_id.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.for_all([q.field("challenge_id").eq(challenge_id.clone())]))
        };

        let mut entries: Vec<ProgressEntry> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // RFC3339 with Z sorts lexicographically; newest first
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    // ─── Milestone Operations ────────────────────────────────────

    /// Store a milestone.
    pub async fn set_milestone(&self, milestone: &ChallengeMilestone) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGE_MILESTONES)
            .document_id(&milestone.id)
            .object(milestone)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All milestones for a challenge, ascending by target value.
    pub async fn get_milestones(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ChallengeMilestone>, AppError> {
        let challenge_id = challenge_id.to_string();
        let mut milestones: Vec<ChallengeMilestone> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGE_MILESTONES)
            .filter(move |q| q.for_all([q.field("challenge_id").eq(challenge_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        milestones.sort_by(|a, b| {
            a.target_value
                .partial_cmp(&b.target_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(milestones)
    }

    /// Atomically claim a milestone for a user.
    ///
    /// The read runs inside the transaction, so when two claimants race,
    /// only the first commit lands; the loser's commit is rejected, it
    /// retries, sees the achieved fields set and returns `None`. The
    /// achieved fields are therefore written exactly once. Returns the
    /// achieved milestone for the winner and `None` for everyone else.
    pub async fn claim_milestone(
        &self,
        milestone_id: &str,
        user_id: &str,
    ) -> Result<Option<ChallengeMilestone>, AppError> {
        for _ in 0..TXN_MAX_ATTEMPTS {
            let mut transaction = self
                .get_client()?
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let milestone: Option<ChallengeMilestone> = self
                .transaction_reader(&transaction)?
                .fluent()
                .select()
                .by_id_in(collections::CHALLENGE_MILESTONES)
                .obj()
                .one(milestone_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let Some(mut milestone) = milestone else {
                let _ = transaction.rollback().await;
                return Ok(None);
            };

            if milestone.is_achieved() {
                // Another updater got here first
                let _ = transaction.rollback().await;
                return Ok(None);
            }

            milestone.achieved_at = Some(now_rfc3339());
            milestone.achieved_by = Some(user_id.to_string());

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::CHALLENGE_MILESTONES)
                .document_id(milestone_id)
                .object(&milestone)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add milestone to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(Some(milestone)),
                Err(e) if Self::is_commit_contention(&e) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Database(
            "Transaction contention persisted, giving up".to_string(),
        ))
    }

    // ─── Recognition Operations ──────────────────────────────────

    /// Get a recognition by ID.
    pub async fn get_recognition(
        &self,
        recognition_id: &str,
    ) -> Result<Option<Recognition>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECOGNITIONS)
            .obj()
            .one(recognition_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the quota row for (user, day).
    pub async fn get_recognition_quota(
        &self,
        user_id: &str,
        day: &str,
    ) -> Result<Option<RecognitionQuota>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECOGNITION_QUOTAS)
            .obj()
            .one(&RecognitionQuota::doc_id(user_id, day))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a recognition and bump the sender's daily counter in one
    /// transaction.
    ///
    /// The counter read runs inside the transaction, so concurrent sends
    /// near the cap conflict at commit; the losers retry against the
    /// incremented counter and the ceiling cannot overshoot. Returns
    /// `QuotaExceeded` without writing when the counter for this type is
    /// already at the limit.
    pub async fn give_recognition_atomic(
        &self,
        recognition: &Recognition,
        day: &str,
    ) -> Result<RecognitionQuota, AppError> {
        let recognition_type = recognition.recognition_type;
        let quota_doc_id = RecognitionQuota::doc_id(&recognition.from_user_id, day);

        for _ in 0..TXN_MAX_ATTEMPTS {
            let mut transaction = self
                .get_client()?
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let quota: Option<RecognitionQuota> = self
                .transaction_reader(&transaction)?
                .fluent()
                .select()
                .by_id_in(collections::RECOGNITION_QUOTAS)
                .obj()
                .one(&quota_doc_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let mut quota =
                quota.unwrap_or_else(|| RecognitionQuota::new(&recognition.from_user_id, day));

            if !quota.has_remaining(recognition_type) {
                let _ = transaction.rollback().await;
                return Err(AppError::QuotaExceeded(format!(
                    "Daily {} limit of {} reached",
                    recognition_type, DAILY_RECOGNITION_LIMIT
                )));
            }

            quota.record(recognition_type);

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::RECOGNITIONS)
                .document_id(&recognition.id)
                .object(recognition)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add recognition to transaction: {}", e))
                })?;

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::RECOGNITION_QUOTAS)
                .document_id(&quota_doc_id)
                .object(&quota)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add quota to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(quota),
                Err(e) if Self::is_commit_contention(&e) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Database(
            "Transaction contention persisted, giving up".to_string(),
        ))
    }

    /// Create an interaction row unless the same (recognition, user, type)
    /// already exists. Returns `false` on duplicate.
    ///
    /// The existence check reads through the transaction, so two
    /// concurrent creates for the same triple cannot both commit.
    pub async fn create_interaction_if_absent(
        &self,
        interaction: &RecognitionInteraction,
    ) -> Result<bool, AppError> {
        let doc_id = RecognitionInteraction::doc_id(
            &interaction.recognition_id,
            &interaction.user_id,
            interaction.interaction_type,
        );

        for _ in 0..TXN_MAX_ATTEMPTS {
            let mut transaction = self
                .get_client()?
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let existing: Option<RecognitionInteraction> = self
                .transaction_reader(&transaction)?
                .fluent()
                .select()
                .by_id_in(collections::RECOGNITION_INTERACTIONS)
                .obj()
                .one(&doc_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if existing.is_some() {
                let _ = transaction.rollback().await;
                return Ok(false);
            }

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::RECOGNITION_INTERACTIONS)
                .document_id(&doc_id)
                .object(interaction)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add interaction to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(true),
                Err(e) if Self::is_commit_contention(&e) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Database(
            "Transaction contention persisted, giving up".to_string(),
        ))
    }

    /// Get one interaction row.
    pub async fn get_interaction(
        &self,
        recognition_id: &str,
        user_id: &str,
        interaction_type: crate::models::InteractionType,
    ) -> Result<Option<RecognitionInteraction>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECOGNITION_INTERACTIONS)
            .obj()
            .one(&RecognitionInteraction::doc_id(
                recognition_id,
                user_id,
                interaction_type,
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete one interaction row.
    pub async fn delete_interaction(
        &self,
        recognition_id: &str,
        user_id: &str,
        interaction_type: crate::models::InteractionType,
    ) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RECOGNITION_INTERACTIONS)
            .document_id(&RecognitionInteraction::doc_id(
                recognition_id,
                user_id,
                interaction_type,
            ))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Quest Operations ────────────────────────────────────────

    /// Get a catalog quest by ID.
    pub async fn get_quest(&self, quest_id: &str) -> Result<Option<Quest>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::QUESTS)
            .obj()
            .one(quest_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a catalog quest (seeding/admin).
    pub async fn set_quest(&self, quest: &Quest) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::QUESTS)
            .document_id(&quest.id)
            .object(quest)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Upsert a quest category (seeding/admin).
    pub async fn set_quest_category(&self, category: &QuestCategory) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::QUEST_CATEGORIES)
            .document_id(&category.id)
            .object(category)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Full category catalog.
    pub async fn get_quest_categories(&self) -> Result<Vec<QuestCategory>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUEST_CATEGORIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Catalog quests in one category.
    pub async fn get_quests_in_category(
        &self,
        category_id: &str,
    ) -> Result<Vec<Quest>, AppError> {
        let category_id = category_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUESTS)
            .filter(move |q| q.for_all([q.field("category_id").eq(category_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every assignment row this user has ever had (any status).
    pub async fn get_user_quests(&self, user_id: &str) -> Result<Vec<UserQuest>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_QUESTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Currently assigned quests for a user.
    pub async fn get_assigned_user_quests(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserQuest>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_QUESTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("status").eq("assigned"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Completed quests for a user, newest completion first.
    pub async fn get_completed_user_quests(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserQuest>, AppError> {
        let user_id = user_id.to_string();
        let mut quests: Vec<UserQuest> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_QUESTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("status").eq("completed"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        quests.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(quests)
    }

    /// Expire a batch of assignment rows (new rotation supersedes them).
    pub async fn expire_user_quests(&self, quests: &[UserQuest]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in quests.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for quest in chunk {
                let mut expired = quest.clone();
                expired.status = crate::models::QuestStatus::Expired;

                client
                    .fluent()
                    .update()
                    .in_col(collections::USER_QUESTS)
                    .document_id(&expired.id)
                    .object(&expired)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add quest expiry to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Failed to commit expiry batch: {}", e)))?;
        }

        Ok(())
    }

    /// Store an assignment row.
    pub async fn set_user_quest(&self, user_quest: &UserQuest) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_QUESTS)
            .document_id(&user_quest.id)
            .object(user_quest)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Point Ledger Operations ─────────────────────────────────

    /// Get the stat row for (user, category).
    pub async fn get_user_stat(
        &self,
        user_id: &str,
        category_id: &str,
    ) -> Result<Option<UserStat>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(&UserStat::doc_id(user_id, category_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complete an assigned quest and apply the point award atomically.
    ///
    /// The assignment and stat reads run inside the transaction, so a
    /// concurrent completion or expiry conflicts at commit; the loser
    /// retries, sees the consumed assignment and gets `NotFound`.
    /// Increments for the same (user, category) therefore never get lost.
    /// The level is recomputed from the post-increment total before the
    /// write.
    pub async fn complete_quest_atomic(
        &self,
        user_quest: &UserQuest,
        quest: &Quest,
        notes: Option<String>,
    ) -> Result<UserStat, AppError> {
        let stat_doc_id = UserStat::doc_id(&user_quest.user_id, &quest.category_id);

        for _ in 0..TXN_MAX_ATTEMPTS {
            let now = now_rfc3339();
            let mut transaction = self
                .get_client()?
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let reader = self.transaction_reader(&transaction)?;

            // Re-read the assignment: a concurrent completion or expiry may
            // have already consumed it.
            let current: Option<UserQuest> = reader
                .fluent()
                .select()
                .by_id_in(collections::USER_QUESTS)
                .obj()
                .one(&user_quest.id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let Some(mut current) = current else {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(
                    "Quest not found or already completed".to_string(),
                ));
            };
            if current.status != crate::models::QuestStatus::Assigned {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(
                    "Quest not found or already completed".to_string(),
                ));
            }

            current.status = crate::models::QuestStatus::Completed;
            current.completed_at = Some(now.clone());
            current.notes = notes.clone();

            let stat: Option<UserStat> = reader
                .fluent()
                .select()
                .by_id_in(collections::USER_STATS)
                .obj()
                .one(&stat_doc_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let mut stat = stat
                .unwrap_or_else(|| UserStat::new(&user_quest.user_id, &quest.category_id, &now));
            stat.award_points(quest.point_value, &now);

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::USER_QUESTS)
                .document_id(&current.id)
                .object(&current)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add completion to transaction: {}", e))
                })?;

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::USER_STATS)
                .document_id(&stat_doc_id)
                .object(&stat)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add stat to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => {
                    tracing::info!(
                        user_id = %user_quest.user_id,
                        quest_id = %quest.id,
                        points = quest.point_value,
                        level = stat.level,
                        "Quest completed"
                    );
                    return Ok(stat);
                }
                Err(e) if Self::is_commit_contention(&e) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Database(
            "Transaction contention persisted, giving up".to_string(),
        ))
    }

    // ─── Performance Metric Operations ───────────────────────────

    /// Upsert a journal entry (seeding/admin; the journaling feature owns
    /// these rows in production).
    pub async fn set_journal_entry(&self, entry: &JournalEntry) -> Result<(), AppError> {
        let doc_id = format!("{}_{}", entry.user_id, entry.date);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::JOURNAL_ENTRIES)
            .document_id(&doc_id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Journal entries for a user on or after the cutoff date.
    pub async fn get_journal_entries_since(
        &self,
        user_id: &str,
        cutoff: &str,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let user_id = user_id.to_string();
        let cutoff = cutoff.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").greater_than_or_equal(cutoff.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the daily snapshot (idempotent per (user, day)).
    pub async fn set_performance_metric(
        &self,
        metric: &PerformanceMetric,
    ) -> Result<(), AppError> {
        let doc_id = PerformanceMetric::doc_id(&metric.user_id, &metric.day);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PERFORMANCE_METRICS)
            .document_id(&doc_id)
            .object(metric)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent snapshots for a user, newest first.
    pub async fn get_recent_metrics(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<PerformanceMetric>, AppError> {
        let user_id = user_id.to_string();
        let mut metrics: Vec<PerformanceMetric> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PERFORMANCE_METRICS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        metrics.sort_by(|a, b| b.day.cmp(&a.day));
        metrics.truncate(limit as usize);
        Ok(metrics)
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Upsert a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a user profile.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users, optionally scoped to one school.
    pub async fn get_users(&self, school_id: Option<&str>) -> Result<Vec<User>, AppError> {
        let client = self.get_client()?;

        let result = if let Some(school_id) = school_id {
            let school_id = school_id.to_string();
            client
                .fluent()
                .select()
                .from(collections::USERS)
                .filter(move |q| q.for_all([q.field("school_id").eq(school_id.clone())]))
                .obj()
                .query()
                .await
        } else {
            client
                .fluent()
                .select()
                .from(collections::USERS)
                .obj()
                .query()
                .await
        };

        result.map_err(|e| AppError::Database(e.to_string()))
    }
}
