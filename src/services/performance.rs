// SPDX-License-Identifier: MIT

//! Journal-derived performance metrics and the user/school leaderboard.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::metrics::{compute_scores, JournalAverages};
use crate::models::PerformanceMetric;
use crate::services::leaderboard::{rank_standings, standing_from_snapshots, UserStanding};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339, today_key};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Journal window for metric aggregation.
const JOURNAL_WINDOW_DAYS: i64 = 7;

/// Snapshots fetched per user for trend computation.
const TREND_SNAPSHOT_COUNT: u32 = 2;

/// Performance metric computation and ranking.
pub struct PerformanceService {
    db: FirestoreDb,
}

impl PerformanceService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Compute today's performance snapshot from the last seven days of
    /// journal entries. Idempotent per (user, UTC day): recomputation
    /// overwrites the same document.
    pub async fn compute_metrics(&self, user_id: &str) -> Result<PerformanceMetric> {
        let cutoff =
            format_utc_rfc3339(chrono::Utc::now() - chrono::Duration::days(JOURNAL_WINDOW_DAYS));

        let entries = self.db.get_journal_entries_since(user_id, &cutoff).await?;
        let averages = JournalAverages::from_entries(&entries)
            .ok_or_else(|| AppError::Validation("no recent journal entries".to_string()))?;

        let (focus, effort, readiness, motivation, overall) = compute_scores(&averages);

        let metric = PerformanceMetric {
            user_id: user_id.to_string(),
            day: today_key(),
            focus,
            effort,
            readiness,
            motivation,
            performance_score: overall,
            sample_size: entries.len() as u32,
            computed_at: now_rfc3339(),
        };

        self.db.set_performance_metric(&metric).await?;

        tracing::debug!(
            user_id,
            score = overall,
            samples = metric.sample_size,
            "Performance metrics computed"
        );

        Ok(metric)
    }

    /// Leaderboard across users, optionally scoped to one school.
    ///
    /// For each candidate: the two most recent snapshots give the latest
    /// score and trend; users with no snapshots are excluded. Top 20 by
    /// latest score.
    pub async fn get_leaderboard(&self, school_id: Option<&str>) -> Result<Vec<UserStanding>> {
        let users = self.db.get_users(school_id).await?;

        let standings: Vec<Option<UserStanding>> = stream::iter(users)
            .map(|user| {
                let db = self.db.clone();
                async move {
                    let snapshots = db.get_recent_metrics(&user.id, TREND_SNAPSHOT_COUNT).await?;
                    Ok::<_, AppError>(standing_from_snapshots(
                        &user.id,
                        &user.display_name,
                        &snapshots,
                    ))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<UserStanding>>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<UserStanding>>>>()?;

        Ok(rank_standings(standings.into_iter().flatten().collect()))
    }
}
