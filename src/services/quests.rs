// SPDX-License-Identifier: MIT

//! Daily quest rotation, completion and the point ledger.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::quest::MAX_QUEST_NOTES_LEN;
use crate::models::{Quest, QuestStatus, UserQuest};
use crate::time_utils::now_rfc3339;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Quests assigned per daily rotation.
pub const DAILY_QUEST_COUNT: usize = 3;

/// Result of completing a quest.
#[derive(Debug, Clone, Serialize)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub points_awarded: u64,
    pub total_points: u64,
    pub level: u32,
}

/// A freshly assigned quest with display fields.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedQuest {
    pub user_quest_id: String,
    pub quest_id: String,
    pub title: String,
    pub description: String,
    pub point_value: u64,
    pub category_name: String,
}

/// A completed quest with display fields.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedQuest {
    pub quest_id: String,
    pub title: String,
    pub description: String,
    pub point_value: u64,
    pub category_name: String,
    pub completed_at: String,
    pub notes: Option<String>,
}

/// Pick a quest from a category: prefer one the user has never had
/// assigned or completed; fall back to any quest in the category.
pub fn select_quest<'a, R: Rng + ?Sized>(
    quests: &'a [Quest],
    seen_quest_ids: &HashSet<String>,
    rng: &mut R,
) -> Option<&'a Quest> {
    let unseen: Vec<&Quest> = quests
        .iter()
        .filter(|q| !seen_quest_ids.contains(&q.id))
        .collect();

    if let Some(quest) = unseen.choose(rng) {
        return Some(quest);
    }
    quests.choose(rng)
}

/// Quest assignment and point ledger.
pub struct QuestService {
    db: FirestoreDb,
}

impl QuestService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Complete an assigned quest and award its points.
    pub async fn complete_quest(
        &self,
        user_id: &str,
        quest_id: &str,
        notes: Option<String>,
    ) -> Result<QuestCompletion> {
        if let Some(ref notes) = notes {
            if notes.chars().count() > MAX_QUEST_NOTES_LEN {
                return Err(AppError::Validation(format!(
                    "Notes must be at most {} characters",
                    MAX_QUEST_NOTES_LEN
                )));
            }
        }

        let quest = self
            .db
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quest not found in database".to_string()))?;

        let assigned = self.db.get_assigned_user_quests(user_id).await?;
        let user_quest = assigned
            .into_iter()
            .find(|uq| uq.quest_id == quest_id)
            .ok_or_else(|| {
                AppError::NotFound("Quest not found or already completed".to_string())
            })?;

        // The transition and the point increment commit together; the
        // transaction re-checks the assignment status.
        let stat = self
            .db
            .complete_quest_atomic(&user_quest, &quest, notes)
            .await?;

        Ok(QuestCompletion {
            quest_id: quest.id,
            points_awarded: quest.point_value,
            total_points: stat.points,
            level: stat.level,
        })
    }

    /// Assign a fresh daily rotation of quests.
    ///
    /// Every currently assigned quest is expired first, so "assigned"
    /// is always a single generation. Then three distinct categories are
    /// drawn uniformly at random and one quest is selected per category.
    pub async fn assign_daily_quests<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        rng: &mut R,
    ) -> Result<Vec<AssignedQuest>> {
        let current = self.db.get_assigned_user_quests(user_id).await?;
        if !current.is_empty() {
            self.db.expire_user_quests(&current).await?;
            tracing::debug!(user_id, expired = current.len(), "Expired previous rotation");
        }

        let categories = self.db.get_quest_categories().await?;
        if categories.is_empty() {
            return Err(AppError::NotFound(
                "No quest categories available".to_string(),
            ));
        }

        let chosen: Vec<_> = categories
            .choose_multiple(rng, DAILY_QUEST_COUNT)
            .cloned()
            .collect();

        // Everything this user has ever had, regardless of status
        let seen_quest_ids: HashSet<String> = self
            .db
            .get_user_quests(user_id)
            .await?
            .into_iter()
            .map(|uq| uq.quest_id)
            .collect();

        let now = now_rfc3339();
        let mut assigned = Vec::new();

        for category in chosen {
            let quests = self.db.get_quests_in_category(&category.id).await?;
            let Some(quest) = select_quest(&quests, &seen_quest_ids, rng) else {
                tracing::debug!(category_id = %category.id, "Category has no quests, skipping");
                continue;
            };

            let user_quest = UserQuest {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                quest_id: quest.id.clone(),
                status: QuestStatus::Assigned,
                assigned_at: now.clone(),
                completed_at: None,
                notes: None,
            };
            self.db.set_user_quest(&user_quest).await?;

            assigned.push(AssignedQuest {
                user_quest_id: user_quest.id,
                quest_id: quest.id.clone(),
                title: quest.title.clone(),
                description: quest.description.clone(),
                point_value: quest.point_value,
                category_name: category.name.clone(),
            });
        }

        tracing::info!(user_id, count = assigned.len(), "Daily quests assigned");
        Ok(assigned)
    }

    /// Completed quests, newest first, joined with catalog display fields.
    pub async fn get_completed_quests(&self, user_id: &str) -> Result<Vec<CompletedQuest>> {
        let completed = self.db.get_completed_user_quests(user_id).await?;

        let categories: HashMap<String, String> = self
            .db
            .get_quest_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut results = Vec::with_capacity(completed.len());
        for user_quest in completed {
            let Some(quest) = self.db.get_quest(&user_quest.quest_id).await? else {
                // Catalog entry removed after completion; skip the row
                tracing::warn!(quest_id = %user_quest.quest_id, "Completed quest missing from catalog");
                continue;
            };

            results.push(CompletedQuest {
                quest_id: quest.id,
                title: quest.title,
                description: quest.description,
                point_value: quest.point_value,
                category_name: categories
                    .get(&quest.category_id)
                    .cloned()
                    .unwrap_or_default(),
                completed_at: user_quest.completed_at.unwrap_or_default(),
                notes: user_quest.notes,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quest(id: &str, category: &str) -> Quest {
        Quest {
            id: id.to_string(),
            category_id: category.to_string(),
            title: format!("Quest {}", id),
            description: "desc".to_string(),
            point_value: 50,
        }
    }

    #[test]
    fn select_prefers_unseen_quests() {
        let quests = vec![quest("q1", "c1"), quest("q2", "c1"), quest("q3", "c1")];
        let seen: HashSet<String> = ["q1".to_string(), "q3".to_string()].into();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let picked = select_quest(&quests, &seen, &mut rng).unwrap();
            assert_eq!(picked.id, "q2");
        }
    }

    #[test]
    fn select_falls_back_when_all_seen() {
        let quests = vec![quest("q1", "c1"), quest("q2", "c1")];
        let seen: HashSet<String> = ["q1".to_string(), "q2".to_string()].into();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = select_quest(&quests, &seen, &mut rng);
        assert!(picked.is_some());
    }

    #[test]
    fn select_none_for_empty_category() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_quest(&[], &HashSet::new(), &mut rng).is_none());
    }
}
