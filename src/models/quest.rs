// SPDX-License-Identifier: MIT

//! Quest catalog, per-user quest assignments and the point ledger.

use serde::{Deserialize, Serialize};

/// Points per level. `level = points / POINTS_PER_LEVEL + 1`.
pub const POINTS_PER_LEVEL: u64 = 100;

/// Maximum length of completion notes.
pub const MAX_QUEST_NOTES_LEN: usize = 280;

/// Catalog quest. Read-mostly reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    /// Quest ID (also the document ID)
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub description: String,
    pub point_value: u64,
}

/// Quest category. Read-mostly reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestCategory {
    /// Category ID (also the document ID)
    pub id: String,
    pub name: String,
}

/// Assignment lifecycle status.
///
/// assigned -> completed is terminal; assigned -> expired happens when a
/// new assignment round supersedes the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Assigned,
    Completed,
    Expired,
}

/// A quest assigned to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuest {
    /// Assignment ID (uuid, also the document ID)
    pub id: String,
    pub user_id: String,
    pub quest_id: String,
    pub status: QuestStatus,
    /// When the quest was assigned (ISO 8601)
    pub assigned_at: String,
    /// Set on completion (ISO 8601)
    pub completed_at: Option<String>,
    pub notes: Option<String>,
}

/// Per-user, per-category point accumulation.
///
/// Document ID: `{user_id}_{category_id}`. The level formula holds after
/// every write, not just at display time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: String,
    pub category_id: String,
    pub points: u64,
    pub level: u32,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
}

/// Level derived from total points.
pub fn level_for_points(points: u64) -> u32 {
    (points / POINTS_PER_LEVEL) as u32 + 1
}

impl UserStat {
    /// Fresh stat row with zero points (level 1).
    pub fn new(user_id: &str, category_id: &str, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            points: 0,
            level: 1,
            updated_at: now.to_string(),
        }
    }

    pub fn doc_id(user_id: &str, category_id: &str) -> String {
        format!("{}_{}", user_id, category_id)
    }

    /// Add points and recompute the level from the post-increment total.
    pub fn award_points(&mut self, points: u64, now: &str) {
        self.points += points;
        self.level = level_for_points(self.points);
        self.updated_at = now.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_formula() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(150), 2);
        assert_eq!(level_for_points(210), 3);
        assert_eq!(level_for_points(1000), 11);
    }

    #[test]
    fn award_points_keeps_level_invariant() {
        let mut stat = UserStat::new("u1", "cat1", "2024-03-01T00:00:00Z");
        stat.points = 100;
        stat.level = 2;

        stat.award_points(50, "2024-03-01T01:00:00Z");
        assert_eq!(stat.points, 150);
        assert_eq!(stat.level, 2);

        stat.award_points(60, "2024-03-01T02:00:00Z");
        assert_eq!(stat.points, 210);
        assert_eq!(stat.level, 3);
        assert_eq!(stat.level, level_for_points(stat.points));
    }

    #[test]
    fn new_stat_starts_at_level_one() {
        let stat = UserStat::new("u1", "cat1", "now");
        assert_eq!(stat.points, 0);
        assert_eq!(stat.level, 1);
    }
}
