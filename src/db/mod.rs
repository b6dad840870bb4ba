// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHALLENGES: &str = "challenges";
    /// Participant rows, keyed by `{challenge_id}_{user_id}`
    pub const CHALLENGE_PARTICIPANTS: &str = "challenge_participants";
    pub const PROGRESS_ENTRIES: &str = "progress_entries";
    pub const CHALLENGE_MILESTONES: &str = "challenge_milestones";
    pub const RECOGNITIONS: &str = "recognitions";
    /// Reaction rows, keyed by `{recognition_id}_{user_id}_{type}`
    pub const RECOGNITION_INTERACTIONS: &str = "recognition_interactions";
    /// Daily counters, keyed by `{user_id}_{day}`
    pub const RECOGNITION_QUOTAS: &str = "recognition_quotas";
    pub const QUESTS: &str = "quests";
    pub const QUEST_CATEGORIES: &str = "quest_categories";
    pub const USER_QUESTS: &str = "user_quests";
    /// Point ledger rows, keyed by `{user_id}_{category_id}`
    pub const USER_STATS: &str = "user_stats";
    /// Daily snapshots, keyed by `{user_id}_{day}`
    pub const PERFORMANCE_METRICS: &str = "performance_metrics";
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
}
