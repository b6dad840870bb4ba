// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod challenge;
pub mod metrics;
pub mod quest;
pub mod recognition;
pub mod user;

pub use challenge::{
    Challenge, ChallengeMilestone, ChallengeParticipant, ChallengeType, ParticipantStatus,
    ProgressEntry,
};
pub use metrics::{JournalEntry, PerformanceMetric};
pub use quest::{Quest, QuestCategory, QuestStatus, UserQuest, UserStat};
pub use recognition::{
    InteractionType, Recognition, RecognitionInteraction, RecognitionQuota, RecognitionType,
};
pub use user::User;
