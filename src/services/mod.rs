// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod challenges;
pub mod leaderboard;
pub mod notifier;
pub mod performance;
pub mod quests;
pub mod recognition;

pub use challenges::ChallengeService;
pub use notifier::{NotificationEvent, NotificationKind, NotifierService};
pub use performance::PerformanceService;
pub use quests::QuestService;
pub use recognition::RecognitionService;
