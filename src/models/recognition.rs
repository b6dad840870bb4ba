// SPDX-License-Identifier: MIT

//! Peer recognition, reactions and the daily quota counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily cap per recognition type per sender.
pub const DAILY_RECOGNITION_LIMIT: u32 = 5;

/// Closed set of recognition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionType {
    Clap,
    Fire,
    Heart,
    Flex,
    Zap,
    Trophy,
}

impl RecognitionType {
    pub const ALL: [RecognitionType; 6] = [
        Self::Clap,
        Self::Fire,
        Self::Heart,
        Self::Flex,
        Self::Zap,
        Self::Trophy,
    ];
}

impl FromStr for RecognitionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clap" => Ok(Self::Clap),
            "fire" => Ok(Self::Fire),
            "heart" => Ok(Self::Heart),
            "flex" => Ok(Self::Flex),
            "zap" => Ok(Self::Zap),
            "trophy" => Ok(Self::Trophy),
            other => Err(format!("Unknown recognition type: {}", other)),
        }
    }
}

impl fmt::Display for RecognitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clap => "clap",
            Self::Fire => "fire",
            Self::Heart => "heart",
            Self::Flex => "flex",
            Self::Zap => "zap",
            Self::Trophy => "trophy",
        };
        f.write_str(s)
    }
}

/// Closed set of reaction types on a recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Like,
    Celebrate,
    Support,
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "celebrate" => Ok(Self::Celebrate),
            "support" => Ok(Self::Support),
            other => Err(format!("Unknown interaction type: {}", other)),
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Like => "like",
            Self::Celebrate => "celebrate",
            Self::Support => "support",
        };
        f.write_str(s)
    }
}

/// A peer-to-peer acknowledgment. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recognition {
    /// Recognition ID (uuid, also the document ID)
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub team_id: String,
    pub recognition_type: RecognitionType,
    pub message: Option<String>,
    /// When the recognition was given (ISO 8601)
    pub created_at: String,
}

/// A lightweight reaction on a recognition.
///
/// Document ID: `{recognition_id}_{user_id}_{type}`. A duplicate key
/// is rejected, not merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionInteraction {
    pub recognition_id: String,
    pub user_id: String,
    pub interaction_type: InteractionType,
    pub created_at: String,
}

impl RecognitionInteraction {
    pub fn doc_id(recognition_id: &str, user_id: &str, interaction_type: InteractionType) -> String {
        format!("{}_{}_{}", recognition_id, user_id, interaction_type)
    }
}

/// Per-sender, per-UTC-day recognition counters.
///
/// Document ID: `{user_id}_{YYYY-MM-DD}`. One explicit field per type:
/// the enum-to-field mapping is a fixed match, never a runtime-derived
/// column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionQuota {
    pub user_id: String,
    /// Canonical day key ("YYYY-MM-DD", UTC)
    pub day: String,
    #[serde(default)]
    pub claps_used: u32,
    #[serde(default)]
    pub fires_used: u32,
    #[serde(default)]
    pub hearts_used: u32,
    #[serde(default)]
    pub flexes_used: u32,
    #[serde(default)]
    pub zaps_used: u32,
    #[serde(default)]
    pub trophies_used: u32,
}

impl RecognitionQuota {
    /// Fresh quota row with all counters at zero.
    pub fn new(user_id: &str, day: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            day: day.to_string(),
            claps_used: 0,
            fires_used: 0,
            hearts_used: 0,
            flexes_used: 0,
            zaps_used: 0,
            trophies_used: 0,
        }
    }

    pub fn doc_id(user_id: &str, day: &str) -> String {
        format!("{}_{}", user_id, day)
    }

    /// Counter for one recognition type.
    pub fn used(&self, recognition_type: RecognitionType) -> u32 {
        match recognition_type {
            RecognitionType::Clap => self.claps_used,
            RecognitionType::Fire => self.fires_used,
            RecognitionType::Heart => self.hearts_used,
            RecognitionType::Flex => self.flexes_used,
            RecognitionType::Zap => self.zaps_used,
            RecognitionType::Trophy => self.trophies_used,
        }
    }

    /// Whether one more recognition of this type fits under the cap.
    pub fn has_remaining(&self, recognition_type: RecognitionType) -> bool {
        self.used(recognition_type) < DAILY_RECOGNITION_LIMIT
    }

    /// Increment the counter for one type.
    pub fn record(&mut self, recognition_type: RecognitionType) {
        let counter = match recognition_type {
            RecognitionType::Clap => &mut self.claps_used,
            RecognitionType::Fire => &mut self.fires_used,
            RecognitionType::Heart => &mut self.hearts_used,
            RecognitionType::Flex => &mut self.flexes_used,
            RecognitionType::Zap => &mut self.zaps_used,
            RecognitionType::Trophy => &mut self.trophies_used,
        };
        *counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_type() {
        let mut quota = RecognitionQuota::new("u1", "2024-03-01");

        quota.record(RecognitionType::Clap);
        quota.record(RecognitionType::Clap);
        quota.record(RecognitionType::Fire);

        assert_eq!(quota.used(RecognitionType::Clap), 2);
        assert_eq!(quota.used(RecognitionType::Fire), 1);
        assert_eq!(quota.used(RecognitionType::Trophy), 0);
    }

    #[test]
    fn cap_is_per_type() {
        let mut quota = RecognitionQuota::new("u1", "2024-03-01");

        for _ in 0..DAILY_RECOGNITION_LIMIT {
            assert!(quota.has_remaining(RecognitionType::Heart));
            quota.record(RecognitionType::Heart);
        }

        assert!(!quota.has_remaining(RecognitionType::Heart));
        // Other types unaffected
        assert!(quota.has_remaining(RecognitionType::Zap));
    }

    #[test]
    fn every_type_maps_to_a_distinct_counter() {
        let mut quota = RecognitionQuota::new("u1", "2024-03-01");
        for t in RecognitionType::ALL {
            quota.record(t);
        }
        for t in RecognitionType::ALL {
            assert_eq!(quota.used(t), 1, "counter for {}", t);
        }
    }

    #[test]
    fn interaction_doc_id_includes_type() {
        assert_eq!(
            RecognitionInteraction::doc_id("r1", "u1", InteractionType::Celebrate),
            "r1_u1_celebrate"
        );
    }

    #[test]
    fn recognition_type_parses_closed_set_only() {
        assert!("clap".parse::<RecognitionType>().is_ok());
        assert!("thumbsup".parse::<RecognitionType>().is_err());
    }
}
