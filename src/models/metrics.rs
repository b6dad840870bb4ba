// SPDX-License-Identifier: MIT

//! Journal aggregation and daily performance metrics.

use serde::{Deserialize, Serialize};

/// Journal entry reference data (written by the journaling feature,
/// read-only here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub user_id: String,
    /// Entry date (ISO 8601)
    pub date: String,
    pub sleep_hours: f64,
    pub study_hours: f64,
    pub active_hours: f64,
    /// Self-reported stress, 0-10 scale
    pub stress_level: f64,
    pub screen_time_hours: f64,
}

/// Daily performance snapshot.
///
/// Document ID: `{user_id}_{YYYY-MM-DD}`. Recomputing on the same day
/// overwrites rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub user_id: String,
    /// Canonical day key ("YYYY-MM-DD", UTC)
    pub day: String,
    pub focus: u32,
    pub effort: u32,
    pub readiness: u32,
    pub motivation: u32,
    pub performance_score: u32,
    /// Number of journal entries averaged
    pub sample_size: u32,
    /// When the snapshot was computed (ISO 8601)
    pub computed_at: String,
}

impl PerformanceMetric {
    pub fn doc_id(user_id: &str, day: &str) -> String {
        format!("{}_{}", user_id, day)
    }
}

/// Seven-day journal averages feeding the sub-score formulas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JournalAverages {
    pub sleep_hours: f64,
    pub study_hours: f64,
    pub active_hours: f64,
    pub stress: f64,
    pub screen_time: f64,
}

impl JournalAverages {
    /// Average the given entries field by field. Returns None when
    /// there is nothing to average.
    pub fn from_entries(entries: &[JournalEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let n = entries.len() as f64;
        Some(Self {
            sleep_hours: entries.iter().map(|e| e.sleep_hours).sum::<f64>() / n,
            study_hours: entries.iter().map(|e| e.study_hours).sum::<f64>() / n,
            active_hours: entries.iter().map(|e| e.active_hours).sum::<f64>() / n,
            stress: entries.iter().map(|e| e.stress_level).sum::<f64>() / n,
            screen_time: entries.iter().map(|e| e.screen_time_hours).sum::<f64>() / n,
        })
    }
}

/// Clamp a raw sub-score into [0, 100]. Non-finite values collapse to 0.
fn bounded_score(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u32
}

/// Focus: study time relative to screen time.
pub fn focus_score(avg: &JournalAverages) -> u32 {
    bounded_score(100.0 - (avg.screen_time / avg.study_hours) * 20.0)
}

/// Effort: combined active and study hours.
pub fn effort_score(avg: &JournalAverages) -> u32 {
    bounded_score((avg.active_hours + avg.study_hours) * 10.0)
}

/// Readiness: sleep offset by stress.
pub fn readiness_score(avg: &JournalAverages) -> u32 {
    bounded_score(avg.sleep_hours * 12.5 - avg.stress * 5.0)
}

/// Motivation: inverse of stress.
pub fn motivation_score(avg: &JournalAverages) -> u32 {
    bounded_score(100.0 - avg.stress * 10.0)
}

/// All four sub-scores plus the overall score (rounded mean).
pub fn compute_scores(avg: &JournalAverages) -> (u32, u32, u32, u32, u32) {
    let focus = focus_score(avg);
    let effort = effort_score(avg);
    let readiness = readiness_score(avg);
    let motivation = motivation_score(avg);
    let overall =
        ((focus + effort + readiness + motivation) as f64 / 4.0).round() as u32;
    (focus, effort, readiness, motivation, overall)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sleep: f64, study: f64, active: f64, stress: f64, screen: f64) -> JournalEntry {
        JournalEntry {
            user_id: "u1".to_string(),
            date: "2024-03-01T08:00:00Z".to_string(),
            sleep_hours: sleep,
            study_hours: study,
            active_hours: active,
            stress_level: stress,
            screen_time_hours: screen,
        }
    }

    #[test]
    fn averages_across_entries() {
        let entries = vec![
            entry(8.0, 4.0, 2.0, 2.0, 3.0),
            entry(6.0, 2.0, 0.0, 4.0, 5.0),
        ];
        let avg = JournalAverages::from_entries(&entries).unwrap();

        assert_eq!(avg.sleep_hours, 7.0);
        assert_eq!(avg.study_hours, 3.0);
        assert_eq!(avg.active_hours, 1.0);
        assert_eq!(avg.stress, 3.0);
        assert_eq!(avg.screen_time, 4.0);
    }

    #[test]
    fn no_entries_means_no_averages() {
        assert!(JournalAverages::from_entries(&[]).is_none());
    }

    #[test]
    fn scores_are_bounded() {
        let avg = JournalAverages {
            sleep_hours: 12.0,
            study_hours: 14.0,
            active_hours: 8.0,
            stress: 0.0,
            screen_time: 0.0,
        };
        let (focus, effort, readiness, motivation, overall) = compute_scores(&avg);

        assert_eq!(focus, 100);
        assert_eq!(effort, 100); // (8 + 14) * 10 capped
        assert_eq!(readiness, 100);
        assert_eq!(motivation, 100);
        assert_eq!(overall, 100);
    }

    #[test]
    fn zero_study_hours_does_not_produce_nan_focus() {
        let avg = JournalAverages {
            study_hours: 0.0,
            screen_time: 5.0,
            ..Default::default()
        };
        // 5/0 is infinite; non-finite scores clamp to 0
        assert_eq!(focus_score(&avg), 0);
    }

    #[test]
    fn zero_screen_and_study_clamps_to_zero() {
        let avg = JournalAverages::default();
        // 0/0 is NaN
        assert_eq!(focus_score(&avg), 0);
    }

    #[test]
    fn high_stress_floors_motivation() {
        let avg = JournalAverages {
            stress: 10.0,
            ..Default::default()
        };
        assert_eq!(motivation_score(&avg), 0);
    }

    #[test]
    fn overall_is_rounded_mean() {
        let avg = JournalAverages {
            sleep_hours: 8.0,  // readiness 8*12.5 - 2*5 = 90
            study_hours: 4.0,  // focus 100 - (2/4)*20 = 90
            active_hours: 2.0, // effort (2+4)*10 = 60
            stress: 2.0,       // motivation 80
            screen_time: 2.0,
        };
        let (focus, effort, readiness, motivation, overall) = compute_scores(&avg);
        assert_eq!((focus, effort, readiness, motivation), (90, 60, 90, 80));
        assert_eq!(overall, 80); // (90+60+90+80)/4 = 80
    }
}
