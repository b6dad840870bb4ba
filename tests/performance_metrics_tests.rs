// SPDX-License-Identifier: MIT

//! Performance metric computation and leaderboard tests (Firestore
//! emulator).

use teampulse::db::FirestoreDb;
use teampulse::models::{JournalEntry, User};
use teampulse::services::leaderboard::Trend;
use teampulse::services::PerformanceService;
use teampulse::time_utils::{format_utc_rfc3339, today_key};

mod common;

async fn seed_journal(db: &FirestoreDb, user_id: &str, days_ago: i64, stress: f64) {
    let date = format_utc_rfc3339(chrono::Utc::now() - chrono::Duration::days(days_ago));
    let entry = JournalEntry {
        user_id: user_id.to_string(),
        date,
        sleep_hours: 8.0,
        study_hours: 4.0,
        active_hours: 2.0,
        stress_level: stress,
        screen_time_hours: 2.0,
    };
    db.set_journal_entry(&entry)
        .await
        .expect("Failed to seed journal entry");
}

#[tokio::test]
async fn test_compute_metrics_from_recent_entries() {
    require_emulator!();

    let db = common::test_db().await;
    let service = PerformanceService::new(db.clone());
    let user_id = format!("user-{}", uuid::Uuid::new_v4());

    seed_journal(&db, &user_id, 1, 2.0).await;
    seed_journal(&db, &user_id, 3, 2.0).await;
    // Outside the seven-day window, must not affect the averages
    seed_journal(&db, &user_id, 30, 10.0).await;

    let metric = service.compute_metrics(&user_id).await.expect("compute");

    assert_eq!(metric.day, today_key());
    assert_eq!(metric.sample_size, 2);
    // sleep 8, study 4, active 2, stress 2, screen 2:
    // focus 90, effort 60, readiness 90, motivation 80, overall 80
    assert_eq!(metric.focus, 90);
    assert_eq!(metric.effort, 60);
    assert_eq!(metric.readiness, 90);
    assert_eq!(metric.motivation, 80);
    assert_eq!(metric.performance_score, 80);
}

#[tokio::test]
async fn test_compute_metrics_is_idempotent_per_day() {
    require_emulator!();

    let db = common::test_db().await;
    let service = PerformanceService::new(db.clone());
    let user_id = format!("user-{}", uuid::Uuid::new_v4());

    seed_journal(&db, &user_id, 1, 2.0).await;

    service.compute_metrics(&user_id).await.unwrap();
    service.compute_metrics(&user_id).await.unwrap();

    // Same (user, day) document, so recomputing never duplicates
    let metrics = db.get_recent_metrics(&user_id, 10).await.unwrap();
    assert_eq!(metrics.len(), 1);
}

#[tokio::test]
async fn test_compute_metrics_without_entries_rejected() {
    require_emulator!();

    let db = common::test_db().await;
    let service = PerformanceService::new(db);

    let err = service
        .compute_metrics(&format!("user-{}", uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no recent journal entries"));
}

#[tokio::test]
async fn test_school_leaderboard_scopes_and_ranks() {
    require_emulator!();

    let db = common::test_db().await;
    let service = PerformanceService::new(db.clone());
    let school_id = format!("school-{}", uuid::Uuid::new_v4());

    // Two users in the school with different stress (hence scores), one
    // outside it, one in the school without any journal entries
    let high = format!("user-{}", uuid::Uuid::new_v4());
    let low = format!("user-{}", uuid::Uuid::new_v4());
    let outsider = format!("user-{}", uuid::Uuid::new_v4());
    let silent = format!("user-{}", uuid::Uuid::new_v4());

    for (id, school) in [
        (&high, Some(&school_id)),
        (&low, Some(&school_id)),
        (&outsider, None),
        (&silent, Some(&school_id)),
    ] {
        db.upsert_user(&User {
            id: id.to_string(),
            display_name: format!("User {}", id),
            school_id: school.map(|s| s.to_string()),
            team_ids: vec![],
        })
        .await
        .unwrap();
    }

    seed_journal(&db, &high, 1, 0.0).await;
    seed_journal(&db, &low, 1, 8.0).await;
    seed_journal(&db, &outsider, 1, 0.0).await;

    service.compute_metrics(&high).await.unwrap();
    service.compute_metrics(&low).await.unwrap();
    service.compute_metrics(&outsider).await.unwrap();

    let standings = service.get_leaderboard(Some(&school_id)).await.unwrap();

    // The outsider and the user with no snapshots are excluded
    let ids: Vec<&str> = standings.iter().map(|s| s.user_id.as_str()).collect();
    assert_eq!(ids, vec![high.as_str(), low.as_str()]);
    assert!(standings[0].latest_score > standings[1].latest_score);

    // Single snapshot each: no trend yet
    assert_eq!(standings[0].trend, Trend::None);
}
