// SPDX-License-Identifier: MIT

//! Recognition quota enforcement tests (Firestore emulator).

use std::sync::Arc;
use teampulse::models::recognition::DAILY_RECOGNITION_LIMIT;
use teampulse::models::{InteractionType, Recognition, RecognitionType};
use teampulse::services::{NotifierService, RecognitionService};
use teampulse::time_utils::{now_rfc3339, today_key};

mod common;

fn service(db: teampulse::db::FirestoreDb) -> RecognitionService {
    let notifier = Arc::new(NotifierService::new("test-project", "us-west1"));
    RecognitionService::new(db, notifier, "http://localhost".to_string())
}

#[tokio::test]
async fn test_sixth_recognition_of_type_rejected() {
    require_emulator!();

    let db = common::test_db().await;
    let service = service(db);
    let sender = format!("user-{}", uuid::Uuid::new_v4());

    for i in 0..DAILY_RECOGNITION_LIMIT {
        service
            .give_recognition(
                "team-1",
                &sender,
                &format!("recipient-{}", i),
                RecognitionType::Clap,
                None,
            )
            .await
            .expect("send within quota");
    }

    let err = service
        .give_recognition("team-1", &sender, "recipient-x", RecognitionType::Clap, None)
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("limit"),
        "expected quota error, got: {}",
        err
    );

    // A different type still has full quota
    service
        .give_recognition("team-1", &sender, "recipient-x", RecognitionType::Fire, None)
        .await
        .expect("other type unaffected");

    let limits = service.get_limits(&sender).await.unwrap();
    assert_eq!(limits.claps_used, DAILY_RECOGNITION_LIMIT);
    assert_eq!(limits.fires_used, 1);
    assert_eq!(limits.limit_per_type, DAILY_RECOGNITION_LIMIT);
}

#[tokio::test]
async fn test_concurrent_sends_never_exceed_quota() {
    // Concurrent sends near the cap: the counter read is registered with
    // the transaction, so contended commits are rejected and retried
    // against the incremented counter. At most five may succeed.

    require_emulator!();

    let db = common::test_db().await;
    let sender = format!("user-{}", uuid::Uuid::new_v4());

    let mut handles = vec![];
    for i in 0..(DAILY_RECOGNITION_LIMIT + 3) {
        let db_clone = db.clone();
        let sender = sender.clone();
        handles.push(tokio::spawn(async move {
            let recognition = Recognition {
                id: uuid::Uuid::new_v4().to_string(),
                from_user_id: sender.clone(),
                to_user_id: format!("recipient-{}", i),
                team_id: "team-1".to_string(),
                recognition_type: RecognitionType::Heart,
                message: None,
                created_at: now_rfc3339(),
            };
            db_clone
                .give_recognition_atomic(&recognition, &today_key())
                .await
        }));
    }

    let mut succeeded = 0u32;
    for handle in handles {
        if handle.await.expect("Task join failed").is_ok() {
            succeeded += 1;
        }
    }

    assert!(
        succeeded <= DAILY_RECOGNITION_LIMIT,
        "quota overshoot: {} sends committed",
        succeeded
    );

    let quota = db
        .get_recognition_quota(&sender, &today_key())
        .await
        .unwrap()
        .expect("quota row must exist");
    assert_eq!(quota.hearts_used, succeeded);
    assert!(quota.hearts_used <= DAILY_RECOGNITION_LIMIT);
}

#[tokio::test]
async fn test_limits_default_to_zero() {
    require_emulator!();

    let db = common::test_db().await;
    let service = service(db);

    let limits = service
        .get_limits(&format!("user-{}", uuid::Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(limits.claps_used, 0);
    assert_eq!(limits.trophies_used, 0);
    assert_eq!(limits.day, today_key());
}

#[tokio::test]
async fn test_interaction_duplicate_conflict_and_removal() {
    require_emulator!();

    let db = common::test_db().await;
    let service = service(db);
    let sender = format!("user-{}", uuid::Uuid::new_v4());
    let reactor = format!("user-{}", uuid::Uuid::new_v4());

    let recognition = service
        .give_recognition("team-1", &sender, "recipient-1", RecognitionType::Zap, None)
        .await
        .unwrap();

    service
        .create_interaction(&recognition.id, &reactor, InteractionType::Like)
        .await
        .expect("first reaction");

    // Same (user, type) again is a conflict
    let err = service
        .create_interaction(&recognition.id, &reactor, InteractionType::Like)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already has"));

    // A different type from the same user is fine
    service
        .create_interaction(&recognition.id, &reactor, InteractionType::Celebrate)
        .await
        .expect("second type");

    service
        .remove_interaction(&recognition.id, &reactor, InteractionType::Like)
        .await
        .expect("removal");

    // Removing again is NotFound
    let err = service
        .remove_interaction(&recognition.id, &reactor, InteractionType::Like)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_interaction_on_missing_recognition() {
    require_emulator!();

    let db = common::test_db().await;
    let service = service(db);

    let err = service
        .create_interaction("no-such-recognition", "user-1", InteractionType::Support)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Recognition not found"));
}
