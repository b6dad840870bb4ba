// SPDX-License-Identifier: MIT

use std::sync::Arc;
use teampulse::config::Config;
use teampulse::db::FirestoreDb;
use teampulse::routes::create_router;
use teampulse::services::NotifierService;
use teampulse::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let notifier = Arc::new(NotifierService::new(
        &config.gcp_project_id,
        &config.gcp_region,
    ));

    let state = Arc::new(AppState {
        config,
        db,
        notifier,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db().await;
    let notifier = Arc::new(NotifierService::new(
        &config.gcp_project_id,
        &config.gcp_region,
    ));

    let state = Arc::new(AppState {
        config,
        db,
        notifier,
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT for the given user, signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    teampulse::middleware::auth::create_jwt(user_id, signing_key).expect("jwt creation")
}
