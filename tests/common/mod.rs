// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use progression_engine::config::Config;
use progression_engine::db::{FirestoreDb, MemoryDb, UserStore};
use progression_engine::models::{ActivityRecord, ActivityStatus, User};
use progression_engine::routes::create_router;
use progression_engine::services::{AwardLedger, NotificationDispatcher};
use progression_engine::AppState;
use std::sync::Arc;

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

/// Fixed clock for award passes: 2024-06-10 12:00 UTC.
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
}

/// Build a completed activity.
#[allow(dead_code)]
pub fn completed(user_id: &str, id: &str, date: NaiveDate, distance: Option<f64>) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        status: ActivityStatus::Completed,
        date,
        distance,
        exercise_ids: vec![],
    }
}

/// One completed activity per day for `days` days ending on `today`.
#[allow(dead_code)]
pub fn add_daily_activities(
    db: &MemoryDb,
    user_id: &str,
    today: NaiveDate,
    days: i64,
    distance: Option<f64>,
) {
    for offset in 0..days {
        let date = today - Duration::days(offset);
        db.insert_activity(completed(
            user_id,
            &format!("{}-{}", user_id, offset),
            date,
            distance,
        ));
    }
}

/// Create a user with zero points.
#[allow(dead_code)]
pub async fn seed_user(db: &MemoryDb, user_id: &str) {
    db.save_user(&User::new(user_id, format!("Test {}", user_id)))
        .await
        .expect("Failed to save test user");
}

/// Award ledger over an in-memory store.
#[allow(dead_code)]
pub fn test_ledger(db: &MemoryDb, notifications: Option<NotificationDispatcher>) -> AwardLedger {
    AwardLedger::new(
        Arc::new(db.clone()),
        notifications,
        Arc::new(dashmap::DashMap::new()),
        30,
    )
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(db.clone()),
        None,
    ));

    (create_router(state.clone()), state, db)
}
