// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and are
//! skipped otherwise. Set FIRESTORE_EMULATOR_HOST to run them.

use study_planner::db::DocumentStore;
use study_planner::models::{
    InputDetails, ProfileCreation, Task, TimetableData, TimetableDocument, TimetablePayload,
    UserProfile,
};

mod common;
use common::test_db;

/// Generate a unique ID for test isolation.
fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn test_timetable(id: &str, user_id: &str, created_at: &str) -> TimetableDocument {
    let mut timetable = TimetableData::new();
    timetable.insert(
        "Monday",
        vec![Task {
            id: "Monday-Algebrabasics".to_string(),
            description: "Algebra basics".to_string(),
            hours: 2.0,
            completed: false,
        }],
    );

    TimetableDocument {
        id: id.to_string(),
        user_id: user_id.to_string(),
        data: TimetablePayload {
            timetable,
            input_details: InputDetails {
                availability: "evenings".to_string(),
                start_date: "2024-01-01".to_string(),
                study_time: "2h/day".to_string(),
            },
        },
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
    }
}

fn test_profile(uid: &str) -> UserProfile {
    UserProfile {
        uid: uid.to_string(),
        email: "test@example.com".to_string(),
        display_name: "Test".to_string(),
        username: None,
        phone: None,
        institution: Some("Test University".to_string()),
        study_goal: None,
        grade: None,
        created_at: "2024-01-15T10:00:00.000Z".to_string(),
        updated_at: "2024-01-15T10:00:00.000Z".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TIMETABLE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_timetable_moves_pointer() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let doc = test_timetable(&unique_id("tt"), &user_id, "2024-01-01T00:00:00.000Z");

    db.create_timetable(&doc).await.unwrap();

    let fetched = db.get_timetable(&doc.id).await.unwrap().unwrap();
    assert_eq!(fetched, doc);

    let pointer = db.get_current_pointer(&user_id).await.unwrap().unwrap();
    assert_eq!(pointer.timetable_id, doc.id);
}

#[tokio::test]
async fn test_latest_timetable_by_created_at() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");

    for (n, created_at) in [
        (2, "2024-01-02T00:00:00.000Z"),
        (3, "2024-01-03T00:00:00.000Z"),
        (1, "2024-01-01T00:00:00.000Z"),
    ] {
        let doc = test_timetable(&format!("{user_id}-t{n}"), &user_id, created_at);
        db.save_timetable(&doc).await.unwrap();
    }

    let latest = db.latest_timetable_for_user(&user_id).await.unwrap().unwrap();
    assert_eq!(latest.id, format!("{user_id}-t3"));

    let none = db
        .latest_timetable_for_user(&unique_id("nobody"))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_save_timetable_overwrites() {
    require_emulator!();

    let db = test_db().await;
    let mut doc = test_timetable(&unique_id("tt"), &unique_id("user"), "2024-01-01T00:00:00.000Z");
    db.create_timetable(&doc).await.unwrap();

    doc.data.input_details.availability = "weekends".to_string();
    doc.updated_at = "2024-01-05T00:00:00.000Z".to_string();
    db.save_timetable(&doc).await.unwrap();

    let fetched = db.get_timetable(&doc.id).await.unwrap().unwrap();
    assert_eq!(fetched.data.input_details.availability, "weekends");
    assert_eq!(fetched.created_at, "2024-01-01T00:00:00.000Z");
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_profile_is_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("uid");
    let profile = test_profile(&uid);

    let first = db.create_profile(&profile).await.unwrap();
    assert_eq!(first, ProfileCreation::Created(profile.clone()));

    let mut changed = profile.clone();
    changed.display_name = "Someone Else".to_string();
    let second = db.create_profile(&changed).await.unwrap();
    assert_eq!(second, ProfileCreation::Existing(profile));
}

#[tokio::test]
async fn test_missing_profile_is_none() {
    require_emulator!();

    let db = test_db().await;
    assert!(db.get_profile(&unique_id("uid")).await.unwrap().is_none());
}
