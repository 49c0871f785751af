// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile registration and update tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn register_request(token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/users/register")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let app = common::create_test_app(common::UNREACHABLE_AGENT);
    let token = common::create_test_jwt("u1", &app.state.config);

    let first = app
        .router
        .clone()
        .oneshot(register_request(
            &token,
            Body::from(json!({"institution": "MIT", "grade": "A"}).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let created = common::body_json(first).await;
    assert_eq!(created["uid"], "u1");
    assert_eq!(created["email"], "u1@example.com");
    assert_eq!(created["institution"], "MIT");

    // Second call, different body: no-op returning the stored profile
    let second = app
        .router
        .oneshot(register_request(
            &token,
            Body::from(json!({"institution": "Stanford"}).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let existing = common::body_json(second).await;
    assert_eq!(existing, created);
    assert_eq!(app.db.write_count(), 1);
}

#[tokio::test]
async fn test_register_accepts_empty_body() {
    let app = common::create_test_app(common::UNREACHABLE_AGENT);
    let token = common::create_test_jwt("u1", &app.state.config);

    let response = app
        .router
        .oneshot(register_request(&token, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["displayName"], "u1");
    assert!(body.get("grade").is_none());
}

#[tokio::test]
async fn test_fetch_missing_profile_is_not_found() {
    let app = common::create_test_app(common::UNREACHABLE_AGENT);
    let token = common::create_test_jwt("u1", &app.state.config);

    let response = app
        .router
        .oneshot(common::get_request("/api/users/profile/u1", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_by_owner() {
    let app = common::create_test_app(common::UNREACHABLE_AGENT);
    let token = common::create_test_jwt("u1", &app.state.config);

    let response = app
        .router
        .clone()
        .oneshot(register_request(&token, Body::empty()))
        .await
        .unwrap();
    let created = common::body_json(response).await;
    common::tick().await;

    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "PUT",
            "/api/users/profile/u1",
            &token,
            &json!({"studyGoal": "Pass finals", "phone": "555-0100"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = common::body_json(response).await;
    assert_eq!(updated["studyGoal"], "Pass finals");
    assert_eq!(updated["displayName"], created["displayName"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);

    let response = app
        .router
        .oneshot(common::get_request("/api/users/profile/u1", &token))
        .await
        .unwrap();
    let fetched = common::body_json(response).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_profile_update_by_other_user_is_forbidden() {
    let app = common::create_test_app(common::UNREACHABLE_AGENT);
    let owner = common::create_test_jwt("u1", &app.state.config);
    let intruder = common::create_test_jwt("u2", &app.state.config);

    app.router
        .clone()
        .oneshot(register_request(&owner, Body::empty()))
        .await
        .unwrap();
    let writes_before = app.db.write_count();

    let response = app
        .router
        .oneshot(common::json_request(
            "PUT",
            "/api/users/profile/u1",
            &intruder,
            &json!({"displayName": "Hijacked"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.db.write_count(), writes_before);
}
