// SPDX-License-Identifier: MIT

//! API input validation tests.
//!
//! All of these requests must be rejected before any database access, so
//! they run against the offline mock.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_challenge_unknown_type() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/challenges",
            &token,
            json!({
                "title": "Step it up",
                "description": "Most steps wins",
                "challenge_type": "marathon",
                "duration_days": 7,
                "participant_user_ids": ["user-2"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_challenge_empty_title() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/challenges",
            &token,
            json!({
                "title": "",
                "description": "Most steps wins",
                "challenge_type": "step_competition",
                "duration_days": 7,
                "participant_user_ids": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_challenge_zero_duration() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/challenges",
            &token,
            json!({
                "title": "Step it up",
                "description": "Most steps wins",
                "challenge_type": "step_competition",
                "duration_days": 0,
                "participant_user_ids": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_rejects_negative_value() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/challenges/challenge-1/progress",
            &token,
            json!({ "progress": -10.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recognition_unknown_type() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/recognitions",
            &token,
            json!({
                "to_user_id": "user-2",
                "recognition_type": "gold_star"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recognition_message_too_long() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/teams/team-1/recognitions",
            &token,
            json!({
                "to_user_id": "user-2",
                "recognition_type": "clap",
                "message": "x".repeat(281)
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_interaction_unknown_type() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/recognitions/rec-1/interactions",
            &token,
            json!({ "interaction_type": "thumbs_up" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quest_notes_too_long() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/quests/quest-1/complete",
            &token,
            json!({ "notes": "x".repeat(281) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
