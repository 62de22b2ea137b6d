// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests driven through the router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{add_daily_activities, completed, create_test_app, seed_user};

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = create_test_app();
    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_check_unknown_user_is_404() {
    let (app, _, _) = create_test_app();
    let (status, body) = send(app, "POST", "/api/users/nobody/achievements/check", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_check_then_list_and_progress() {
    let (app, _, db) = create_test_app();
    seed_user(&db, "u1").await;
    db.insert_activity(completed("u1", "a1", Utc::now().date_naive(), Some(1.0)));

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/users/u1/achievements/check",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let awarded = body["awarded"].as_array().unwrap();
    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0]["name"], "First Step");
    assert_eq!(body["progression"]["points"], 10);
    assert_eq!(body["progression"]["level"], 1);

    // Second check awards nothing new.
    let (_, body) = send(
        app.clone(),
        "POST",
        "/api/users/u1/achievements/check",
        None,
    )
    .await;
    assert!(body["awarded"].as_array().unwrap().is_empty());

    let (status, body) = send(app.clone(), "GET", "/api/users/u1/achievements", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        app.clone(),
        "GET",
        "/api/users/u1/achievements/progress",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    let first_step = entries
        .iter()
        .find(|e| e["name"] == "First Step")
        .unwrap();
    assert_eq!(first_step["earned"], true);
    assert_eq!(first_step["progress"], 100);
    let getting_started = entries
        .iter()
        .find(|e| e["name"] == "Getting Started")
        .unwrap();
    assert_eq!(getting_started["earned"], false);
    assert_eq!(getting_started["progress"], 20);

    let (status, body) = send(app, "GET", "/api/users/u1/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed_workouts"], 1);
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["achievements_earned"], 1);
}

#[tokio::test]
async fn test_partial_award_failure_lists_committed_awards() {
    let (app, _, db) = create_test_app();
    seed_user(&db, "u1").await;
    add_daily_activities(&db, "u1", Utc::now().date_naive(), 10, None);
    db.fail_award_writes_after(1);

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/users/u1/achievements/check",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    let committed = body["committed"].as_array().unwrap();
    assert_eq!(committed.len(), 1);

    let (_, listed) = send(app, "GET", "/api/users/u1/achievements", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], committed[0]["name"]);
}

#[tokio::test]
async fn test_get_definition_by_name() {
    let (app, state, _) = create_test_app();
    state.catalog.ensure_baseline(&[]).await.unwrap();

    let (status, body) = send(app.clone(), "GET", "/api/achievements/First%20Step", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requirement"]["metric"], "total_workouts");
    assert_eq!(body["type"], "workout-count");

    let (status, _) = send(app, "GET", "/api/achievements/Nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_definition() {
    let (app, _, _) = create_test_app();
    let new = json!({
        "name": "Early Bird",
        "description": "Complete 3 workouts",
        "type": "workout-count",
        "points": 15,
        "requirement": { "metric": "total_workouts", "value": 3 }
    });

    let (status, body) = send(app.clone(), "POST", "/api/achievements", Some(new.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Early Bird");

    let (status, body) = send(app.clone(), "POST", "/api/achievements", Some(new)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = send(app, "GET", "/api/achievements", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d["name"] == "Early Bird"));
}

#[tokio::test]
async fn test_create_definition_rejects_bad_input() {
    let (app, _, _) = create_test_app();

    let zero_points = json!({
        "name": "Freebie",
        "type": "workout-count",
        "points": 0,
        "requirement": { "metric": "total_workouts", "value": 1 }
    });
    let (status, _) = send(app.clone(), "POST", "/api/achievements", Some(zero_points)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown_metric = json!({
        "name": "Calorie Counter",
        "type": "workout-count",
        "points": 10,
        "requirement": { "metric": "calories", "value": 500 }
    });
    let (status, _) = send(app, "POST", "/api/achievements", Some(unknown_metric)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recalculate_and_leaderboard() {
    let (app, _, db) = create_test_app();
    for user_id in ["alice", "bob", "carol"] {
        seed_user(&db, user_id).await;
    }
    let today = Utc::now().date_naive();
    db.insert_activity(completed("alice", "a1", today, Some(5.0)));
    db.insert_activity(completed("bob", "b1", today, None));

    for user_id in ["alice", "bob"] {
        let uri = format!("/api/users/{}/achievements/check", user_id);
        let (status, _) = send(app.clone(), "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(app.clone(), "POST", "/api/users/bob/recalculate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 10);

    let (status, body) = send(app, "GET", "/api/leaderboard?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let board = body.as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["user_id"], "alice");
    assert_eq!(board[0]["points"], 30);
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[1]["user_id"], "bob");
}
