//! End-to-end tests: router + `SupabaseBackend` against a mocked project.
//!
//! Tests verify the HTTP requests that actually leave the relay.

use axum::http::{Method, StatusCode};
use httpmock::prelude::*;
use serde_json::json;

use roster_relay::{create_router, RouterConfig, SupabaseBackend};

use super::test_utils::send;

const KEY: &str = "service-role-test-key";

fn router_for(server: &MockServer) -> axum::Router {
    let backend = SupabaseBackend::new(&server.base_url(), KEY).unwrap();
    create_router(backend, RouterConfig::new().with_tracing(false))
}

#[tokio::test]
async fn test_student_classes_request_on_the_wire() {
    let server = MockServer::start_async().await;
    let rows = json!([{"id": 1, "classes": {"id": 7, "class_name": "Kata"}}]);

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/student_classes")
                .query_param("select", "*,classes(id,class_name,date,time,coach_assigned)")
                .query_param("profile_id", "eq.42")
                .header("apikey", KEY);
            then.status(200).json_body(rows.clone());
        })
        .await;

    let (status, body) = send(
        router_for(&server),
        Method::GET,
        "/api/student-classes?user_id=42",
        None,
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, rows);
}

#[tokio::test]
async fn test_create_class_then_link_on_the_wire() {
    let server = MockServer::start_async().await;

    let class_insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/classes")
                .query_param("select", "id")
                .header("prefer", "return=representation")
                .json_body(json!({"class_name": "Kata", "goal_id": 3}));
            then.status(201).json_body(json!({"id": 99}));
        })
        .await;

    let link_insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/class_goal_links")
                .header("prefer", "return=minimal")
                .json_body(json!({"class_id": 99, "goal_id": 3}));
            then.status(201);
        })
        .await;

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/api/classes",
        Some(json!({"class_name": "Kata", "goal_id": 3})),
    )
    .await;

    class_insert.assert_async().await;
    link_insert.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 99}));
}

#[tokio::test]
async fn test_coaches_request_on_the_wire() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("select", "username,Role")
                .query_param("Role", "ilike.coach");
            then.status(200)
                .json_body(json!([{"username": "sensei", "Role": "Coach"}]));
        })
        .await;

    let (status, body) = send(router_for(&server), Method::GET, "/api/coaches", None).await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"username": "sensei", "Role": "Coach"}]));
}

#[tokio::test]
async fn test_toggle_mark_on_the_wire() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/rpc/toggle_user_goal_mark")
                .json_body(json!({
                    "p_user_id": "u1",
                    "p_goal_id": 3,
                    "p_class_id": 7,
                    "p_mark": true
                }));
            then.status(200).json_body(json!({"progress": 5}));
        })
        .await;

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/api/toggle-mark",
        Some(json!({"userId": "u1", "goalId": 3, "classId": 7, "mark": true})),
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"progress": 5}));
}

#[tokio::test]
async fn test_login_on_the_wire() {
    let server = MockServer::start_async().await;

    let sign_in = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password");
            then.status(200).json_body(json!({
                "access_token": "jwt",
                "user": {"id": "u1", "email": "coach@dojo.test"}
            }));
        })
        .await;

    let role = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("select", "Role")
                .query_param("id", "eq.u1")
                .header("accept", "application/vnd.pgrst.object+json");
            then.status(200).json_body(json!({"Role": "COACH"}));
        })
        .await;

    let (status, body) = send(
        router_for(&server),
        Method::POST,
        "/api/auth/login",
        Some(json!({"email": "coach@dojo.test", "password": "pw"})),
    )
    .await;

    sign_in.assert_async().await;
    role.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"user": {"id": "u1", "email": "coach@dojo.test"}, "role": "COACH"})
    );
}

#[tokio::test]
async fn test_remote_error_relayed_as_400() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(406).json_body(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned"
            }));
        })
        .await;

    let (status, body) = send(
        router_for(&server),
        Method::GET,
        "/api/profiles/missing",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "JSON object requested, multiple (or no) rows returned"})
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_400() {
    let backend = SupabaseBackend::new("http://127.0.0.1:1", KEY).unwrap();
    let router = create_router(backend, RouterConfig::new().with_tracing(false));

    let (status, body) = send(router, Method::GET, "/api/goals", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Connection error"));
}
