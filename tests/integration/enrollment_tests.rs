//! Enrollment, goal and goal-link integration tests.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use roster_relay::backend::Operation;

use super::test_utils::{router_for, send, MockBackend};

#[tokio::test]
async fn test_student_classes_filtered_by_user_with_nested_class() {
    let rows = json!([{
        "id": 1,
        "profile_id": "42",
        "class_id": 7,
        "classes": {"id": 7, "class_name": "Kata", "date": "2024-03-01", "time": "18:00", "coach_assigned": "sensei"}
    }]);
    let backend = MockBackend::new().respond(rows.clone());

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/student-classes?user_id=42",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, rows);

    let query = &backend.queries()[0];
    assert_eq!(query.table(), "student_classes");
    assert_eq!(
        query.query_pairs(),
        vec![
            (
                "select".to_string(),
                "*,classes(id,class_name,date,time,coach_assigned)".to_string()
            ),
            ("profile_id".to_string(), "eq.42".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_student_classes_without_user_is_unfiltered() {
    let backend = MockBackend::new().respond(json!([]));

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/student-classes",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(backend.queries()[0].filters().is_empty());
}

#[tokio::test]
async fn test_student_classes_bad_query_uses_error_shape() {
    let backend = MockBackend::new();

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/student-classes?user_id=1&user_id=2",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("duplicate field"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_create_student_class_returns_null() {
    let enrollment = json!({"profile_id": "42", "class_id": 7});
    let backend = MockBackend::new();

    let (status, body) = send(
        router_for(&backend),
        Method::POST,
        "/api/student-classes",
        Some(enrollment.clone()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let query = &backend.queries()[0];
    assert_eq!(query.operation(), &Operation::Insert(enrollment));
    assert_eq!(query.columns(), None);
}

#[tokio::test]
async fn test_create_student_class_duplicate_is_400() {
    let backend = MockBackend::new()
        .reject("duplicate key value violates unique constraint \"student_classes_pkey\"");

    let (status, body) = send(
        router_for(&backend),
        Method::POST,
        "/api/student-classes",
        Some(json!({"profile_id": "42", "class_id": 7})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "duplicate key value violates unique constraint \"student_classes_pkey\""
    );
}

#[tokio::test]
async fn test_goals_ordered_by_title() {
    let goals = json!([{"id": 1, "title": "Breakfalls"}, {"id": 2, "title": "Kicks"}]);
    let backend = MockBackend::new().respond(goals.clone());

    let (status, body) = send(router_for(&backend), Method::GET, "/api/goals", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, goals);
    assert_eq!(
        backend.queries()[0].query_pairs(),
        vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "title.asc".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_class_goal_links_embed_goals() {
    let links = json!([{
        "goal_id": 3,
        "goals": {"id": 3, "key": "kicks", "title": "Kicks", "required_sessions": 8, "advancement": "yellow"}
    }]);
    let backend = MockBackend::new().respond(links.clone());

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/class-goal-links/7",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, links);

    let query = &backend.queries()[0];
    assert_eq!(query.table(), "class_goal_links");
    assert_eq!(
        query.columns(),
        Some("goal_id, goals(id, key, title, required_sessions, advancement)")
    );
    assert_eq!(query.filters()[0].column, "class_id");
    assert_eq!(query.filters()[0].value, "7");
}
