//! User progress and mark toggling integration tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use roster_relay::error::BackendError;

use super::test_utils::{router_for, send, Call, MockBackend};

#[tokio::test]
async fn test_user_progress_aggregates_three_reads() {
    let goal_progress = json!([{"goal_id": 1, "progress": 3, "advancement": "yellow"}]);
    let attendance = json!([{"goal_id": 1, "attended": 5}]);
    let marks = json!([{"goal_id": 1, "class_id": 7}]);

    let backend = MockBackend::new()
        .respond(goal_progress.clone())
        .respond(attendance.clone())
        .respond(marks.clone());

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/user-progress/u1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"goalProgress": goal_progress, "attendance": attendance, "marks": marks})
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);

    let Call::Query(ref completions) = calls[0] else {
        panic!("expected completions read, got {:?}", calls[0]);
    };
    assert_eq!(completions.table(), "user_goal_completions");
    assert_eq!(completions.columns(), Some("goal_id, progress, advancement"));
    assert_eq!(completions.filters()[0].column, "user_id");
    assert_eq!(completions.filters()[0].value, "u1");

    assert_eq!(
        calls[1],
        Call::Rpc {
            function: "get_user_attendance_counts".to_string(),
            params: json!({"p_user_id": "u1"}),
        }
    );

    let Call::Query(ref marks_query) = calls[2] else {
        panic!("expected marks read, got {:?}", calls[2]);
    };
    assert_eq!(marks_query.table(), "user_goal_class_marks");
    assert_eq!(marks_query.columns(), Some("goal_id, class_id"));
    assert_eq!(marks_query.filters()[0].column, "user_id");
    assert_eq!(marks_query.filters()[0].value, "u1");
}

#[tokio::test]
async fn test_user_progress_failure_is_400() {
    let backend = MockBackend::new()
        .respond(json!([]))
        .reject("function get_user_attendance_counts(p_user_id => text) does not exist");

    let (status, body) = send(
        router_for(&backend),
        Method::GET,
        "/api/user-progress/u1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "function get_user_attendance_counts(p_user_id => text) does not exist"
    );
    // The marks read is never attempted
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_toggle_mark_renames_params_and_relays_result() {
    let result = json!({"marked": true, "progress": 4});
    let backend = MockBackend::new().respond(result.clone());

    let (status, body) = send(
        router_for(&backend),
        Method::POST,
        "/api/toggle-mark",
        Some(json!({"userId": "u1", "goalId": 3, "classId": 7, "mark": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, result);
    assert_eq!(
        backend.calls(),
        vec![Call::Rpc {
            function: "toggle_user_goal_mark".to_string(),
            params: json!({
                "p_user_id": "u1",
                "p_goal_id": 3,
                "p_class_id": 7,
                "p_mark": true
            }),
        }]
    );
}

#[tokio::test]
async fn test_toggle_mark_scalar_result_verbatim() {
    let backend = MockBackend::new().respond(json!(false));

    let (status, body) = send(
        router_for(&backend),
        Method::POST,
        "/api/toggle-mark",
        Some(json!({"userId": "u1", "goalId": 3, "classId": 7, "mark": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(false));
}

#[tokio::test]
async fn test_toggle_mark_transport_failure_is_400() {
    let backend = MockBackend::new()
        .fail_with(BackendError::Transport("connection refused".to_string()));

    let (status, body) = send(
        router_for(&backend),
        Method::POST,
        "/api/toggle-mark",
        Some(json!({"userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Connection error: connection refused"}));
}
