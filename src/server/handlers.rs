//! HTTP request handlers for the Roster Relay API.
//!
//! Every handler follows the same shape: read the path, query or body,
//! forward one call (at most a short fixed sequence) to the [`Backend`], and
//! relay the payload. Any backend failure becomes `400 {"error": message}`.
//!
//! # Endpoints
//!
//! - `POST /api/auth/login`, `POST /api/auth/signup`
//! - `GET|POST /api/classes`, `GET|PUT|DELETE /api/classes/{id}`
//! - `GET|POST /api/student-classes`
//! - `GET /api/goals`, `GET /api/class-goal-links/{class_id}`
//! - `GET|PUT /api/profiles/{id}`
//! - `GET /api/user-progress/{user_id}`, `POST /api/toggle-mark`
//! - `GET /api/coaches`
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::backend::{Backend, Credentials, TableQuery};
use crate::error::BackendError;

// =============================================================================
// Tables and Procedures
// =============================================================================

const PROFILES: &str = "profiles";
const CLASSES: &str = "classes";
const CLASS_GOAL_LINKS: &str = "class_goal_links";
const STUDENT_CLASSES: &str = "student_classes";
const GOALS: &str = "goals";
const USER_GOAL_COMPLETIONS: &str = "user_goal_completions";
const USER_GOAL_CLASS_MARKS: &str = "user_goal_class_marks";

const ATTENDANCE_COUNTS_RPC: &str = "get_user_attendance_counts";
const TOGGLE_MARK_RPC: &str = "toggle_user_goal_mark";

const STUDENT_CLASS_COLUMNS: &str = "*, classes(id, class_name, date, time, coach_assigned)";
const CLASS_GOAL_COLUMNS: &str = "goal_id, goals(id, key, title, required_sessions, advancement)";

/// Role reported at login when the profile has none.
pub const DEFAULT_ROLE: &str = "STUDENT";

/// Request body keys of `/api/toggle-mark` and the procedure parameters they map to.
const TOGGLE_MARK_PARAMS: [(&str, &str); 4] = [
    ("userId", "p_user_id"),
    ("goalId", "p_goal_id"),
    ("classId", "p_class_id"),
    ("mark", "p_mark"),
];

// =============================================================================
// Application State
// =============================================================================

/// Shared application state holding the backend client.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<B: Backend> {
    /// The backend every route forwards to
    pub backend: Arc<B>,
}

impl<B: Backend> AppState<B> {
    /// Create a new application state around the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<Value>,

    /// Accepted for client compatibility; uploads are not handled here.
    pub avatar: Option<Value>,
}

/// Query parameters for the enrollment listing.
#[derive(Debug, Deserialize)]
pub struct StudentClassesQueryParams {
    /// Only return enrollments of this profile
    #[serde(default)]
    pub user_id: Option<String>,
}

/// JSON body extractor whose rejection uses the uniform error shape.
///
/// Axum's own `Json` rejects with plain text and a variety of status codes;
/// this keeps every failure of the API at `400 {"error": ...}`.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Query string extractor with the same uniform rejection as [`JsonBody`].
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// The forwarded call failed
    Backend(BackendError),

    /// The request body was not the JSON the route reads
    InvalidBody(String),

    /// The query string could not be read
    InvalidQuery(String),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

/// Convert ApiError to HTTP response.
///
/// The status is always 400. Logging still tells a rejected call (debug)
/// from a backend that could not be reached or understood (error).
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;

        let message = match &self {
            ApiError::Backend(err) if err.is_rejection() => {
                debug!(status = status.as_u16(), "Backend rejected call: {}", err);
                err.to_string()
            }
            ApiError::Backend(err) => {
                error!(status = status.as_u16(), "Backend call failed: {}", err);
                err.to_string()
            }
            ApiError::InvalidBody(message) => {
                debug!(status = status.as_u16(), "Invalid request body: {}", message);
                message.clone()
            }
            ApiError::InvalidQuery(message) => {
                debug!(status = status.as_u16(), "Invalid query string: {}", message);
                message.clone()
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// Value Helpers
// =============================================================================

/// Loose truthiness: `null`, `false`, `0` and `""` count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value as a PostgREST filter operand.
fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rename the toggle-mark body keys to the procedure's parameter names.
///
/// Keys absent from the body are left out rather than sent as `null`.
pub fn toggle_mark_params(body: &Value) -> Value {
    let mut params = Map::new();
    for (field, param) in TOGGLE_MARK_PARAMS {
        if let Some(value) = body.get(field) {
            params.insert(param.to_string(), value.clone());
        }
    }
    Value::Object(params)
}

// =============================================================================
// Auth Handlers
// =============================================================================

/// Handle password login.
///
/// # Endpoint
///
/// `POST /api/auth/login` with `{"email": ..., "password": ...}`
///
/// # Response
///
/// `200 OK` with `{"user": <auth user>, "role": <profile Role>}`. The role
/// falls back to `"STUDENT"` when the profile cannot be read or has no role;
/// only the sign-in itself can fail the request.
pub async fn login_handler<B: Backend>(
    State(state): State<AppState<B>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let credentials = Credentials {
        email: body.email,
        password: body.password,
    };

    let user = state.backend.sign_in_with_password(&credentials).await?;

    let profile = match user.get("id") {
        Some(id) => state
            .backend
            .execute(
                TableQuery::from(PROFILES)
                    .select("Role")
                    .eq("id", filter_value(id))
                    .single(),
            )
            .await
            .map_err(|e| debug!("Role lookup failed, using default: {}", e))
            .ok(),
        None => None,
    };

    let role = profile
        .as_ref()
        .and_then(|p| p.get("Role"))
        .filter(|r| is_truthy(r))
        .cloned()
        .unwrap_or_else(|| Value::from(DEFAULT_ROLE));

    Ok(Json(json!({ "user": user, "role": role })))
}

/// Handle account creation.
///
/// # Endpoint
///
/// `POST /api/auth/signup` with `{"email", "password", "username", "avatar"}`
///
/// Creates the auth user, then upserts its profile row with the username.
/// The two calls are not transactional: a failed upsert returns 400 with the
/// account already created.
pub async fn signup_handler<B: Backend>(
    State(state): State<AppState<B>>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<Json<Value>, ApiError> {
    let credentials = Credentials {
        email: body.email,
        password: body.password,
    };

    let user = state.backend.sign_up(&credentials).await?;

    let mut profile = Map::new();
    if let Some(id) = user.get("id") {
        profile.insert("id".to_string(), id.clone());
    }
    if let Some(username) = body.username {
        profile.insert("username".to_string(), username);
    }

    state
        .backend
        .execute(TableQuery::from(PROFILES).upsert(Value::Object(profile)))
        .await?;

    if body.avatar.as_ref().is_some_and(is_truthy) {
        debug!("Signup included an avatar; avatar upload is not supported");
    }

    Ok(Json(json!({ "user": user })))
}

// =============================================================================
// Class Handlers
// =============================================================================

/// `GET /api/classes` - all classes ordered by date.
pub async fn list_classes_handler<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Value>, ApiError> {
    let classes = state
        .backend
        .execute(TableQuery::from(CLASSES).select("*").order("date", true))
        .await?;
    Ok(Json(classes))
}

/// `GET /api/classes/{id}` - one class; 400 when it does not exist.
pub async fn get_class_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let class = state
        .backend
        .execute(TableQuery::from(CLASSES).select("*").eq("id", id).single())
        .await?;
    Ok(Json(class))
}

/// Handle class creation.
///
/// # Endpoint
///
/// `POST /api/classes` with the class row as body.
///
/// The body is inserted as-is. When it carries a truthy `goal_id`, a
/// `class_goal_links` row linking the new class to that goal is inserted
/// afterwards. A failed link insert returns 400 and leaves the class in place.
///
/// # Response
///
/// `200 OK` with `{"id": <new class id>}`.
pub async fn create_class_handler<B: Backend>(
    State(state): State<AppState<B>>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let goal_id = body.get("goal_id").filter(|v| is_truthy(v)).cloned();

    let created = state
        .backend
        .execute(TableQuery::from(CLASSES).insert(body).select("id").single())
        .await?;

    if let Some(goal_id) = goal_id {
        let class_id = created.get("id").cloned().unwrap_or(Value::Null);
        state
            .backend
            .execute(
                TableQuery::from(CLASS_GOAL_LINKS)
                    .insert(json!({ "class_id": class_id, "goal_id": goal_id })),
            )
            .await?;
    }

    Ok(Json(created))
}

/// `PUT /api/classes/{id}` - apply the body as changes; returns updated rows.
pub async fn update_class_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .backend
        .execute(
            TableQuery::from(CLASSES)
                .update(changes)
                .eq("id", id)
                .select("*"),
        )
        .await?;
    Ok(Json(updated))
}

/// `DELETE /api/classes/{id}` - returns `{"success": true}`.
pub async fn delete_class_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .backend
        .execute(TableQuery::from(CLASSES).delete().eq("id", id))
        .await?;
    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Enrollment Handlers
// =============================================================================

/// Handle enrollment listing.
///
/// # Endpoint
///
/// `GET /api/student-classes?user_id={profile_id}`
///
/// Each enrollment row is returned with its class embedded
/// (`id`, `class_name`, `date`, `time`, `coach_assigned`). Without
/// `user_id` the listing is not filtered.
pub async fn list_student_classes_handler<B: Backend>(
    State(state): State<AppState<B>>,
    QueryParams(params): QueryParams<StudentClassesQueryParams>,
) -> Result<Json<Value>, ApiError> {
    let mut query = TableQuery::from(STUDENT_CLASSES).select(STUDENT_CLASS_COLUMNS);
    if let Some(user_id) = params.user_id {
        query = query.eq("profile_id", user_id);
    }

    let enrollments = state.backend.execute(query).await?;
    Ok(Json(enrollments))
}

/// `POST /api/student-classes` - insert the body; the service returns no rows.
pub async fn create_student_class_handler<B: Backend>(
    State(state): State<AppState<B>>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .backend
        .execute(TableQuery::from(STUDENT_CLASSES).insert(body))
        .await?;
    Ok(Json(result))
}

// =============================================================================
// Goal Handlers
// =============================================================================

/// `GET /api/goals` - all goal definitions ordered by title.
pub async fn list_goals_handler<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Value>, ApiError> {
    let goals = state
        .backend
        .execute(TableQuery::from(GOALS).select("*").order("title", true))
        .await?;
    Ok(Json(goals))
}

/// `GET /api/class-goal-links/{class_id}` - goals linked to a class.
pub async fn class_goal_links_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(class_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let links = state
        .backend
        .execute(
            TableQuery::from(CLASS_GOAL_LINKS)
                .select(CLASS_GOAL_COLUMNS)
                .eq("class_id", class_id),
        )
        .await?;
    Ok(Json(links))
}

// =============================================================================
// Profile Handlers
// =============================================================================

/// `GET /api/profiles/{id}`
pub async fn get_profile_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .backend
        .execute(TableQuery::from(PROFILES).select("*").eq("id", id).single())
        .await?;
    Ok(Json(profile))
}

/// `PUT /api/profiles/{id}` - returns the updated profile object.
pub async fn update_profile_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .backend
        .execute(
            TableQuery::from(PROFILES)
                .update(changes)
                .eq("id", id)
                .select("*")
                .single(),
        )
        .await?;
    Ok(Json(profile))
}

/// `GET /api/coaches` - profiles whose role is "coach", any case.
pub async fn list_coaches_handler<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Value>, ApiError> {
    let coaches = state
        .backend
        .execute(
            TableQuery::from(PROFILES)
                .select("username, Role")
                .ilike("Role", "coach"),
        )
        .await?;
    Ok(Json(coaches))
}

// =============================================================================
// Progress Handlers
// =============================================================================

/// Handle the progress overview of one user.
///
/// # Endpoint
///
/// `GET /api/user-progress/{user_id}`
///
/// # Response
///
/// ```json
/// {
///   "goalProgress": [{ "goal_id": 1, "progress": 3, "advancement": "..." }],
///   "attendance": <get_user_attendance_counts result>,
///   "marks": [{ "goal_id": 1, "class_id": 7 }]
/// }
/// ```
///
/// The three reads are independent and run in order; the first failure
/// fails the request.
pub async fn user_progress_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let goal_progress = state
        .backend
        .execute(
            TableQuery::from(USER_GOAL_COMPLETIONS)
                .select("goal_id, progress, advancement")
                .eq("user_id", user_id.as_str()),
        )
        .await?;

    let attendance = state
        .backend
        .rpc(ATTENDANCE_COUNTS_RPC, json!({ "p_user_id": user_id.as_str() }))
        .await?;

    let marks = state
        .backend
        .execute(
            TableQuery::from(USER_GOAL_CLASS_MARKS)
                .select("goal_id, class_id")
                .eq("user_id", user_id.as_str()),
        )
        .await?;

    Ok(Json(json!({
        "goalProgress": goal_progress,
        "attendance": attendance,
        "marks": marks,
    })))
}

/// Handle goal mark toggling.
///
/// # Endpoint
///
/// `POST /api/toggle-mark` with `{"userId", "goalId", "classId", "mark"}`
///
/// Calls `toggle_user_goal_mark` with the fields renamed to
/// `p_user_id`, `p_goal_id`, `p_class_id` and `p_mark`, and returns the
/// procedure's result verbatim.
pub async fn toggle_mark_handler<B: Backend>(
    State(state): State<AppState<B>>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .backend
        .rpc(TOGGLE_MARK_RPC, toggle_mark_params(&body))
        .await?;
    Ok(Json(result))
}

// =============================================================================
// Health
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
