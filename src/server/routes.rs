//! Router configuration for Roster Relay.
//!
//! This module defines the HTTP routes and applies the CORS and tracing
//! middleware.
//!
//! # Route Structure
//!
//! ```text
//! /health                              - Health check
//! /api/auth/login                      - POST
//! /api/auth/signup                     - POST
//! /api/classes                         - GET, POST
//! /api/classes/{id}                    - GET, PUT, DELETE
//! /api/student-classes                 - GET (?user_id=), POST
//! /api/goals                           - GET
//! /api/class-goal-links/{class_id}     - GET
//! /api/profiles/{id}                   - GET, PUT
//! /api/user-progress/{user_id}         - GET
//! /api/toggle-mark                     - POST
//! /api/coaches                         - GET
//! ```
//!
//! None of the routes check who is calling; access control is left to the
//! backend's own policies.
//!
//! # Example
//!
//! ```ignore
//! use roster_relay::backend::SupabaseBackend;
//! use roster_relay::server::routes::{create_router, RouterConfig};
//!
//! let backend = SupabaseBackend::new("https://project.supabase.co", "service-key")?;
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(backend, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::Method;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    class_goal_links_handler, create_class_handler, create_student_class_handler,
    delete_class_handler, get_class_handler, get_profile_handler, health_handler,
    list_classes_handler, list_coaches_handler, list_goals_handler, list_student_classes_handler,
    login_handler, signup_handler, toggle_mark_handler, update_class_handler,
    update_profile_handler, user_progress_handler, AppState,
};
use crate::backend::Backend;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `backend` - The backend every route forwards to
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<B>(backend: B, config: RouterConfig) -> Router
where
    B: Backend + 'static,
{
    let app_state = AppState::new(backend);
    let cors = build_cors_layer(&config);

    let api_routes = Router::new()
        .route("/auth/login", post(login_handler::<B>))
        .route("/auth/signup", post(signup_handler::<B>))
        .route(
            "/classes",
            get(list_classes_handler::<B>).post(create_class_handler::<B>),
        )
        .route(
            "/classes/{id}",
            get(get_class_handler::<B>)
                .put(update_class_handler::<B>)
                .delete(delete_class_handler::<B>),
        )
        .route(
            "/student-classes",
            get(list_student_classes_handler::<B>).post(create_student_class_handler::<B>),
        )
        .route("/goals", get(list_goals_handler::<B>))
        .route(
            "/class-goal-links/{class_id}",
            get(class_goal_links_handler::<B>),
        )
        .route(
            "/profiles/{id}",
            get(get_profile_handler::<B>).put(update_profile_handler::<B>),
        )
        .route("/user-progress/{user_id}", get(user_progress_handler::<B>))
        .route("/toggle-mark", post(toggle_mark_handler::<B>))
        .route("/coaches", get(list_coaches_handler::<B>))
        .with_state(app_state);

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// Requested headers are mirrored back on preflight, so clients may send
/// their own headers alongside `Authorization` and `Content-Type`.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
