//! HTTP server layer for Roster Relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                  /api/...   and   /health                       │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │        routes           │  │
//! │  │ (forward + relay, 400 errors)│  │  (router, CORS, trace)  │  │
//! │  └──────────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, toggle_mark_params, ApiError, AppState, ErrorResponse, HealthResponse,
    JsonBody, LoginRequest, QueryParams, SignupRequest, StudentClassesQueryParams, DEFAULT_ROLE,
};
pub use routes::{create_router, RouterConfig};
