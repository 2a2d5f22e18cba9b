//! # Roster Relay
//!
//! An HTTP API for a class-and-progress tracker whose data, accounts and
//! stored procedures live in a hosted Supabase project.
//!
//! Each route forwards one request (or a short fixed sequence) to the
//! project and relays the result: the success payload is returned as-is with
//! `200`, and any failure is returned as `400 {"error": "<message>"}`.
//!
//! ## Architecture
//!
//! - [`backend`] - The `Backend` trait, PostgREST query descriptions and the
//!   `reqwest`-based Supabase client
//! - [`server`] - Axum handlers and router
//! - [`config`] - CLI and configuration types
//! - [`error`] - Backend error type
//!
//! ## Example
//!
//! ```rust,no_run
//! use roster_relay::{create_router, RouterConfig, SupabaseBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = SupabaseBackend::new("http://localhost:54321", "service-role-key")?;
//!     let router = create_router(backend, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use backend::{Backend, Credentials, Operation, SupabaseBackend, TableQuery};
pub use config::{BackendArgs, CheckConfig, Cli, Command, ServeConfig};
pub use error::BackendError;
pub use server::{
    create_router, health_handler, ApiError, AppState, ErrorResponse, HealthResponse,
    RouterConfig,
};
