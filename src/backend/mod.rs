//! Client side of the relay: the hosted backend the routes forward to.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP handlers              │
//! └────────────────────┬────────────────────┘
//!                      │  TableQuery / rpc / auth
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Backend Trait              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            SupabaseBackend              │
//! │   /rest/v1 (PostgREST)  /auth/v1 (GoTrue)│
//! └─────────────────────────────────────────┘
//! ```

mod query;
mod supabase;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::BackendError;

pub use query::{Filter, FilterOp, Operation, Order, TableQuery, SINGLE_OBJECT_ACCEPT};
pub use supabase::SupabaseBackend;

/// Email/password pair forwarded to the auth service untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// The external service the routes forward to.
///
/// Implementations return the service's payload unmodified; handlers never
/// look inside it beyond the ids they need for a follow-up call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Password sign-in. Returns the authenticated user object.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Value, BackendError>;

    /// Account creation. Returns the new user object.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Value, BackendError>;

    /// Run one table query. Writes without a column list return `Null`.
    async fn execute(&self, query: TableQuery) -> Result<Value, BackendError>;

    /// Call a stored procedure with named parameters.
    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError>;
}
