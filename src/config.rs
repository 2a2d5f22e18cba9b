//! Configuration management for Roster Relay.
//!
//! This module provides the command-line interface and its settings:
//! - Command-line arguments via clap
//! - Environment variables for everything a deployment sets
//! - Defaults that let the server start against a local Supabase stack
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use roster_relay::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {}", config.backend.supabase_url),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 3000)
//! - `SUPABASE_URL` - Project base URL (default: http://localhost:54321)
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service role key (default: a placeholder)
//! - `CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use clap::{Args, Parser, Subcommand};
use url::Url;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default project URL (the Supabase CLI's local API gateway).
pub const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";

/// Placeholder used when no service role key is configured.
pub const PLACEHOLDER_SERVICE_KEY: &str = "your-service-role-key";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Roster Relay - an HTTP API over a hosted Supabase project.
///
/// Every route forwards to the project's data, auth or stored-procedure API
/// and relays the result. Runs the server when no subcommand is given.
#[derive(Parser, Debug, Clone)]
#[command(name = "roster-relay")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Validate configuration and test connectivity to the backend.
    Check(CheckConfig),
}

/// Settings for reaching the hosted backend.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL of the Supabase project.
    #[arg(long, default_value = DEFAULT_SUPABASE_URL, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Service role key used for every forwarded call.
    #[arg(
        long,
        default_value = PLACEHOLDER_SERVICE_KEY,
        env = "SUPABASE_SERVICE_ROLE_KEY",
        hide_env_values = true
    )]
    pub service_role_key: String,
}

impl BackendArgs {
    /// Validate the backend settings and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.supabase_url.trim().is_empty() {
            return Err("Supabase URL is required. Set --supabase-url or SUPABASE_URL".to_string());
        }

        let url = Url::parse(&self.supabase_url)
            .map_err(|e| format!("Invalid Supabase URL '{}': {}", self.supabase_url, e))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "Supabase URL must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.service_role_key.trim().is_empty() {
            return Err(
                "Service role key is empty. Set --service-role-key or SUPABASE_SERVICE_ROLE_KEY"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Whether the key is still the built-in placeholder.
    pub fn uses_placeholder_key(&self) -> bool {
        self.service_role_key == PLACEHOLDER_SERVICE_KEY
    }
}

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Backend Configuration
    // =========================================================================
    #[command(flatten)]
    pub backend: BackendArgs,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host is required. Set --host or HOST".to_string());
        }

        self.backend.validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
