//! Roster Relay - an HTTP API over a hosted Supabase project.
//!
//! This binary parses the CLI, sets up logging and runs the server or the
//! connectivity check.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_relay::{
    backend::SupabaseBackend,
    config::{BackendArgs, CheckConfig, Cli, Command, ServeConfig},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let backend = match build_backend(&config.backend) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Roster Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Supabase URL: {}", backend.base_url());
    if config.backend.uses_placeholder_key() {
        warn!("  Service key: PLACEHOLDER - backend calls will be rejected");
        warn!("        Set SUPABASE_SERVICE_ROLE_KEY to the project's service role key");
    } else {
        info!("  Service key: configured");
    }
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }
    warn!("  Access control: NONE - every route is callable by any client");

    // Unlike a bad config, an unreachable backend is not fatal; it may come up later
    info!("");
    info!("Connecting to Supabase...");
    match backend.health().await {
        Ok(_) => info!("  Connected successfully"),
        Err(e) => {
            warn!("  Backend health check failed: {}", e);
            warn!("  Requests will return 400 until the backend is reachable");
        }
    }

    let router_config = build_router_config(&config);
    let router = create_router(backend, router_config);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/api/classes", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "roster_relay=debug,tower_http=debug"
    } else {
        "roster_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_backend(args: &BackendArgs) -> Result<SupabaseBackend, String> {
    SupabaseBackend::new(&args.supabase_url, &args.service_role_key).map_err(|e| e.to_string())
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Roster Relay Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Err(e) = config.backend.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let backend = match build_backend(&config.backend) {
        Ok(backend) => {
            println!("✓ Supabase URL: {}", backend.base_url());
            backend
        }
        Err(e) => {
            println!("✗ Supabase URL: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.backend.uses_placeholder_key() {
        println!("! Service key: placeholder (set SUPABASE_SERVICE_ROLE_KEY)");
    } else {
        println!("✓ Service key: configured");
    }
    println!();

    print!("Testing Supabase connection... ");

    match backend.health().await {
        Ok(_) => {
            println!("✓ success");
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - The project URL is correct and reachable");
            println!("  - The service role key belongs to this project");
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
