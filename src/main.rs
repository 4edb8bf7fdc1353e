//! Haulwatch process entrypoint.
//!
//! ## Environment variables
//!
//! | Variable               | Required | Description                                   |
//! |------------------------|----------|-----------------------------------------------|
//! | `FLEET_BASE_URL`       | Yes      | Base endpoint of the fleet-tracking service   |
//! | `FLEET_CREDENTIALS`    | Yes      | Comma-list of API credentials (N ≥ 1)         |
//! | `DB_HOST` … `DB_PASSWORD` | No    | PostgreSQL connection parts (dev defaults)    |
//! | `SERVER_PORT`          | No       | Read-API port (default: 8080)                 |
//! | `OPERATIONAL_TZ`       | No       | IANA timezone (default: Asia/Yekaterinburg)   |
//! | `TEST_VEHICLE_IDS`     | No       | Comma-list of ids switching parsing to test mode |

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use haulwatch::api::{build_router, AppState};
use haulwatch::fleet::{DateTimeCodec, FleetClient, TokenPool, VehicleRateLimiter};
use haulwatch::pipeline::scheduler::run_scheduler;
use haulwatch::pipeline::{ShiftIngestor, SingleFlight};
use haulwatch::{storage, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "haulwatch", about = "Dump-truck fleet telemetry and shift KPI pipeline")]
struct CliArgs {
    /// Port to listen on (default: 8080)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,haulwatch=debug")),
        )
        .init();

    let args = CliArgs::parse();
    let config = AppConfig::from_env(args.port)?;
    info!(bind = %config.bind_address(), timezone = %config.operational_tz, "Starting Haulwatch");

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = storage::init_store(&config.database_url()).await?;

    // ── Fleet client ──────────────────────────────────────────────────────────
    let codec = DateTimeCodec::new(config.operational_tz);
    let tokens = Arc::new(TokenPool::new(config.fleet_credentials.clone())?);
    let limiter = Arc::new(VehicleRateLimiter::new(Duration::from_secs(
        config.vehicle_call_gap_secs,
    )));
    let client = FleetClient::new(&config.fleet_base_url, tokens, limiter, codec)?;

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let ingestor = Arc::new(ShiftIngestor::new(
        pool.clone(),
        client,
        config.test_vehicle_ids.clone(),
    ));
    let guard = SingleFlight::new();
    let cancel = CancellationToken::new();

    tokio::spawn(run_scheduler(
        Arc::clone(&ingestor),
        guard.clone(),
        config.operational_tz,
        cancel.child_token(),
    ));
    info!("Scheduler task started");

    // ── HTTP Server ───────────────────────────────────────────────────────────
    let state = Arc::new(AppState {
        db: pool.clone(),
        ingestor,
        guard,
        cancel: cancel.clone(),
    });
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address()).await?;
    info!(address = %config.bind_address(), "Haulwatch listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    // Scheduler and in-flight ingestion are cancelled; drain the pool last.
    cancel.cancel();
    pool.close().await;
    info!("Haulwatch shut down gracefully");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM, cancelling background work first.
async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
    info!("Shutdown signal received");
    cancel.cancel();
}
