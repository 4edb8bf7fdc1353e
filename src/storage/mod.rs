//! Persistence layer
//!
//! Store bootstrap plus the read-only geofence snapshot and the idempotent
//! write contracts: merge-by-unique-key upserts and delete-all-then-insert
//! replace-sets executed inside the caller's transaction.

pub mod geofences;
pub mod requests;
pub mod route_lists;
pub mod shift_records;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::PipelineError;

/// One bounded pool is shared by the ingestion run and the read API; the
/// process runs single-instance, so this is the whole write concurrency.
const POOL_MAX_CONNECTIONS: u32 = 10;
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the shared pool and bring both schemas up to date.
///
/// Bundled migrations run before the pool is handed out, so every caller
/// sees the `geo` and `dump_trucks` schemas in place. Any failure here is
/// fatal to startup.
pub async fn init_store(database_url: &str) -> Result<PgPool, PipelineError> {
    let pool = PgPoolOptions::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    info!(
        max_connections = POOL_MAX_CONNECTIONS,
        "store pool opened"
    );

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;
    info!("geo and dump_trucks schemas migrated");

    Ok(pool)
}
