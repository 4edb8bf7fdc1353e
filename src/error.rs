//! Pipeline error taxonomy
//!
//! Errors attributable to a single vehicle never terminate a run; errors
//! before the vehicle loop (route-list fetch, zone load) abort it.

use crate::fleet::FleetError;

/// Top-level ingestion pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Mandatory configuration is absent. Fatal at startup.
    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    /// The fleet client gave up after exhausting a retry budget.
    #[error("fleet service: {0}")]
    Fleet(#[from] FleetError),

    /// The geofence store returned no zones; the run has nothing to do.
    #[error("no geofence zones loaded")]
    ZonesEmpty,

    /// A stored zone geometry could not be decoded.
    #[error("invalid geometry for zone {zone_uid}: {message}")]
    GeometryInvalid { zone_uid: String, message: String },

    /// Database failure. Per-vehicle transactions roll back and the run
    /// continues; pool or migration failures are fatal.
    #[error("persistence: {0}")]
    Persistence(#[from] sqlx::Error),
}
