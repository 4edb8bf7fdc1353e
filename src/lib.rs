//! Haulwatch: Dump-Truck Fleet Telemetry & Shift KPIs
//!
//! Ingestion pipeline for a fleet-tracking service: per shift it pulls route
//! lists, work requests and GPS monitoring, correlates vehicle tracks with
//! stored geofence polygons, derives trips and utilisation KPIs, and persists
//! the result for the dashboard read API.
//!
//! ## Architecture
//!
//! - **Fleet client**: token-rotating, rate-limited, retrying HTTP client
//! - **Analysis**: zone-event derivation, object detection, trip building, KPIs
//! - **Pipeline**: shift-fetch orchestrator plus the wall-clock scheduler
//! - **Storage**: transactional upserts and replace-sets over PostgreSQL
//! - **API**: read-only JSON surface consumed by the dashboard

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod fleet;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-export the configuration root
pub use config::AppConfig;

// Re-export commonly used types
pub use types::{
    GeoObject, ShiftType, ShiftWindow, TrackPoint, Trip, VehicleMonitoring, WorkType, Zone,
    ZoneEvent, ZoneTag,
};

// Re-export pipeline entry points
pub use pipeline::{FetchSummary, ShiftIngestor, SingleFlight};

// Re-export the error root
pub use error::PipelineError;
