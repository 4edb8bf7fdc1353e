//! Parsed GPS monitoring data for one vehicle over one shift window.

use chrono::{DateTime, Utc};

/// A single GPS fix, time-ordered within the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

/// Monitoring payload reduced to the fields the pipeline consumes.
///
/// The raw envelope is retained verbatim and persisted with the shift record.
#[derive(Debug, Clone)]
pub struct VehicleMonitoring {
    pub engine_time_sec: i64,
    pub moving_time_sec: i64,
    pub distance_km: f64,
    pub track: Vec<TrackPoint>,
    pub raw: serde_json::Value,
}
