//! Derived shift artefacts: zone events, trips, work types and the KPI row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::shift::ShiftType;
use super::zone::ZoneTag;

/// The result of reducing a track against one zone: a single stay.
///
/// `exited_at` is `None` when the vehicle was still inside at the end of the
/// observed track; `duration_sec` is present exactly when the exit is.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEvent {
    pub zone_uid: String,
    pub zone_name: String,
    pub zone_tag: ZoneTag,
    pub object_uid: String,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub duration_sec: Option<i64>,
}

/// One load-haul-dump cycle: a loading stay paired with an unloading stay.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// 1-based, monotonically increasing per shift.
    pub trip_number: i32,
    /// Moment the loading stay completed.
    pub loaded_at: DateTime<Utc>,
    /// Moment the unloading stay completed, when observed.
    pub unloaded_at: Option<DateTime<Utc>>,
    pub loading_zone: String,
    pub unloading_zone: String,
    /// Full cycle length, loading entry to unloading exit, in minutes.
    pub duration_min: Option<i64>,
    /// Hauled volume. Reserved for future capacity data; currently always 0.
    pub volume_m3: f64,
}

/// Shift role of a vehicle, classified from its derived activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    /// At least one complete trip.
    Delivery,
    /// No trips, but mostly on site while the engine ran.
    Onsite,
    Unknown,
}

impl WorkType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkType::Delivery => "delivery",
            WorkType::Onsite => "onsite",
            WorkType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for WorkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the persistence layer needs to upsert one shift KPI row.
///
/// `(report_date, shift_type, vehicle_id, object_uid)` is the unique key;
/// all other columns are overwritten on conflict.
#[derive(Debug, Clone)]
pub struct NewShiftRecord {
    pub report_date: NaiveDate,
    pub shift_type: ShiftType,
    pub vehicle_id: i64,
    pub object_uid: String,
    pub object_name: String,
    pub vehicle_name: String,
    pub plate: String,
    pub engine_time_sec: i64,
    pub moving_time_sec: i64,
    pub distance_km: f64,
    pub onsite_min: i64,
    pub trips_count: i64,
    pub fact_volume_m3: f64,
    pub kip_pct: f64,
    pub movement_pct: f64,
    pub work_type: WorkType,
    pub pl_id: Option<i64>,
    /// Set-valued, stored in insertion order.
    pub request_numbers: Vec<i64>,
    /// Raw monitoring envelope, retained verbatim.
    pub raw_monitoring: serde_json::Value,
}
