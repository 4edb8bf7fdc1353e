//! Spatio-temporal analysis of vehicle tracks
//!
//! CPU-bound pure functions, no suspension points: zone-event derivation,
//! work-object detection, trip pairing, work-type classification and KPI
//! calculation. Everything operates on values; persistence happens
//! elsewhere.

pub mod kpi;
pub mod object_detect;
pub mod trip_builder;
pub mod work_type;
pub mod zone_events;

pub use kpi::{calculate_kpis, ShiftKpis};
pub use object_detect::detect_object;
pub use trip_builder::{build_trips, TripThresholds};
pub use work_type::classify_work_type;
pub use zone_events::{derive_zone_events, onsite_sec};
