//! Core domain types shared across the pipeline, storage and API layers.

pub mod monitoring;
pub mod record;
pub mod shift;
pub mod zone;

pub use monitoring::{TrackPoint, VehicleMonitoring};
pub use record::{NewShiftRecord, Trip, WorkType, ZoneEvent};
pub use shift::{ShiftType, ShiftWindow};
pub use zone::{GeoObject, Zone, ZoneTag};
