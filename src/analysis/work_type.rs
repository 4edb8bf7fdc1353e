//! Shift-role classification from derived activity.

use crate::types::{Trip, WorkType};

/// Classify the vehicle's shift role.
///
/// Any completed trip means delivery work; otherwise a vehicle that spent at
/// least 60% of its engine time inside the site perimeter was working on
/// site; anything else is unknown.
pub fn classify_work_type(engine_time_sec: i64, onsite_sec: i64, trips: &[Trip]) -> WorkType {
    if !trips.is_empty() {
        return WorkType::Delivery;
    }
    if engine_time_sec > 0 && (onsite_sec as f64 / engine_time_sec as f64) * 100.0 >= 60.0 {
        return WorkType::Onsite;
    }
    WorkType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn one_trip() -> Vec<Trip> {
        vec![Trip {
            trip_number: 1,
            loaded_at: Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, 0).unwrap(),
            unloaded_at: None,
            loading_zone: "L1".into(),
            unloading_zone: "U1".into(),
            duration_min: None,
            volume_m3: 0.0,
        }]
    }

    #[test]
    fn trips_mean_delivery() {
        assert_eq!(classify_work_type(0, 0, &one_trip()), WorkType::Delivery);
    }

    #[test]
    fn onsite_needs_sixty_percent_of_engine_time() {
        assert_eq!(classify_work_type(1000, 600, &[]), WorkType::Onsite);
        assert_eq!(classify_work_type(1000, 599, &[]), WorkType::Unknown);
    }

    #[test]
    fn dead_engine_is_unknown() {
        assert_eq!(classify_work_type(0, 600, &[]), WorkType::Unknown);
    }
}
