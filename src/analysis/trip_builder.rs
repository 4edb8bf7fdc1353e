//! Trip pairing: match loading stays to unloading stays under dwell
//! thresholds and a maximum cycle duration.

use chrono::Duration;

use crate::types::{Trip, ZoneEvent, ZoneTag};

/// Dwell and cycle-length thresholds for trip pairing.
#[derive(Debug, Clone, Copy)]
pub struct TripThresholds {
    /// Minimum stay in a loading zone to count as a loading, seconds.
    pub min_loading_dwell_sec: i64,
    /// Minimum stay in an unloading zone to count as an unloading, seconds.
    pub min_unloading_dwell_sec: i64,
    /// Maximum load-to-dump cycle length, minutes.
    pub max_trip_duration_min: i64,
}

impl Default for TripThresholds {
    fn default() -> Self {
        Self {
            min_loading_dwell_sec: 180,
            min_unloading_dwell_sec: 180,
            max_trip_duration_min: 240,
        }
    }
}

/// Pair loading and unloading events into trips.
///
/// Loadings are taken in exit order; each is matched to the earliest
/// still-unconsumed unloading that starts after the loading ends and keeps
/// the full cycle within `max_trip_duration_min`. An unloading is consumed
/// at most once; a loading with no eligible unloading produces no trip.
/// Transit crossings fall out beforehand via the dwell thresholds.
pub fn build_trips(events: &[ZoneEvent], thresholds: &TripThresholds) -> Vec<Trip> {
    let mut loads: Vec<&ZoneEvent> = events
        .iter()
        .filter(|e| {
            e.zone_tag == ZoneTag::Loading
                && e.exited_at.is_some()
                && e.duration_sec
                    .is_some_and(|d| d >= thresholds.min_loading_dwell_sec)
        })
        .collect();
    loads.sort_by_key(|e| e.exited_at);

    // Unloadings stay in their original order.
    let unloads: Vec<&ZoneEvent> = events
        .iter()
        .filter(|e| {
            e.zone_tag == ZoneTag::Unloading
                && e.duration_sec
                    .is_some_and(|d| d >= thresholds.min_unloading_dwell_sec)
        })
        .collect();

    let max_cycle = Duration::minutes(thresholds.max_trip_duration_min);
    let mut used = vec![false; unloads.len()];
    let mut trips = Vec::new();

    for load in loads {
        let Some(loaded_at) = load.exited_at else {
            continue;
        };
        let found = unloads.iter().enumerate().find(|(i, u)| {
            !used[*i]
                && u.entered_at > loaded_at
                && u.exited_at
                    .map_or(true, |u_exit| u_exit - load.entered_at <= max_cycle)
        });
        if let Some((i, unload)) = found {
            used[i] = true;
            let duration_min = unload
                .exited_at
                .map(|u_exit| ((u_exit - load.entered_at).num_seconds() as f64 / 60.0).round() as i64);
            trips.push(Trip {
                trip_number: trips.len() as i32 + 1,
                loaded_at,
                unloaded_at: unload.exited_at,
                loading_zone: load.zone_name.clone(),
                unloading_zone: unload.zone_name.clone(),
                duration_min,
                volume_m3: 0.0,
            });
        }
    }

    trips
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, h, m, 0).unwrap()
    }

    fn event(
        name: &str,
        tag: ZoneTag,
        entered: DateTime<Utc>,
        exited: DateTime<Utc>,
    ) -> ZoneEvent {
        ZoneEvent {
            zone_uid: name.to_lowercase(),
            zone_name: name.into(),
            zone_tag: tag,
            object_uid: "o1".into(),
            entered_at: entered,
            exited_at: Some(exited),
            duration_sec: Some((exited - entered).num_seconds()),
        }
    }

    #[test]
    fn simple_delivery_is_one_trip() {
        let events = vec![
            event("L1", ZoneTag::Loading, at(10, 0), at(10, 5)),
            event("U1", ZoneTag::Unloading, at(10, 30), at(10, 35)),
        ];
        let trips = build_trips(&events, &TripThresholds::default());

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_number, 1);
        assert_eq!(trips[0].loading_zone, "L1");
        assert_eq!(trips[0].unloading_zone, "U1");
        assert_eq!(trips[0].duration_min, Some(35));
    }

    #[test]
    fn transit_crossings_are_filtered_by_dwell() {
        let events = vec![
            event("L1", ZoneTag::Loading, at(9, 0), at(9, 6)),
            // Two sub-threshold crossings of the unload polygon.
            event("U1", ZoneTag::Unloading, at(9, 10), at(9, 10) + Duration::seconds(30)),
            event("U1", ZoneTag::Unloading, at(9, 20), at(9, 20) + Duration::seconds(45)),
            // The real unloading.
            event("U1", ZoneTag::Unloading, at(9, 40), at(9, 47)),
        ];
        let trips = build_trips(&events, &TripThresholds::default());

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].unloaded_at, Some(at(9, 47)));
    }

    #[test]
    fn over_long_cycles_are_not_trips() {
        // Loading exits 08:00; candidate unload exits 12:30 — 270 min > 240.
        let events = vec![
            event("L1", ZoneTag::Loading, at(8, 0) - Duration::minutes(10), at(8, 0)),
            event("U1", ZoneTag::Unloading, at(12, 20), at(12, 30)),
        ];
        assert!(build_trips(&events, &TripThresholds::default()).is_empty());
    }

    #[test]
    fn each_unload_is_consumed_at_most_once() {
        let events = vec![
            event("L1", ZoneTag::Loading, at(8, 0), at(8, 5)),
            event("L1", ZoneTag::Loading, at(9, 0), at(9, 5)),
            event("U1", ZoneTag::Unloading, at(9, 30), at(9, 40)),
        ];
        let trips = build_trips(&events, &TripThresholds::default());

        // Both loads are eligible for the single unload; only the first gets it.
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].loaded_at, at(8, 5));
    }

    #[test]
    fn trip_numbers_are_gapless_from_one() {
        let events = vec![
            event("L1", ZoneTag::Loading, at(8, 0), at(8, 5)),
            event("U1", ZoneTag::Unloading, at(8, 30), at(8, 40)),
            event("L1", ZoneTag::Loading, at(9, 0), at(9, 5)),
            event("U1", ZoneTag::Unloading, at(9, 30), at(9, 40)),
            event("L1", ZoneTag::Loading, at(10, 0), at(10, 5)),
        ];
        let trips = build_trips(&events, &TripThresholds::default());

        let numbers: Vec<i32> = trips.iter().map(|t| t.trip_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        for t in &trips {
            let d = t.duration_min.unwrap();
            assert!((0..=240).contains(&d));
        }
    }

    #[test]
    fn unload_must_start_after_loading_ends() {
        let events = vec![
            event("U1", ZoneTag::Unloading, at(7, 0), at(7, 10)),
            event("L1", ZoneTag::Loading, at(8, 0), at(8, 5)),
        ];
        assert!(build_trips(&events, &TripThresholds::default()).is_empty());
    }
}
