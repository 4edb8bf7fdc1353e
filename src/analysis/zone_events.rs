//! Zone-event derivation: reduce a GPS track against a zone set into
//! ordered entry/exit events.

use chrono::{DateTime, Utc};

use crate::types::{TrackPoint, Zone, ZoneEvent, ZoneTag};

/// Sweep the track once per zone and emit one event per contiguous stay.
///
/// A stay opens on the first point inside and closes on the first point
/// back outside; a vehicle still inside at the end of the track closes at
/// the last track timestamp. Events come back sorted by `entered_at`; each
/// zone's events are pairwise time-disjoint and durations are non-negative.
pub fn derive_zone_events(track: &[TrackPoint], zones: &[Zone]) -> Vec<ZoneEvent> {
    let mut events = Vec::new();

    for zone in zones {
        let mut inside_from: Option<DateTime<Utc>> = None;
        for point in track {
            let inside = zone.contains(point.lat, point.lon);
            match (inside, inside_from) {
                (true, None) => inside_from = Some(point.timestamp),
                (false, Some(entered)) => {
                    events.push(close_stay(zone, entered, point.timestamp));
                    inside_from = None;
                }
                _ => {}
            }
        }
        if let (Some(entered), Some(last)) = (inside_from, track.last()) {
            events.push(close_stay(zone, entered, last.timestamp));
        }
    }

    events.sort_by_key(|e| e.entered_at);
    events
}

fn close_stay(zone: &Zone, entered_at: DateTime<Utc>, exited_at: DateTime<Utc>) -> ZoneEvent {
    let duration_sec =
        ((exited_at - entered_at).num_milliseconds() as f64 / 1000.0).round() as i64;
    ZoneEvent {
        zone_uid: zone.zone_uid.clone(),
        zone_name: zone.name.clone(),
        zone_tag: zone.tag,
        object_uid: zone.object_uid.clone(),
        entered_at,
        exited_at: Some(exited_at),
        duration_sec: Some(duration_sec),
    }
}

/// Seconds spent inside the given object's boundary zones.
pub fn onsite_sec(events: &[ZoneEvent], object_uid: &str) -> i64 {
    events
        .iter()
        .filter(|e| e.zone_tag == ZoneTag::Boundary && e.object_uid == object_uid)
        .filter_map(|e| e.duration_sec)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geo::polygon;

    fn zone(uid: &str, tag: ZoneTag, min: f64, max: f64) -> Zone {
        Zone {
            zone_uid: uid.into(),
            name: uid.to_uppercase(),
            object_uid: "o1".into(),
            tag,
            geometry: geo::MultiPolygon(vec![polygon![
                (x: min, y: min),
                (x: max, y: min),
                (x: max, y: max),
                (x: min, y: max),
            ]]),
        }
    }

    fn point(lat: f64, lon: f64, minute: u32) -> TrackPoint {
        TrackPoint {
            lat,
            lon,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 5, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn entry_and_exit_produce_one_event() {
        let z = zone("z1", ZoneTag::Loading, 0.0, 1.0);
        let track = vec![
            point(5.0, 5.0, 0),
            point(0.5, 0.5, 1),
            point(0.6, 0.6, 2),
            point(5.0, 5.0, 3),
        ];
        let events = derive_zone_events(&track, &[z]);

        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.entered_at.format("%H:%M").to_string(), "10:01");
        assert_eq!(
            e.exited_at.unwrap().format("%H:%M").to_string(),
            "10:03"
        );
        assert_eq!(e.duration_sec, Some(120));
    }

    #[test]
    fn still_inside_at_end_closes_at_last_timestamp() {
        let z = zone("z1", ZoneTag::Boundary, 0.0, 1.0);
        let track = vec![point(5.0, 5.0, 0), point(0.5, 0.5, 10), point(0.5, 0.6, 30)];
        let events = derive_zone_events(&track, &[z]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].exited_at, Some(track[2].timestamp));
        assert_eq!(events[0].duration_sec, Some(20 * 60));
    }

    #[test]
    fn repeated_stays_are_disjoint_and_sorted() {
        let z = zone("z1", ZoneTag::Unloading, 0.0, 1.0);
        let track = vec![
            point(0.5, 0.5, 0),
            point(5.0, 5.0, 5),
            point(0.5, 0.5, 10),
            point(5.0, 5.0, 15),
        ];
        let events = derive_zone_events(&track, &[z]);

        assert_eq!(events.len(), 2);
        assert!(events[0].exited_at.unwrap() <= events[1].entered_at);
        assert!(events[0].entered_at <= events[1].entered_at);
        for e in &events {
            assert!(e.duration_sec.unwrap() >= 0);
        }
    }

    #[test]
    fn empty_track_yields_nothing() {
        let z = zone("z1", ZoneTag::Loading, 0.0, 1.0);
        assert!(derive_zone_events(&[], &[z]).is_empty());
    }

    #[test]
    fn onsite_counts_only_matching_boundary_events() {
        let boundary = zone("b", ZoneTag::Boundary, 0.0, 10.0);
        let loading = zone("l", ZoneTag::Loading, 0.0, 1.0);
        let track = vec![point(0.5, 0.5, 0), point(20.0, 20.0, 10)];
        let events = derive_zone_events(&track, &[boundary, loading]);

        assert_eq!(onsite_sec(&events, "o1"), 600);
        assert_eq!(onsite_sec(&events, "other"), 0);
    }
}
