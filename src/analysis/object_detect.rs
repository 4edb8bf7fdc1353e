//! Work-object detection: which site was this vehicle actually working at.

use crate::types::{TrackPoint, Zone, ZoneTag};

/// Pick the most likely work object for a track.
///
/// Counts track points inside each boundary-tagged zone and returns the
/// owning object of the zone with the strictly maximum count. Ties keep the
/// first zone encountered, which is deterministic because the geofence
/// snapshot is ordered. `None` when no boundary zone contains any point or
/// the track is empty.
pub fn detect_object(track: &[TrackPoint], zones: &[Zone]) -> Option<String> {
    if track.is_empty() {
        return None;
    }

    let mut best: Option<(&Zone, usize)> = None;
    for zone in zones.iter().filter(|z| z.tag == ZoneTag::Boundary) {
        let count = track
            .iter()
            .filter(|p| zone.contains(p.lat, p.lon))
            .count();
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((zone, count)),
        }
    }

    best.map(|(zone, _)| zone.object_uid.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use geo::polygon;

    fn boundary(uid: &str, object_uid: &str, min: f64, max: f64) -> Zone {
        Zone {
            zone_uid: uid.into(),
            name: uid.into(),
            object_uid: object_uid.into(),
            tag: ZoneTag::Boundary,
            geometry: geo::MultiPolygon(vec![polygon![
                (x: min, y: min),
                (x: max, y: min),
                (x: max, y: max),
                (x: min, y: max),
            ]]),
        }
    }

    fn point(lat: f64, lon: f64, sec: u32) -> TrackPoint {
        TrackPoint {
            lat,
            lon,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, sec).unwrap(),
        }
    }

    #[test]
    fn zone_with_most_points_wins() {
        let zones = vec![
            boundary("z1", "o1", 0.0, 1.0),
            boundary("z2", "o2", 10.0, 11.0),
        ];
        // 2 points in o1, 5 in o2.
        let mut track: Vec<TrackPoint> =
            (0..2).map(|i| point(0.5, 0.5, i)).collect();
        track.extend((2..7).map(|i| point(10.5, 10.5, i)));

        assert_eq!(detect_object(&track, &zones), Some("o2".into()));
    }

    #[test]
    fn tie_keeps_first_encountered_zone() {
        let zones = vec![
            boundary("z1", "o1", 0.0, 1.0),
            boundary("z2", "o2", 10.0, 11.0),
        ];
        let track = vec![point(0.5, 0.5, 0), point(10.5, 10.5, 1)];

        assert_eq!(detect_object(&track, &zones), Some("o1".into()));
    }

    #[test]
    fn no_containing_zone_detects_nothing() {
        let zones = vec![boundary("z1", "o1", 0.0, 1.0)];
        let track = vec![point(50.0, 50.0, 0)];

        assert_eq!(detect_object(&track, &zones), None);
        assert_eq!(detect_object(&[], &zones), None);
    }
}
