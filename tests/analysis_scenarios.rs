//! End-to-End Analysis Scenarios
//!
//! Exercises the full analysis chain — zone-event derivation, object
//! detection, trip building, work-type classification and KPI calculation —
//! against synthetic tracks and zone sets, the way the orchestrator wires
//! them for a real shift.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Yekaterinburg;
use geo::polygon;

use haulwatch::analysis::{
    build_trips, calculate_kpis, classify_work_type, derive_zone_events, detect_object,
    onsite_sec, TripThresholds,
};
use haulwatch::types::shift::canonical_window;
use haulwatch::types::{ShiftType, TrackPoint, WorkType, Zone, ZoneEvent, ZoneTag};

fn square_zone(uid: &str, object_uid: &str, tag: ZoneTag, min: f64, max: f64) -> Zone {
    Zone {
        zone_uid: uid.into(),
        name: uid.to_uppercase(),
        object_uid: object_uid.into(),
        tag,
        geometry: geo::MultiPolygon(vec![polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
        ]]),
    }
}

/// Standard site: boundary O1 covering its loading and unloading bays.
fn site_zones() -> Vec<Zone> {
    vec![
        square_zone("o1-bound", "o1", ZoneTag::Boundary, 0.0, 10.0),
        square_zone("o1-load", "o1", ZoneTag::Loading, 0.0, 1.0),
        square_zone("o1-unload", "o1", ZoneTag::Unloading, 4.0, 5.0),
    ]
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Yekaterinburg
        .with_ymd_and_hms(2024, 6, 5, h, m, s)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn point(lat: f64, lon: f64, t: DateTime<Utc>) -> TrackPoint {
    TrackPoint {
        lat,
        lon,
        timestamp: t,
    }
}

fn day_shift() -> haulwatch::types::ShiftWindow {
    canonical_window(
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
        ShiftType::First,
        Yekaterinburg,
    )
}

/// Filter events to the detected object's family, as the orchestrator does.
fn filter_to_object(events: Vec<ZoneEvent>, object_uid: &str) -> Vec<ZoneEvent> {
    events
        .into_iter()
        .filter(|e| e.object_uid == object_uid)
        .collect()
}

#[test]
fn simple_delivery_produces_one_trip_and_expected_kpis() {
    let zones = site_zones();
    // Load 10:00–10:05, haul across the site, dump 10:30–10:35.
    let track = vec![
        point(0.5, 0.5, at(10, 0, 0)),
        point(0.6, 0.5, at(10, 2, 0)),
        point(2.0, 2.0, at(10, 5, 0)),
        point(4.5, 4.5, at(10, 30, 0)),
        point(7.0, 7.0, at(10, 35, 0)),
    ];

    let events = derive_zone_events(&track, &zones);
    let detected = detect_object(&track, &zones).unwrap();
    assert_eq!(detected, "o1");

    let events = filter_to_object(events, &detected);
    let trips = build_trips(&events, &TripThresholds::default());
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].trip_number, 1);
    assert_eq!(trips[0].duration_min, Some(35));
    assert_eq!(trips[0].loading_zone, "O1-LOAD");
    assert_eq!(trips[0].unloading_zone, "O1-UNLOAD");

    let onsite = onsite_sec(&events, &detected);
    assert_eq!(classify_work_type(3600, onsite, &trips), WorkType::Delivery);

    let kpis = calculate_kpis(&day_shift(), 3600, 1800, onsite, &trips);
    assert_eq!(kpis.kip_pct, 8.33);
    assert_eq!(kpis.movement_pct, 50.00);
    assert_eq!(kpis.trips_count, 1);
}

#[test]
fn transit_through_unload_polygon_is_not_an_unloading() {
    let zones = site_zones();
    // Load for 400 s, cross the dump bay twice briefly, then really dump.
    let track = vec![
        point(0.5, 0.5, at(9, 0, 0)),
        point(2.0, 2.0, at(9, 6, 40)), // loading dwell 400 s
        // First transit: 30 s inside.
        point(4.5, 4.5, at(9, 10, 0)),
        point(3.0, 3.0, at(9, 10, 30)),
        // Second transit: 45 s inside.
        point(4.5, 4.5, at(9, 20, 0)),
        point(3.0, 3.0, at(9, 20, 45)),
        // The real unloading: 400 s inside.
        point(4.5, 4.5, at(9, 40, 0)),
        point(7.0, 7.0, at(9, 46, 40)),
    ];

    let events = derive_zone_events(&track, &zones);
    let trips = build_trips(&events, &TripThresholds::default());

    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].unloaded_at, Some(at(9, 46, 40)));
}

#[test]
fn over_long_cycle_is_clamped_out() {
    let zones = site_zones();
    // Loading exits at 08:00; the only unload candidate exits at 12:30.
    let track = vec![
        point(0.5, 0.5, at(7, 54, 0)),
        point(2.0, 2.0, at(8, 0, 0)),
        point(4.5, 4.5, at(12, 20, 0)),
        point(7.0, 7.0, at(12, 30, 0)),
    ];

    let events = derive_zone_events(&track, &zones);
    let trips = build_trips(&events, &TripThresholds::default());

    assert!(trips.is_empty());
}

#[test]
fn object_selection_picks_the_densest_boundary_and_filters_to_it() {
    let mut zones = site_zones();
    zones.push(square_zone("o2-bound", "o2", ZoneTag::Boundary, 20.0, 30.0));
    zones.push(square_zone("o2-load", "o2", ZoneTag::Loading, 20.0, 21.0));

    // 2 points at O1, 5 points at O2.
    let mut track: Vec<TrackPoint> = vec![
        point(0.5, 0.5, at(8, 0, 0)),
        point(0.6, 0.5, at(8, 1, 0)),
    ];
    for i in 0..5 {
        track.push(point(20.5, 20.5, at(9, i, 0)));
    }

    let events = derive_zone_events(&track, &zones);
    let detected = detect_object(&track, &zones).unwrap();
    assert_eq!(detected, "o2");

    let events = filter_to_object(events, &detected);
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.object_uid == "o2"));
}

#[test]
fn in_zone_at_end_of_shift_closes_at_last_timestamp() {
    let zones = site_zones();
    // Enters the site at 19:00, still inside when the track ends at 19:30.
    let track = vec![
        point(50.0, 50.0, at(18, 30, 0)),
        point(5.5, 5.5, at(19, 0, 0)),
        point(6.0, 6.0, at(19, 15, 0)),
        point(6.5, 6.5, at(19, 30, 0)),
    ];

    let events = derive_zone_events(&track, &zones);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entered_at, at(19, 0, 0));
    assert_eq!(events[0].exited_at, Some(at(19, 30, 0)));
    assert_eq!(events[0].duration_sec, Some(1800));

    let onsite = onsite_sec(&events, "o1");
    let kpis = calculate_kpis(&day_shift(), 3600, 0, onsite, &[]);
    assert_eq!(kpis.onsite_min, 30);
}

#[test]
fn analysis_chain_is_deterministic() {
    let zones = site_zones();
    let track = vec![
        point(0.5, 0.5, at(10, 0, 0)),
        point(2.0, 2.0, at(10, 5, 0)),
        point(4.5, 4.5, at(10, 30, 0)),
        point(7.0, 7.0, at(10, 35, 0)),
    ];

    let first = derive_zone_events(&track, &zones);
    let second = derive_zone_events(&track, &zones);
    assert_eq!(first, second);
    assert_eq!(
        build_trips(&first, &TripThresholds::default()),
        build_trips(&second, &TripThresholds::default())
    );
}
