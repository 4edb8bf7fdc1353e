//! Shift-fetch orchestrator: the top-level ingestion run for one
//! `(date, shift)` pair.
//!
//! Failure policy: errors before the vehicle loop (route-list fetch, zone
//! load) abort the run; anything attributable to a single vehicle rolls
//! back that vehicle's transaction, is recorded in the summary, and the run
//! continues.

use std::collections::HashMap;

use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::analysis::{
    build_trips, calculate_kpis, classify_work_type, derive_zone_events, detect_object,
    onsite_sec, TripThresholds,
};
use crate::error::PipelineError;
use crate::fleet::FleetClient;
use crate::pipeline::route_lists::{ParsedRouteList, RouteListParser, TargetVehicle};
use crate::storage::geofences::{load_zone_snapshot, GeofenceSnapshot};
use crate::storage::{requests, route_lists as route_list_store, shift_records};
use crate::types::shift::canonical_window;
use crate::types::{NewShiftRecord, ShiftType, ShiftWindow, VehicleMonitoring, ZoneEvent};

/// Object uid recorded when zone events exist but no boundary zone matched.
const UNKNOWN_OBJECT_UID: &str = "unknown";

/// Route lists are fetched over this many days back from the report date.
const ROUTE_LIST_LOOKBACK_DAYS: i64 = 7;
/// Requests are fetched over this many months back from the report date.
const REQUEST_LOOKBACK_MONTHS: u32 = 2;

/// One failed vehicle inside an otherwise successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFailure {
    pub vehicle_id: i64,
    pub message: String,
}

/// Outcome of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub processed_count: u32,
    pub skipped_count: u32,
    pub errors: Vec<VehicleFailure>,
    pub warnings: Vec<String>,
}

impl FetchSummary {
    fn new(date: NaiveDate, shift_type: ShiftType) -> Self {
        Self {
            date,
            shift_type,
            processed_count: 0,
            skipped_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// A vehicle queued for the per-vehicle stage, with its route-list context.
#[derive(Debug)]
struct VehicleTask {
    vehicle: TargetVehicle,
    pl_id: Option<i64>,
    request_numbers: Vec<i64>,
}

/// Drives a full ingestion run: fetch, analyse, persist.
pub struct ShiftIngestor {
    pool: PgPool,
    client: FleetClient,
    parser: RouteListParser,
    thresholds: TripThresholds,
    test_vehicle_ids: Option<Vec<i64>>,
}

impl ShiftIngestor {
    pub fn new(
        pool: PgPool,
        client: FleetClient,
        test_vehicle_ids: Option<Vec<i64>>,
    ) -> Self {
        let parser = RouteListParser::new(*client.codec(), test_vehicle_ids.as_deref());
        Self {
            pool,
            client,
            parser,
            thresholds: TripThresholds::default(),
            test_vehicle_ids,
        }
    }

    /// Run the pipeline for `(date, shift_type)`.
    pub async fn run(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        cancel: &CancellationToken,
    ) -> Result<FetchSummary, PipelineError> {
        let mut summary = FetchSummary::new(date, shift_type);
        let window = canonical_window(date, shift_type, self.client.codec().timezone());
        info!(%date, shift = %shift_type, "starting shift ingestion run");

        // Route lists are the backbone of the run: a fetch failure aborts.
        let from = date - Duration::days(ROUTE_LIST_LOOKBACK_DAYS);
        let raw_lists = self
            .client
            .list_route_lists(from, date, cancel)
            .await?
            .unwrap_or_default();

        let mut lists = self.parser.parse(&raw_lists);
        if !self.parser.is_test_mode() {
            lists.retain(|l| l.shifts.iter().any(|w| w.shift_type == shift_type));
        }
        info!(lists = lists.len(), "route lists parsed and filtered");

        self.upsert_request_shadows(date, &lists, &mut summary, cancel)
            .await;

        // Zones are mandatory; an empty set means there is nothing to do.
        let snapshot = load_zone_snapshot(&self.pool).await?;
        if snapshot.zones.is_empty() {
            warn!("geofence snapshot is empty, nothing to analyse");
            summary.warnings.push(PipelineError::ZonesEmpty.to_string());
            return Ok(summary);
        }

        let tasks = self.build_vehicle_tasks(&lists);
        info!(vehicles = tasks.len(), "vehicle set assembled");

        for task in &tasks {
            if cancel.is_cancelled() {
                summary.warnings.push("run cancelled".into());
                break;
            }
            match self
                .process_vehicle(task, &window, &snapshot, cancel)
                .await
            {
                Ok(true) => summary.processed_count += 1,
                Ok(false) => summary.skipped_count += 1,
                Err(e) => {
                    if cancel.is_cancelled() {
                        summary.warnings.push("run cancelled".into());
                        break;
                    }
                    warn!(vehicle_id = task.vehicle.vehicle_id, error = %e, "vehicle failed, continuing");
                    summary.errors.push(VehicleFailure {
                        vehicle_id: task.vehicle.vehicle_id,
                        message: e.to_string(),
                    });
                    summary.skipped_count += 1;
                }
            }
        }

        info!(
            processed = summary.processed_count,
            skipped = summary.skipped_count,
            errors = summary.errors.len(),
            "shift ingestion run finished"
        );
        Ok(summary)
    }

    /// Fetch and upsert the request and route-list shadows. Failures here
    /// are warnings; the run continues without them.
    async fn upsert_request_shadows(
        &self,
        date: NaiveDate,
        lists: &[ParsedRouteList],
        summary: &mut FetchSummary,
        cancel: &CancellationToken,
    ) {
        let from = date
            .checked_sub_months(Months::new(REQUEST_LOOKBACK_MONTHS))
            .unwrap_or(date);
        match self.client.list_requests(from, date, cancel).await {
            Ok(Some(list)) => {
                if let Err(e) = requests::upsert_requests(&self.pool, &list).await {
                    warn!(error = %e, "request upsert failed");
                    summary.warnings.push(format!("request upsert failed: {e}"));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "request fetch failed");
                summary.warnings.push(format!("request fetch failed: {e}"));
            }
        }

        if let Err(e) = route_list_store::upsert_route_lists(&self.pool, lists).await {
            warn!(error = %e, "route-list upsert failed");
            summary
                .warnings
                .push(format!("route-list upsert failed: {e}"));
        }
    }

    /// Assemble the ordered vehicle set for this run.
    ///
    /// Test mode seeds every configured id and enriches display fields from
    /// the parsed lists; normal mode unions the target vehicles of the
    /// retained lists. Iteration order is stable and insertion-ordered.
    fn build_vehicle_tasks(&self, lists: &[ParsedRouteList]) -> Vec<VehicleTask> {
        let mut tasks: Vec<VehicleTask> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        if let Some(ids) = &self.test_vehicle_ids {
            for &vehicle_id in ids {
                index.insert(vehicle_id, tasks.len());
                tasks.push(VehicleTask {
                    vehicle: TargetVehicle {
                        vehicle_id,
                        name: String::new(),
                        plate: String::new(),
                    },
                    pl_id: None,
                    request_numbers: Vec::new(),
                });
            }
        }

        for list in lists {
            for vehicle in &list.vehicles {
                match index.get(&vehicle.vehicle_id) {
                    Some(&i) => {
                        let task = &mut tasks[i];
                        if task.vehicle.name.is_empty() {
                            task.vehicle.name = vehicle.name.clone();
                        }
                        if task.vehicle.plate.is_empty() {
                            task.vehicle.plate = vehicle.plate.clone();
                        }
                        if task.pl_id.is_none() {
                            task.pl_id = Some(list.pl_id);
                        }
                        for n in &list.request_numbers {
                            if !task.request_numbers.contains(n) {
                                task.request_numbers.push(*n);
                            }
                        }
                    }
                    None => {
                        // In test mode only the seeded ids are processed.
                        if self.test_vehicle_ids.is_some() {
                            continue;
                        }
                        index.insert(vehicle.vehicle_id, tasks.len());
                        tasks.push(VehicleTask {
                            vehicle: vehicle.clone(),
                            pl_id: Some(list.pl_id),
                            request_numbers: list.request_numbers.clone(),
                        });
                    }
                }
            }
        }

        tasks
    }

    /// Fetch, analyse and persist one vehicle. `Ok(true)` processed,
    /// `Ok(false)` skipped (no data, or nothing observed).
    async fn process_vehicle(
        &self,
        task: &VehicleTask,
        window: &ShiftWindow,
        snapshot: &GeofenceSnapshot,
        cancel: &CancellationToken,
    ) -> Result<bool, PipelineError> {
        let vehicle_id = task.vehicle.vehicle_id;

        let Some(monitoring) = self
            .client
            .fetch_monitoring(vehicle_id, window, cancel)
            .await?
        else {
            info!(vehicle_id, "no monitoring data, skipping");
            return Ok(false);
        };

        let events = derive_zone_events(&monitoring.track, &snapshot.zones);
        let detected = detect_object(&monitoring.track, &snapshot.zones);

        if detected.is_none() && events.is_empty() {
            info!(vehicle_id, "no object and no zone activity, skipping");
            return Ok(false);
        }

        // With a detected object, only its zone family counts; an unknown
        // object keeps the full event list.
        let (object_uid, events): (String, Vec<ZoneEvent>) = match detected {
            Some(uid) => {
                let filtered = events
                    .into_iter()
                    .filter(|e| e.object_uid == uid)
                    .collect();
                (uid, filtered)
            }
            None => (UNKNOWN_OBJECT_UID.to_string(), events),
        };

        let trips = build_trips(&events, &self.thresholds);
        let onsite = onsite_sec(&events, &object_uid);
        let work_type = classify_work_type(monitoring.engine_time_sec, onsite, &trips);
        let kpis = calculate_kpis(
            window,
            monitoring.engine_time_sec,
            monitoring.moving_time_sec,
            onsite,
            &trips,
        );

        let record = self.build_record(task, window, &object_uid, snapshot, &monitoring, kpis, work_type);

        // Upsert-then-replace order keeps trip foreign keys valid at every
        // point inside the transaction.
        let mut tx = self.pool.begin().await?;
        let record_id = shift_records::upsert_shift_record(&mut tx, &record).await?;
        shift_records::replace_trips(&mut tx, record_id, &trips).await?;
        shift_records::replace_zone_events(
            &mut tx,
            vehicle_id,
            window.report_date,
            window.shift_type,
            &events,
        )
        .await?;
        tx.commit().await?;

        info!(
            vehicle_id,
            object_uid = %record.object_uid,
            trips = trips.len(),
            work_type = %work_type,
            "vehicle shift persisted"
        );
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        task: &VehicleTask,
        window: &ShiftWindow,
        object_uid: &str,
        snapshot: &GeofenceSnapshot,
        monitoring: &VehicleMonitoring,
        kpis: crate::analysis::ShiftKpis,
        work_type: crate::types::WorkType,
    ) -> NewShiftRecord {
        NewShiftRecord {
            report_date: window.report_date,
            shift_type: window.shift_type,
            vehicle_id: task.vehicle.vehicle_id,
            object_uid: object_uid.to_string(),
            object_name: snapshot
                .object_names
                .get(object_uid)
                .cloned()
                .unwrap_or_default(),
            vehicle_name: task.vehicle.name.clone(),
            plate: task.vehicle.plate.clone(),
            engine_time_sec: monitoring.engine_time_sec,
            moving_time_sec: monitoring.moving_time_sec,
            distance_km: monitoring.distance_km,
            onsite_min: kpis.onsite_min,
            trips_count: kpis.trips_count,
            fact_volume_m3: kpis.fact_volume_m3,
            kip_pct: kpis.kip_pct,
            movement_pct: kpis.movement_pct,
            work_type,
            pl_id: task.pl_id,
            request_numbers: task.request_numbers.clone(),
            raw_monitoring: monitoring.raw.clone(),
        }
    }
}
