//! Shift record writes: merge-by-unique-key upsert plus the atomic
//! replace-sets for trips and zone events.
//!
//! All three run inside the caller's transaction, in upsert → replace →
//! replace order so foreign keys from trips to the record stay valid. Each
//! is idempotent under re-execution with identical inputs.

use sqlx::{Postgres, Transaction};

use crate::types::{NewShiftRecord, ShiftType, Trip, ZoneEvent};

/// Merge the KPI row on `(report_date, shift_type, vehicle_id, object_uid)`.
///
/// Non-key columns are overwritten and `updated_at` is bumped. Returns the
/// record id.
pub async fn upsert_shift_record(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewShiftRecord,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO dump_trucks.shift_records
             (report_date, shift_type, vehicle_id, object_uid, object_name,
              vehicle_name, plate, engine_time_sec, moving_time_sec, distance_km,
              onsite_min, trips_count, fact_volume_m3, kip_pct, movement_pct,
              work_type, pl_id, request_numbers, raw_monitoring)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                   $11, $12, $13, $14, $15, $16, $17, $18, $19)
           ON CONFLICT (report_date, shift_type, vehicle_id, object_uid) DO UPDATE SET
             object_name = EXCLUDED.object_name,
             vehicle_name = EXCLUDED.vehicle_name,
             plate = EXCLUDED.plate,
             engine_time_sec = EXCLUDED.engine_time_sec,
             moving_time_sec = EXCLUDED.moving_time_sec,
             distance_km = EXCLUDED.distance_km,
             onsite_min = EXCLUDED.onsite_min,
             trips_count = EXCLUDED.trips_count,
             fact_volume_m3 = EXCLUDED.fact_volume_m3,
             kip_pct = EXCLUDED.kip_pct,
             movement_pct = EXCLUDED.movement_pct,
             work_type = EXCLUDED.work_type,
             pl_id = EXCLUDED.pl_id,
             request_numbers = EXCLUDED.request_numbers,
             raw_monitoring = EXCLUDED.raw_monitoring,
             updated_at = NOW()
           RETURNING id"#,
    )
    .bind(record.report_date)
    .bind(record.shift_type.as_str())
    .bind(record.vehicle_id)
    .bind(&record.object_uid)
    .bind(&record.object_name)
    .bind(&record.vehicle_name)
    .bind(&record.plate)
    .bind(record.engine_time_sec)
    .bind(record.moving_time_sec)
    .bind(record.distance_km)
    .bind(record.onsite_min)
    .bind(record.trips_count)
    .bind(record.fact_volume_m3)
    .bind(record.kip_pct)
    .bind(record.movement_pct)
    .bind(record.work_type.as_str())
    .bind(record.pl_id)
    .bind(&record.request_numbers)
    .bind(&record.raw_monitoring)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

/// Delete-all-then-insert the trips of one shift record, in order.
pub async fn replace_trips(
    tx: &mut Transaction<'_, Postgres>,
    record_id: i64,
    trips: &[Trip],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM dump_trucks.trips WHERE shift_record_id = $1")
        .bind(record_id)
        .execute(&mut **tx)
        .await?;

    for trip in trips {
        sqlx::query(
            r#"INSERT INTO dump_trucks.trips
                 (shift_record_id, trip_number, loaded_at, unloaded_at,
                  loading_zone, unloading_zone, duration_min, volume_m3)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(record_id)
        .bind(trip.trip_number)
        .bind(trip.loaded_at)
        .bind(trip.unloaded_at)
        .bind(&trip.loading_zone)
        .bind(&trip.unloading_zone)
        .bind(trip.duration_min)
        .bind(trip.volume_m3)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Delete-all-then-insert the zone events of one vehicle-shift, keyed by
/// `(vehicle_id, report_date, shift_type)`.
pub async fn replace_zone_events(
    tx: &mut Transaction<'_, Postgres>,
    vehicle_id: i64,
    report_date: chrono::NaiveDate,
    shift_type: ShiftType,
    events: &[ZoneEvent],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"DELETE FROM dump_trucks.zone_events
           WHERE vehicle_id = $1 AND report_date = $2 AND shift_type = $3"#,
    )
    .bind(vehicle_id)
    .bind(report_date)
    .bind(shift_type.as_str())
    .execute(&mut **tx)
    .await?;

    for event in events {
        sqlx::query(
            r#"INSERT INTO dump_trucks.zone_events
                 (vehicle_id, report_date, shift_type, zone_uid, zone_name,
                  zone_tag, object_uid, entered_at, exited_at, duration_sec)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(vehicle_id)
        .bind(report_date)
        .bind(shift_type.as_str())
        .bind(&event.zone_uid)
        .bind(&event.zone_name)
        .bind(event.zone_tag.as_str())
        .bind(&event.object_uid)
        .bind(event.entered_at)
        .bind(event.exited_at)
        .bind(event.duration_sec)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
