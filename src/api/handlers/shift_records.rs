//! Shift KPI rows with optional period, object and shift filters.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, Envelope};
use crate::api::handlers::{decimal, parse_iso_date};
use crate::api::AppState;
use crate::types::ShiftType;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecordFilter {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub object_uid: Option<String>,
    pub shift_type: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ShiftRecordRow {
    pub id: i64,
    pub report_date: NaiveDate,
    pub shift_type: String,
    pub vehicle_id: i64,
    pub object_uid: String,
    pub object_name: String,
    pub vehicle_name: String,
    pub plate: String,
    pub engine_time_sec: i64,
    pub moving_time_sec: i64,
    pub distance_km: String,
    pub onsite_min: i64,
    pub trips_count: i64,
    pub fact_volume_m3: String,
    pub kip_pct: String,
    pub movement_pct: String,
    pub work_type: String,
    pub pl_id: Option<i64>,
    pub request_numbers: Vec<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecordDto {
    pub id: i64,
    pub report_date: NaiveDate,
    pub shift_type: String,
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
    pub work_type: String,
    pub pl_id: Option<i64>,
    pub request_numbers: Vec<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShiftRecordRow> for ShiftRecordDto {
    fn from(row: ShiftRecordRow) -> Self {
        Self {
            id: row.id,
            report_date: row.report_date,
            shift_type: row.shift_type,
            vehicle_id: row.vehicle_id,
            object_uid: row.object_uid,
            object_name: row.object_name,
            vehicle_name: row.vehicle_name,
            plate: row.plate,
            engine_time_sec: row.engine_time_sec,
            moving_time_sec: row.moving_time_sec,
            distance_km: decimal(&row.distance_km),
            onsite_min: row.onsite_min,
            trips_count: row.trips_count,
            fact_volume_m3: decimal(&row.fact_volume_m3),
            kip_pct: decimal(&row.kip_pct),
            movement_pct: decimal(&row.movement_pct),
            work_type: row.work_type,
            pl_id: row.pl_id,
            request_numbers: row.request_numbers,
            updated_at: row.updated_at,
        }
    }
}

pub async fn list_shift_records(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShiftRecordFilter>,
) -> Result<Json<Envelope<Vec<ShiftRecordDto>>>, ApiError> {
    let date_from = filter
        .date_from
        .as_deref()
        .map(|s| parse_iso_date("dateFrom", s))
        .transpose()?;
    let date_to = filter
        .date_to
        .as_deref()
        .map(|s| parse_iso_date("dateTo", s))
        .transpose()?;
    let shift_type = filter
        .shift_type
        .as_deref()
        .map(|s| {
            ShiftType::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("unknown shiftType '{s}'")))
        })
        .transpose()?;

    let rows: Vec<ShiftRecordRow> = sqlx::query_as(
        r#"SELECT id, report_date, shift_type, vehicle_id, object_uid, object_name,
                  vehicle_name, plate, engine_time_sec, moving_time_sec,
                  distance_km::text AS distance_km, onsite_min, trips_count,
                  fact_volume_m3::text AS fact_volume_m3, kip_pct::text AS kip_pct,
                  movement_pct::text AS movement_pct, work_type, pl_id,
                  request_numbers, updated_at
           FROM dump_trucks.shift_records
           WHERE ($1::date IS NULL OR report_date >= $1)
             AND ($2::date IS NULL OR report_date <= $2)
             AND ($3::text IS NULL OR object_uid = $3)
             AND ($4::text IS NULL OR shift_type = $4)
           ORDER BY report_date, shift_type, vehicle_id"#,
    )
    .bind(date_from)
    .bind(date_to)
    .bind(&filter.object_uid)
    .bind(shift_type.map(ShiftType::as_str))
    .fetch_all(&state.db)
    .await?;

    let records: Vec<ShiftRecordDto> = rows.into_iter().map(Into::into).collect();
    let total = records.len() as i64;
    Ok(Envelope::with_total(records, total))
}
