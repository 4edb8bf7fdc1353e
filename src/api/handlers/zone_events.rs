//! Raw zone events of one vehicle-shift.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, Envelope};
use crate::api::handlers::parse_iso_date;
use crate::api::AppState;
use crate::types::ShiftType;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEventFilter {
    pub vehicle_id: Option<i64>,
    pub date: Option<String>,
    pub shift_type: Option<String>,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEventDto {
    pub id: i64,
    pub zone_uid: String,
    pub zone_name: String,
    pub zone_tag: String,
    pub object_uid: String,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub duration_sec: Option<i64>,
}

/// Fetch the events of one vehicle-shift, in entry order. Shared with the
/// shift-detail endpoint.
pub(crate) async fn events_of_shift(
    db: &sqlx::PgPool,
    vehicle_id: i64,
    report_date: NaiveDate,
    shift_type: ShiftType,
) -> Result<Vec<ZoneEventDto>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, zone_uid, zone_name, zone_tag, object_uid,
                  entered_at, exited_at, duration_sec
           FROM dump_trucks.zone_events
           WHERE vehicle_id = $1 AND report_date = $2 AND shift_type = $3
           ORDER BY entered_at"#,
    )
    .bind(vehicle_id)
    .bind(report_date)
    .bind(shift_type.as_str())
    .fetch_all(db)
    .await
}

pub async fn list_zone_events(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ZoneEventFilter>,
) -> Result<Json<Envelope<Vec<ZoneEventDto>>>, ApiError> {
    let vehicle_id = filter
        .vehicle_id
        .ok_or_else(|| ApiError::bad_request("vehicleId is required"))?;
    let date = filter
        .date
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("date is required"))
        .and_then(|s| parse_iso_date("date", s))?;
    let shift_type = filter
        .shift_type
        .as_deref()
        .and_then(ShiftType::parse)
        .ok_or_else(|| ApiError::bad_request("shiftType must be shift1 or shift2"))?;

    let events = events_of_shift(&state.db, vehicle_id, date, shift_type).await?;
    let total = events.len() as i64;
    Ok(Envelope::with_total(events, total))
}
