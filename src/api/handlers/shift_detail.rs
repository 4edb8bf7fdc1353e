//! Combined trips + zone events for one shift record.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, Envelope};
use crate::api::handlers::trips::{trips_of_record, TripDto};
use crate::api::handlers::zone_events::{events_of_shift, ZoneEventDto};
use crate::api::AppState;
use crate::types::ShiftType;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetailFilter {
    pub shift_record_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetailDto {
    pub trips: Vec<TripDto>,
    pub zone_events: Vec<ZoneEventDto>,
}

pub async fn get_shift_detail(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShiftDetailFilter>,
) -> Result<Json<Envelope<ShiftDetailDto>>, ApiError> {
    let shift_record_id = filter
        .shift_record_id
        .ok_or_else(|| ApiError::bad_request("shiftRecordId is required"))?;

    let key: Option<(i64, NaiveDate, String)> = sqlx::query_as(
        r#"SELECT vehicle_id, report_date, shift_type
           FROM dump_trucks.shift_records
           WHERE id = $1"#,
    )
    .bind(shift_record_id)
    .fetch_optional(&state.db)
    .await?;

    let Some((vehicle_id, report_date, shift_type)) = key else {
        return Err(ApiError::not_found(format!(
            "shift record {shift_record_id} not found"
        )));
    };
    let shift_type = ShiftType::parse(&shift_type)
        .ok_or_else(|| ApiError::internal("stored shift_type is unknown"))?;

    let trips = trips_of_record(&state.db, shift_record_id).await?;
    let zone_events = events_of_shift(&state.db, vehicle_id, report_date, shift_type).await?;

    Ok(Envelope::new(ShiftDetailDto { trips, zone_events }))
}
