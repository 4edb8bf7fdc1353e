//! Trips of one shift record.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, Envelope};
use crate::api::handlers::decimal;
use crate::api::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripFilter {
    pub shift_record_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TripRow {
    pub id: i64,
    pub trip_number: i32,
    pub loaded_at: DateTime<Utc>,
    pub unloaded_at: Option<DateTime<Utc>>,
    pub loading_zone: String,
    pub unloading_zone: String,
    pub duration_min: Option<i64>,
    pub volume_m3: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDto {
    pub id: i64,
    pub trip_number: i32,
    pub loaded_at: DateTime<Utc>,
    pub unloaded_at: Option<DateTime<Utc>>,
    pub loading_zone: String,
    pub unloading_zone: String,
    pub duration_min: Option<i64>,
    pub volume_m3: f64,
}

impl From<TripRow> for TripDto {
    fn from(row: TripRow) -> Self {
        Self {
            id: row.id,
            trip_number: row.trip_number,
            loaded_at: row.loaded_at,
            unloaded_at: row.unloaded_at,
            loading_zone: row.loading_zone,
            unloading_zone: row.unloading_zone,
            duration_min: row.duration_min,
            volume_m3: decimal(&row.volume_m3),
        }
    }
}

/// Fetch the trips of one record, ordered by trip number. Shared with the
/// shift-detail endpoint.
pub(crate) async fn trips_of_record(
    db: &sqlx::PgPool,
    shift_record_id: i64,
) -> Result<Vec<TripDto>, sqlx::Error> {
    let rows: Vec<TripRow> = sqlx::query_as(
        r#"SELECT id, trip_number, loaded_at, unloaded_at, loading_zone,
                  unloading_zone, duration_min, volume_m3::text AS volume_m3
           FROM dump_trucks.trips
           WHERE shift_record_id = $1
           ORDER BY trip_number"#,
    )
    .bind(shift_record_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TripFilter>,
) -> Result<Json<Envelope<Vec<TripDto>>>, ApiError> {
    let shift_record_id = filter
        .shift_record_id
        .ok_or_else(|| ApiError::bad_request("shiftRecordId is required"))?;

    let trips = trips_of_record(&state.db, shift_record_id).await?;
    let total = trips.len() as i64;
    Ok(Envelope::with_total(trips, total))
}
