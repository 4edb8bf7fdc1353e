//! Work requests with their aggregated shift-record activity, and the
//! per-order gantt breakdown.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, Envelope};
use crate::api::handlers::parse_iso_date;
use crate::api::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub request_id: i64,
    pub number: Option<i64>,
    pub status: Option<String>,
    pub shifts_count: i64,
    pub trips_count: i64,
    pub vehicles_count: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Envelope<Vec<OrderDto>>>, ApiError> {
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

    let orders: Vec<OrderDto> = sqlx::query_as(
        r#"SELECT r.request_id, r.number, r.status,
                  COUNT(sr.id) AS shifts_count,
                  COALESCE(SUM(sr.trips_count), 0)::bigint AS trips_count,
                  COUNT(DISTINCT sr.vehicle_id) AS vehicles_count,
                  MIN(sr.report_date) AS first_date,
                  MAX(sr.report_date) AS last_date
           FROM dump_trucks.requests r
           LEFT JOIN dump_trucks.shift_records sr
             ON r.number IS NOT NULL
            AND sr.request_numbers @> ARRAY[r.number]
            AND ($1::date IS NULL OR sr.report_date >= $1)
            AND ($2::date IS NULL OR sr.report_date <= $2)
           GROUP BY r.request_id, r.number, r.status
           ORDER BY r.number NULLS LAST, r.request_id"#,
    )
    .bind(date_from)
    .bind(date_to)
    .fetch_all(&state.db)
    .await?;

    let total = orders.len() as i64;
    Ok(Envelope::with_total(orders, total))
}

#[derive(Debug, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttCellDto {
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub report_date: NaiveDate,
    pub shift_type: String,
    pub trips_count: i64,
}

/// Per-vehicle, per-day, per-shift trip counts for one order number.
pub async fn order_gantt(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
) -> Result<Json<Envelope<Vec<GanttCellDto>>>, ApiError> {
    let cells: Vec<GanttCellDto> = sqlx::query_as(
        r#"SELECT vehicle_id, vehicle_name, report_date, shift_type, trips_count
           FROM dump_trucks.shift_records
           WHERE request_numbers @> ARRAY[$1::bigint]
           ORDER BY vehicle_id, report_date, shift_type"#,
    )
    .bind(number)
    .fetch_all(&state.db)
    .await?;

    let total = cells.len() as i64;
    Ok(Envelope::with_total(cells, total))
}
