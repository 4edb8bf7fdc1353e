//! Manual ingestion trigger.
//!
//! Fires the orchestrator without awaiting it; callers observe completion
//! via subsequent reads. Shares the single-flight guard with the scheduler,
//! so a trigger during a running ingestion is coalesced.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::envelope::ApiError;
use crate::api::handlers::parse_iso_date;
use crate::api::AppState;
use crate::types::ShiftType;

#[derive(Deserialize)]
pub struct FetchParams {
    pub date: Option<String>,
    pub shift: Option<String>,
}

#[derive(Serialize)]
pub struct FetchStarted {
    pub status: &'static str,
}

pub async fn trigger_fetch(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> Result<Json<FetchStarted>, ApiError> {
    let date = params
        .date
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("date is required"))
        .and_then(|s| parse_iso_date("date", s))?;
    let shift_type = params
        .shift
        .as_deref()
        .and_then(ShiftType::parse)
        .ok_or_else(|| ApiError::bad_request("shift must be shift1 or shift2"))?;

    let ingestor = Arc::clone(&state.ingestor);
    let guard = state.guard.clone();
    let cancel = state.cancel.clone();
    tokio::spawn(async move {
        let Some(permit) = guard.try_begin() else {
            warn!(%date, shift = %shift_type, "ingestion already in flight, manual trigger coalesced");
            return;
        };
        match ingestor.run(date, shift_type, &cancel).await {
            Ok(summary) => info!(
                %date,
                shift = %shift_type,
                processed = summary.processed_count,
                skipped = summary.skipped_count,
                errors = summary.errors.len(),
                "manual ingestion finished"
            ),
            Err(e) => error!(%date, shift = %shift_type, error = %e, "manual ingestion failed"),
        }
        drop(permit);
    });

    Ok(Json(FetchStarted { status: "started" }))
}
