//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::envelope::Envelope;
use crate::api::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub db_connected: bool,
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Envelope<HealthStatus>> {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.db).await.is_ok();

    Envelope::new(HealthStatus {
        status: if db_ok { "healthy" } else { "degraded" }.to_string(),
        db_connected: db_ok,
    })
}
