//! Read-only HTTP surface consumed by the dashboard.
//!
//! All endpoints live under `/api/dt`, answer `{data, total?}` envelopes,
//! and take `YYYY-MM-DD` date parameters. The only write-ish endpoint is
//! the admin fetch trigger, which fires the orchestrator asynchronously.

pub mod envelope;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::pipeline::{ShiftIngestor, SingleFlight};

/// Shared application state behind the router.
pub struct AppState {
    pub db: PgPool,
    pub ingestor: Arc<ShiftIngestor>,
    pub guard: SingleFlight,
    pub cancel: CancellationToken,
}

/// Build the complete API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let dt_routes = Router::new()
        .route("/health", get(handlers::health::get_health))
        .route("/objects", get(handlers::objects::list_objects))
        .route(
            "/shift-records",
            get(handlers::shift_records::list_shift_records),
        )
        .route("/trips", get(handlers::trips::list_trips))
        .route("/zone-events", get(handlers::zone_events::list_zone_events))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:number/gantt", get(handlers::orders::order_gantt))
        .route(
            "/shift-detail",
            get(handlers::shift_detail::get_shift_detail),
        )
        .route("/admin/fetch", post(handlers::admin::trigger_fetch));

    Router::new()
        .nest("/api/dt", dt_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
