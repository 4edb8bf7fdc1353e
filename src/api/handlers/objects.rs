//! Work-site objects owning any `dt_*` zone.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::envelope::{ApiError, Envelope};
use crate::api::AppState;
use crate::types::GeoObject;

pub async fn list_objects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<GeoObject>>>, ApiError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"SELECT DISTINCT o.object_uid, o.name
           FROM geo.objects o
           JOIN geo.zones z ON z.object_uid = o.object_uid
           WHERE z.tag LIKE 'dt\_%'
           ORDER BY o.name"#,
    )
    .fetch_all(&state.db)
    .await?;

    let objects: Vec<GeoObject> = rows
        .into_iter()
        .map(|(object_uid, name)| GeoObject { object_uid, name })
        .collect();
    let total = objects.len() as i64;
    Ok(Envelope::with_total(objects, total))
}
