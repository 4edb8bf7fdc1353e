//! Read-only geofence snapshot.
//!
//! Zones of the reserved `dt_` tag family are loaded eagerly at run start
//! and handed to the analysis layer as one immutable snapshot; there is no
//! incremental refresh. The geofence-admin service is the only writer.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::types::{Zone, ZoneTag};

/// Immutable zone set for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct GeofenceSnapshot {
    /// Zones ordered by `zone_uid`, which keeps object detection
    /// deterministic on tie counts.
    pub zones: Vec<Zone>,
    /// Display names of the owning objects, keyed by `object_uid`.
    pub object_names: HashMap<String, String>,
}

/// Load every `dt_*` zone with decoded geometry.
///
/// A zone whose tag is unknown or whose geometry fails to decode is skipped
/// with a warning; a query failure aborts the run.
pub async fn load_zone_snapshot(pool: &PgPool) -> Result<GeofenceSnapshot, PipelineError> {
    let rows: Vec<(String, String, String, String, Value, String)> = sqlx::query_as(
        r#"SELECT z.zone_uid, z.name, z.object_uid, z.tag, z.geometry, o.name
           FROM geo.zones z
           JOIN geo.objects o ON o.object_uid = z.object_uid
           WHERE z.tag LIKE 'dt\_%'
           ORDER BY z.zone_uid"#,
    )
    .fetch_all(pool)
    .await?;

    let mut snapshot = GeofenceSnapshot::default();
    for (zone_uid, name, object_uid, tag, geometry, object_name) in rows {
        let Some(tag) = ZoneTag::from_db_tag(&tag) else {
            warn!(zone_uid, tag, "unknown zone tag, skipping");
            continue;
        };
        let geometry = match decode_geometry(&geometry) {
            Ok(g) => g,
            Err(message) => {
                let e = PipelineError::GeometryInvalid {
                    zone_uid: zone_uid.clone(),
                    message,
                };
                warn!(error = %e, "skipping zone");
                continue;
            }
        };
        snapshot
            .object_names
            .entry(object_uid.clone())
            .or_insert(object_name);
        snapshot.zones.push(Zone {
            zone_uid,
            name,
            object_uid,
            tag,
            geometry,
        });
    }

    info!(
        zones = snapshot.zones.len(),
        objects = snapshot.object_names.len(),
        "geofence snapshot loaded"
    );
    Ok(snapshot)
}

/// Decode a stored GeoJSON geometry into a multi-polygon.
///
/// Single polygons are lifted into a one-element multi-polygon; any other
/// geometry kind is invalid for a zone.
fn decode_geometry(value: &Value) -> Result<geo::MultiPolygon<f64>, String> {
    let geometry: geojson::Geometry =
        serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    let decoded: geo::Geometry<f64> = geometry.try_into().map_err(|e: geojson::Error| e.to_string())?;
    match decoded {
        geo::Geometry::Polygon(p) => Ok(geo::MultiPolygon(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        other => Err(format!(
            "expected (multi)polygon, got {}",
            geometry_kind(&other)
        )),
    }
}

fn geometry_kind(g: &geo::Geometry<f64>) -> &'static str {
    match g {
        geo::Geometry::Point(_) => "point",
        geo::Geometry::Line(_) => "line",
        geo::Geometry::LineString(_) => "linestring",
        geo::Geometry::Polygon(_) => "polygon",
        geo::Geometry::MultiPoint(_) => "multipoint",
        geo::Geometry::MultiLineString(_) => "multilinestring",
        geo::Geometry::MultiPolygon(_) => "multipolygon",
        geo::Geometry::GeometryCollection(_) => "geometrycollection",
        geo::Geometry::Rect(_) => "rect",
        geo::Geometry::Triangle(_) => "triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_geojson_decodes_to_multipolygon() {
        let value = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[60.0, 56.0], [61.0, 56.0], [61.0, 57.0], [60.0, 57.0], [60.0, 56.0]]]
        });
        let mp = decode_geometry(&value).unwrap();
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn multipolygon_geojson_decodes_directly() {
        let value = serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]]
            ]
        });
        let mp = decode_geometry(&value).unwrap();
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn non_polygon_geometry_is_invalid() {
        let value = serde_json::json!({"type": "Point", "coordinates": [60.0, 56.0]});
        assert!(decode_geometry(&value).is_err());
        assert!(decode_geometry(&serde_json::json!({"bogus": true})).is_err());
    }
}
