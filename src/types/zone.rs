//! Tagged geofence polygons and the work-site objects that own them.

use geo::{Contains, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

/// Role of a zone within its work site.
///
/// Stored tags carry the reserved `dt_` family prefix; the bare name is what
/// the pipeline persists on zone events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneTag {
    /// Site perimeter.
    Boundary,
    /// Loading bay.
    Loading,
    /// Dump bay.
    Unloading,
}

impl ZoneTag {
    /// Map a stored `dt_*` tag to its role. Unknown tags yield `None`.
    pub fn from_db_tag(tag: &str) -> Option<Self> {
        match tag {
            "dt_boundary" => Some(ZoneTag::Boundary),
            "dt_loading" => Some(ZoneTag::Loading),
            "dt_unloading" => Some(ZoneTag::Unloading),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneTag::Boundary => "boundary",
            ZoneTag::Loading => "loading",
            ZoneTag::Unloading => "unloading",
        }
    }

    /// Parse the bare role name persisted on zone events.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boundary" => Some(ZoneTag::Boundary),
            "loading" => Some(ZoneTag::Loading),
            "unloading" => Some(ZoneTag::Unloading),
            _ => None,
        }
    }
}

impl std::fmt::Display for ZoneTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged zone polygon, loaded read-only at pipeline start.
///
/// Geometry is WGS84 with longitude-then-latitude axis order.
#[derive(Debug, Clone)]
pub struct Zone {
    pub zone_uid: String,
    pub name: String,
    pub object_uid: String,
    pub tag: ZoneTag,
    pub geometry: MultiPolygon<f64>,
}

impl Zone {
    /// 2-D point-in-polygon test for a track point.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }
}

/// A named work site aggregating zones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoObject {
    pub object_uid: String,
    pub name: String,
}
