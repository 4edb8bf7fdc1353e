//! Wire shapes of the fleet-tracking service payloads.
//!
//! Only the consumed fields are typed; everything else rides along in the
//! raw `serde_json::Value` kept next to the parsed view. Timestamps inside
//! payloads are wall-clock strings in the operational timezone and go
//! through [`DateTimeCodec`](super::codec::DateTimeCodec) on the way in.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::codec::DateTimeCodec;
use crate::types::{TrackPoint, VehicleMonitoring};

/// `{"list": [...]}` envelope common to the list commands.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

/// One route list as returned by `getRouteListsByDateOut`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteListDto {
    pub id: i64,
    #[serde(default)]
    pub ts_number: Option<String>,
    #[serde(default)]
    pub date_out: Option<String>,
    #[serde(default)]
    pub date_out_plan: Option<String>,
    #[serde(default)]
    pub date_in_plan: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ts: Vec<RouteVehicleDto>,
    #[serde(default)]
    pub calcs: Vec<RouteCalcDto>,
}

/// A vehicle assigned to a route list.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteVehicleDto {
    #[serde(rename = "idMO")]
    pub id_mo: i64,
    #[serde(default, rename = "regNumber")]
    pub reg_number: Option<String>,
    #[serde(default, rename = "nameMO")]
    pub name_mo: Option<String>,
}

/// A calculation line carrying the free-form order description.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCalcDto {
    #[serde(default)]
    pub order_descr: Option<String>,
    #[serde(default)]
    pub object_expend: Option<Value>,
}

/// A work request, consumed fields plus the verbatim payload.
#[derive(Debug, Clone)]
pub struct RequestDto {
    pub request_id: i64,
    pub number: Option<i64>,
    pub status: Option<String>,
    pub raw: Value,
}

impl RequestDto {
    /// Extract the consumed fields; entries without a numeric `id` are
    /// dropped by the caller.
    pub fn from_value(raw: Value) -> Option<Self> {
        let request_id = raw.get("id")?.as_i64()?;
        let number = raw.get("number").and_then(Value::as_i64);
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            request_id,
            number,
            status,
            raw,
        })
    }
}

/// Monitoring payload of `getMonitoringStats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringDto {
    #[serde(default)]
    pub engine_time: Option<f64>,
    #[serde(default)]
    pub moving_time: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub track: Vec<TrackPointDto>,
}

/// One GPS fix on the wire. `time` is a wall-clock string.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPointDto {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub time: Option<String>,
}

impl MonitoringDto {
    /// Reduce the wire shape to the domain view, keeping the raw envelope.
    ///
    /// Track points whose timestamp fails to parse are dropped; the track's
    /// upstream time ordering is preserved as-is.
    pub fn into_domain(self, raw: Value, codec: &DateTimeCodec) -> VehicleMonitoring {
        let total = self.track.len();
        let track: Vec<TrackPoint> = self
            .track
            .into_iter()
            .filter_map(|p| {
                let timestamp = codec.parse_instant(p.time.as_deref()?)?;
                Some(TrackPoint {
                    lat: p.lat,
                    lon: p.lon,
                    timestamp,
                })
            })
            .collect();
        if track.len() < total {
            debug!(
                dropped = total - track.len(),
                "dropped track points with unparseable timestamps"
            );
        }
        VehicleMonitoring {
            engine_time_sec: self.engine_time.unwrap_or(0.0) as i64,
            moving_time_sec: self.moving_time.unwrap_or(0.0) as i64,
            distance_km: self.distance.unwrap_or(0.0),
            track,
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Yekaterinburg;

    #[test]
    fn route_list_wire_names_decode() {
        let raw = serde_json::json!({
            "id": 42,
            "tsNumber": "PL-42",
            "dateOutPlan": "05.06.2024 07:00",
            "dateInPlan": "05.06.2024 21:00",
            "status": "closed",
            "ts": [{"idMO": 7, "regNumber": "A123BC", "nameMO": "Самосвал КамАЗ"}],
            "calcs": [{"orderDescr": "№ 1507 щебень", "objectExpend": null}]
        });
        let dto: RouteListDto = serde_json::from_value(raw).unwrap();
        assert_eq!(dto.id, 42);
        assert_eq!(dto.ts[0].id_mo, 7);
        assert_eq!(dto.ts[0].name_mo.as_deref(), Some("Самосвал КамАЗ"));
        assert_eq!(dto.calcs[0].order_descr.as_deref(), Some("№ 1507 щебень"));
    }

    #[test]
    fn request_keeps_raw_payload_verbatim() {
        let raw = serde_json::json!({
            "id": 9, "number": 1507, "status": "active", "cargo": "щебень"
        });
        let dto = RequestDto::from_value(raw.clone()).unwrap();
        assert_eq!(dto.request_id, 9);
        assert_eq!(dto.number, Some(1507));
        assert_eq!(dto.raw, raw);

        assert!(RequestDto::from_value(serde_json::json!({"number": 1})).is_none());
    }

    #[test]
    fn monitoring_drops_unparseable_track_points() {
        let codec = DateTimeCodec::new(Yekaterinburg);
        let raw = serde_json::json!({
            "engineTime": 3600.0,
            "movingTime": 1800.0,
            "distance": 52.4,
            "track": [
                {"lat": 56.8, "lon": 60.6, "time": "05.06.2024 08:00:00"},
                {"lat": 56.9, "lon": 60.7, "time": "not-a-time"},
                {"lat": 57.0, "lon": 60.8}
            ],
            "parkings": [],
            "fuels": []
        });
        let dto: MonitoringDto = serde_json::from_value(raw.clone()).unwrap();
        let monitoring = dto.into_domain(raw.clone(), &codec);

        assert_eq!(monitoring.engine_time_sec, 3600);
        assert_eq!(monitoring.moving_time_sec, 1800);
        assert_eq!(monitoring.track.len(), 1);
        assert_eq!(monitoring.raw, raw);
    }
}
