//! Route-list parsing: target-vehicle filtering, request-number extraction
//! and shift splitting.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::fleet::codec::DateTimeCodec;
use crate::fleet::wire::RouteListDto;
use crate::types::shift::split_into_shifts;
use crate::types::ShiftWindow;

/// Display-name marker of the vehicles this pipeline targets.
const TARGET_NAME_MARKER: &str = "самосвал";

/// A vehicle kept after filtering, with its denormalised display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetVehicle {
    pub vehicle_id: i64,
    pub name: String,
    pub plate: String,
}

/// One route list reduced to what the pipeline consumes.
#[derive(Debug, Clone)]
pub struct ParsedRouteList {
    pub pl_id: i64,
    pub ts_number: Option<String>,
    pub status: Option<String>,
    pub date_out: Option<DateTime<Utc>>,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    pub vehicles: Vec<TargetVehicle>,
    /// Deduplicated, insertion-ordered request numbers from the calc lines.
    pub request_numbers: Vec<i64>,
    /// Canonical shift windows the planned period intersects, clipped.
    pub shifts: Vec<ShiftWindow>,
}

/// Filters raw route lists down to target vehicles and derives the shift
/// windows each planned period covers.
pub struct RouteListParser {
    codec: DateTimeCodec,
    test_vehicle_ids: Option<HashSet<i64>>,
    request_number: Regex,
}

impl RouteListParser {
    /// `test_vehicle_ids` switches filtering to test mode: only the listed
    /// ids are kept, regardless of display name.
    #[allow(clippy::expect_used)]
    pub fn new(codec: DateTimeCodec, test_vehicle_ids: Option<&[i64]>) -> Self {
        Self {
            codec,
            test_vehicle_ids: test_vehicle_ids.map(|ids| ids.iter().copied().collect()),
            // Leading "№" and whitespace, then the leading run of digits.
            request_number: Regex::new(r"^\s*№?\s*(\d+)").expect("static regex"),
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_vehicle_ids.is_some()
    }

    /// Parse a raw batch. Lists whose planned start or end fails to parse
    /// are skipped.
    pub fn parse(&self, lists: &[RouteListDto]) -> Vec<ParsedRouteList> {
        let mut parsed = Vec::new();
        for dto in lists {
            let planned_start = dto
                .date_out_plan
                .as_deref()
                .and_then(|s| self.codec.parse_instant(s));
            let planned_end = dto
                .date_in_plan
                .as_deref()
                .and_then(|s| self.codec.parse_instant(s));
            let (Some(planned_start), Some(planned_end)) = (planned_start, planned_end) else {
                debug!(pl_id = dto.id, "skipping route list with unparseable planned period");
                continue;
            };

            let vehicles: Vec<TargetVehicle> = dto
                .ts
                .iter()
                .filter(|v| self.is_target(v.id_mo, v.name_mo.as_deref()))
                .map(|v| TargetVehicle {
                    vehicle_id: v.id_mo,
                    name: v.name_mo.clone().unwrap_or_default(),
                    plate: v.reg_number.clone().unwrap_or_default(),
                })
                .collect();

            let mut request_numbers = Vec::new();
            for calc in &dto.calcs {
                let Some(descr) = calc.order_descr.as_deref() else {
                    continue;
                };
                if let Some(number) = self.extract_request_number(descr) {
                    if !request_numbers.contains(&number) {
                        request_numbers.push(number);
                    }
                }
            }

            parsed.push(ParsedRouteList {
                pl_id: dto.id,
                ts_number: dto.ts_number.clone(),
                status: dto.status.clone(),
                date_out: dto
                    .date_out
                    .as_deref()
                    .and_then(|s| self.codec.parse_instant(s)),
                planned_start,
                planned_end,
                vehicles,
                request_numbers,
                shifts: split_into_shifts(planned_start, planned_end, self.codec.timezone()),
            });
        }
        parsed
    }

    /// First integer after an optional leading `№`.
    pub fn extract_request_number(&self, order_descr: &str) -> Option<i64> {
        self.request_number
            .captures(order_descr)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    fn is_target(&self, vehicle_id: i64, name: Option<&str>) -> bool {
        match &self.test_vehicle_ids {
            Some(ids) => ids.contains(&vehicle_id),
            None => name
                .map(|n| n.to_lowercase().contains(TARGET_NAME_MARKER))
                .unwrap_or(false),
        }
    }
}
