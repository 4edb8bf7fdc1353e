//! Shift windows
//!
//! The fleet operates two fixed 12-hour shifts in the operational timezone:
//! shift 1 runs 07:30–19:30, shift 2 runs 19:30–07:30 the following day.
//! A shift is identified by `(report_date, shift_type)` where `report_date`
//! is always the start-day of the window, even when shift 2 crosses midnight.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Local wall-clock boundary between the night shift and the day shift.
const SHIFT1_START: NaiveTime = match NaiveTime::from_hms_opt(7, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};
/// Local wall-clock boundary between the day shift and the night shift.
const SHIFT2_START: NaiveTime = match NaiveTime::from_hms_opt(19, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// One of the two operational shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    /// Daytime shift, 07:30–19:30 local.
    #[serde(rename = "shift1")]
    First,
    /// Nighttime shift, 19:30–07:30 next day local.
    #[serde(rename = "shift2")]
    Second,
}

impl ShiftType {
    /// Stable identifier used in storage and query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::First => "shift1",
            ShiftType::Second => "shift2",
        }
    }

    /// Parse the stable identifier back. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shift1" => Some(ShiftType::First),
            "shift2" => Some(ShiftType::Second),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open shift interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub shift_type: ShiftType,
    /// Start-day of the canonical window in the operational timezone.
    pub report_date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ShiftWindow {
    /// Shift length in seconds, floored at 1 to keep KPI divisions defined.
    pub fn duration_sec(&self) -> i64 {
        (self.end - self.start).num_seconds().max(1)
    }
}

/// Resolve a local wall-clock instant to UTC.
///
/// Ambiguous local times take the earlier offset; nonexistent local times
/// (a DST gap, impossible in the default operational timezone) are pushed
/// forward one hour.
fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}

/// Canonical window for `(date, shift_type)`:
/// shift 1 anchors at `date 07:30`, shift 2 at `date 19:30` ending `07:30`
/// the following day.
pub fn canonical_window(date: NaiveDate, shift_type: ShiftType, tz: Tz) -> ShiftWindow {
    let (start, end) = match shift_type {
        ShiftType::First => (
            local_instant(tz, date, SHIFT1_START),
            local_instant(tz, date, SHIFT2_START),
        ),
        ShiftType::Second => (
            local_instant(tz, date, SHIFT2_START),
            local_instant(tz, date + Duration::days(1), SHIFT1_START),
        ),
    };
    ShiftWindow {
        shift_type,
        report_date: date,
        start,
        end,
    }
}

/// Map a planned period onto the canonical shift windows it intersects.
///
/// Each returned window is clipped to `[planned_start, planned_end]` but
/// keeps the report date and shift type of its canonical window. Windows
/// come back ordered by start time; an inverted period yields nothing.
pub fn split_into_shifts(
    planned_start: DateTime<Utc>,
    planned_end: DateTime<Utc>,
    tz: Tz,
) -> Vec<ShiftWindow> {
    let mut windows = Vec::new();
    if planned_end <= planned_start {
        return windows;
    }

    // Start one day back: the previous night shift can reach into this day.
    let mut date = planned_start.with_timezone(&tz).date_naive() - Duration::days(1);
    loop {
        for shift_type in [ShiftType::First, ShiftType::Second] {
            let canonical = canonical_window(date, shift_type, tz);
            if canonical.start > planned_end {
                continue;
            }
            let start = canonical.start.max(planned_start);
            let end = canonical.end.min(planned_end);
            if start < end {
                windows.push(ShiftWindow {
                    start,
                    end,
                    ..canonical
                });
            }
        }
        date += Duration::days(1);
        if canonical_window(date, ShiftType::First, tz).start > planned_end {
            break;
        }
    }

    windows
}
