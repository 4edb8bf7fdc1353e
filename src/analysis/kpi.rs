//! Per-shift utilisation and motion KPIs.

use crate::types::{ShiftWindow, Trip};

/// Derived KPI bundle for one vehicle-shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftKpis {
    /// Engine-on time over shift length, percent, clamped to [0, 100].
    pub kip_pct: f64,
    /// Moving time over engine time, percent, clamped to [0, 100].
    pub movement_pct: f64,
    pub onsite_min: i64,
    pub fact_volume_m3: f64,
    pub trips_count: i64,
}

/// Compute the KPI bundle.
///
/// Percentages are clamped before rounding half-up to 2 decimals. A dead
/// engine yields a movement of exactly 0.
pub fn calculate_kpis(
    window: &ShiftWindow,
    engine_time_sec: i64,
    moving_time_sec: i64,
    onsite_sec: i64,
    trips: &[Trip],
) -> ShiftKpis {
    let shift_sec = window.duration_sec() as f64;
    let kip_pct = round2(((engine_time_sec as f64 / shift_sec) * 100.0).clamp(0.0, 100.0));
    let movement_pct = if engine_time_sec > 0 {
        round2(
            ((moving_time_sec as f64 / engine_time_sec as f64) * 100.0).clamp(0.0, 100.0),
        )
    } else {
        0.0
    };
    ShiftKpis {
        kip_pct,
        movement_pct,
        onsite_min: ((onsite_sec as f64) / 60.0).round() as i64,
        fact_volume_m3: trips.iter().map(|t| t.volume_m3).sum(),
        trips_count: trips.len() as i64,
    }
}

/// Round half-up to 2 decimals.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::shift::canonical_window;
    use crate::types::ShiftType;
    use chrono::NaiveDate;
    use chrono_tz::Asia::Yekaterinburg;

    fn day_shift() -> ShiftWindow {
        canonical_window(
            NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            ShiftType::First,
            Yekaterinburg,
        )
    }

    #[test]
    fn simple_delivery_percentages() {
        // One hour of engine over a 12-hour shift, half of it moving.
        let kpis = calculate_kpis(&day_shift(), 3600, 1800, 0, &[]);
        assert_eq!(kpis.kip_pct, 8.33);
        assert_eq!(kpis.movement_pct, 50.00);
    }

    #[test]
    fn percentages_stay_clamped() {
        // Engine time longer than the shift, movement above the engine time.
        let kpis = calculate_kpis(&day_shift(), 100_000, 200_000, 0, &[]);
        assert_eq!(kpis.kip_pct, 100.0);
        assert_eq!(kpis.movement_pct, 100.0);

        let kpis = calculate_kpis(&day_shift(), 0, 200_000, 0, &[]);
        assert_eq!(kpis.kip_pct, 0.0);
        assert_eq!(kpis.movement_pct, 0.0);
    }

    #[test]
    fn onsite_minutes_round_to_nearest() {
        let kpis = calculate_kpis(&day_shift(), 3600, 0, 89, &[]);
        assert_eq!(kpis.onsite_min, 1);
        let kpis = calculate_kpis(&day_shift(), 3600, 0, 91, &[]);
        assert_eq!(kpis.onsite_min, 2);
    }
}
