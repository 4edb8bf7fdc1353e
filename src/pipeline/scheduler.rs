//! Wall-clock scheduler for the ingestion runs.
//!
//! Two fixed daily triggers in the operational timezone:
//!
//! - `08:30` — ingest yesterday's night shift (shift 2)
//! - `20:30` — ingest today's day shift (shift 1)
//!
//! A trigger that lands while the previous run is still in flight is
//! coalesced: dropped with a log line, never queued.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{ShiftIngestor, SingleFlight};
use crate::types::ShiftType;

/// Morning trigger: the night shift that ended at 07:30 is complete.
const MORNING_TRIGGER: NaiveTime = match NaiveTime::from_hms_opt(8, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};
/// Evening trigger: the day shift that ended at 19:30 is complete.
const EVENING_TRIGGER: NaiveTime = match NaiveTime::from_hms_opt(20, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// What a trigger ingests, derived from its local fire date.
fn trigger_target(local_date: NaiveDate, trigger: NaiveTime) -> (NaiveDate, ShiftType) {
    if trigger == MORNING_TRIGGER {
        (local_date - Duration::days(1), ShiftType::Second)
    } else {
        (local_date, ShiftType::First)
    }
}

/// Run the scheduler until cancelled.
pub async fn run_scheduler(
    ingestor: Arc<ShiftIngestor>,
    guard: SingleFlight,
    tz: Tz,
    cancel: CancellationToken,
) {
    info!(timezone = %tz, "scheduler started");
    loop {
        let now = Utc::now().with_timezone(&tz);
        let today = now.date_naive();

        // Next trigger strictly after now, scanning today then tomorrow.
        let mut candidates = Vec::new();
        for date in [today, today + Duration::days(1)] {
            for trigger in [MORNING_TRIGGER, EVENING_TRIGGER] {
                if let Some(at) = tz
                    .from_local_datetime(&date.and_time(trigger))
                    .earliest()
                {
                    if at > now {
                        candidates.push((at, date, trigger));
                    }
                }
            }
        }
        let Some((fire_at, fire_date, trigger)) =
            candidates.into_iter().min_by(|a, b| a.0.cmp(&b.0))
        else {
            // Both trigger times fell into a timezone gap; try again shortly.
            warn!("no resolvable trigger time, retrying in an hour");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(std::time::Duration::from_secs(3600)) => continue,
            }
        };

        let wait = (fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        info!(fire_at = %fire_at, wait_secs = wait.as_secs(), "next ingestion trigger scheduled");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        let (date, shift_type) = trigger_target(fire_date, trigger);
        let Some(permit) = guard.try_begin() else {
            warn!(%date, shift = %shift_type, "previous run still in flight, trigger coalesced");
            continue;
        };

        match ingestor.run(date, shift_type, &cancel).await {
            Ok(summary) => info!(
                %date,
                shift = %shift_type,
                processed = summary.processed_count,
                skipped = summary.skipped_count,
                errors = summary.errors.len(),
                "scheduled ingestion finished"
            ),
            Err(e) => error!(%date, shift = %shift_type, error = %e, "scheduled ingestion failed"),
        }
        drop(permit);
    }
    info!("scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morning_trigger_targets_yesterdays_night_shift() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(
            trigger_target(date, MORNING_TRIGGER),
            (NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(), ShiftType::Second)
        );
    }

    #[test]
    fn evening_trigger_targets_todays_day_shift() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(
            trigger_target(date, EVENING_TRIGGER),
            (date, ShiftType::First)
        );
    }
}
