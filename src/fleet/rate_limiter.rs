//! Per-vehicle minimum gap between monitoring calls.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a minimum interval between calls keyed by vehicle id.
///
/// There is no global limit: callers for different ids never block each
/// other, callers for the same id serialise. The map lock is only held to
/// reserve a slot; the wait itself happens outside it.
#[derive(Debug)]
pub struct VehicleRateLimiter {
    interval: Duration,
    slots: Mutex<HashMap<i64, Instant>>,
}

impl VehicleRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until at least `interval` has elapsed since the previous
    /// `acquire` return for this vehicle, then record now.
    pub async fn acquire(&self, vehicle_id: i64) {
        let ready_at = {
            let mut slots = self.slots.lock().await;
            let now = Instant::now();
            let ready_at = match slots.get(&vehicle_id) {
                Some(last) => (*last + self.interval).max(now),
                None => now,
            };
            // Reserve the slot before sleeping so concurrent callers for the
            // same id queue behind this reservation.
            slots.insert(vehicle_id, ready_at);
            ready_at
        };
        tokio::time::sleep_until(ready_at).await;
    }
}
