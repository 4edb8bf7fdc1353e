//! Ingestion pipeline
//!
//! The shift-fetch orchestrator drives one `(date, shift)` ingestion run;
//! the scheduler fires it at fixed local wall-clock times. Runs never
//! overlap: both the scheduler and the manual admin trigger go through the
//! shared [`SingleFlight`] guard, and a trigger arriving mid-run is
//! coalesced.

pub mod orchestrator;
pub mod route_lists;
pub mod scheduler;

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

pub use orchestrator::{FetchSummary, ShiftIngestor, VehicleFailure};
pub use route_lists::{ParsedRouteList, RouteListParser, TargetVehicle};

/// Mutual exclusion for orchestrator runs.
///
/// `try_begin` either hands out the run permit or reports that a run is
/// already in flight; callers drop the permit when the run finishes.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    inner: Arc<Mutex<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// The run permit, or `None` while another run holds it.
    pub fn try_begin(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.inner).try_lock_owned().ok()
    }
}
