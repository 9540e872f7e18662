//! Recurring cycle trigger
//!
//! Fires on the strategy's bucket boundaries in UTC: every `every` minutes
//! for minute units, every `every` hours at minute 0 for hour units. A cycle
//! always runs to completion before the next boundary is computed, so cycles
//! never overlap, and the first failed cycle stops the schedule.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::common::types::Interval;
use crate::desk::{CycleError, TradingDesk};

/// Boundary-aligned firing times for one interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSchedule {
    interval: Interval,
}

impl CycleSchedule {
    pub fn new(interval: Interval) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// First firing instant strictly after `now`
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.interval.next_boundary_after(now)
    }

    /// Time left until the next firing instant
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_fire(now) - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Run cycles on `schedule` until one fails or `shutdown` resolves
///
/// Returns the number of completed cycles on shutdown. A shutdown request
/// only interrupts the wait between cycles; a running cycle is never cut off.
pub async fn run_until_failure<F>(
    desk: &mut TradingDesk,
    schedule: CycleSchedule,
    shutdown: F,
) -> Result<u64, CycleError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut completed = 0u64;

    loop {
        let now = Utc::now();
        let next = schedule.next_fire(now);
        info!(next = %next, interval = %schedule.interval(), "Waiting for next cycle");

        tokio::select! {
            _ = &mut shutdown => {
                info!(completed, "Shutdown requested, stopping schedule");
                return Ok(completed);
            }
            _ = tokio::time::sleep(schedule.delay_until_next(now)) => {}
        }

        if let Err(err) = desk.run_cycle().await {
            warn!(completed, "Stopping schedule after failed cycle");
            return Err(err);
        }
        completed += 1;
    }
}
