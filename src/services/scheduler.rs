//! Wall-clock tick scheduling.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Schedules ticks on wall-clock boundaries of the scan interval, aligned
/// to local midnight in the scan timezone.
///
/// The scheduler is stateful: landing exactly on a boundary yields a zero
/// wait once, and the same boundary is never handed out twice, so a tick
/// that finishes within the same millisecond cannot fire again until the
/// next boundary.
#[derive(Debug)]
pub struct TickScheduler {
    interval_ms: i64,
    tz: Tz,
    last_boundary_ms: Option<i64>,
}

impl TickScheduler {
    pub fn new(interval_secs: u64, tz: Tz) -> Self {
        Self {
            interval_ms: interval_secs as i64 * 1000,
            tz,
            last_boundary_ms: None,
        }
    }

    /// Time to sleep from `now` until the next boundary.
    pub fn wait_from(&mut self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&self.tz);
        let day_ms = i64::from(local.num_seconds_from_midnight()) * 1000
            + i64::from(local.timestamp_subsec_millis());
        let into_interval = day_ms % self.interval_ms;
        let boundary_ms = now.timestamp_millis() - into_interval;

        if into_interval == 0 && self.last_boundary_ms != Some(boundary_ms) {
            self.last_boundary_ms = Some(boundary_ms);
            return Duration::ZERO;
        }

        let next_ms = boundary_ms + self.interval_ms;
        self.last_boundary_ms = Some(next_ms);
        Duration::from_millis((next_ms - now.timestamp_millis()) as u64)
    }
}
