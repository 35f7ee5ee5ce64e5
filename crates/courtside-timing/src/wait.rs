use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::instant::LocalInstant;

/// Pick the sleep step for a remaining wait.
///
/// Coarse polling far out keeps wakeups cheap; the step tightens to 100 ms
/// inside the last ten seconds so the deadline is hit with sub-second
/// precision.
pub fn poll_interval(remaining: Duration) -> StdDuration {
    if remaining > Duration::seconds(60) {
        StdDuration::from_secs(30)
    } else if remaining > Duration::seconds(10) {
        StdDuration::from_secs(1)
    } else {
        StdDuration::from_millis(100)
    }
}

/// A clock bound to a timezone, able to park a task until a target instant.
///
/// Carries no mutable state; any number of jobs may share one by value.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn zone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Block the calling task until `target` is reached (`true`) or `cancel`
    /// is asserted (`false`).
    ///
    /// The token is checked at the top of every iteration, before the
    /// remaining time is computed, so a pre-asserted token returns
    /// immediately without sleeping, even for targets in the past. Each
    /// sleep races the token, so an assertion mid-step unblocks promptly
    /// rather than at the next poll.
    ///
    /// Naive targets are interpreted in the bound zone; offset-aware ones
    /// are converted to it.
    pub async fn wait_until(
        &self,
        target: impl Into<LocalInstant>,
        cancel: &CancellationToken,
    ) -> bool {
        let target = target.into().resolve(self.tz);
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let remaining = target.signed_duration_since(self.now());
            if remaining <= Duration::zero() {
                return true;
            }
            let step = poll_interval(remaining);
            trace!(remaining_secs = remaining.num_seconds(), ?step, "waiting");
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(step) => {}
            }
        }
    }
}
