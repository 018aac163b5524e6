//! Minimum-interval pacer for calls to the transcode worker.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::Clock;

/// Enforces a minimum interval between consecutive items.
///
/// The first acquisition after creation or [`Pacer::reset`] passes
/// immediately; each later one waits until `interval` has elapsed since the
/// previous acquisition, or since the last [`Pacer::mark_done`] if that came
/// later. Callers mark the end of each item so slow items still get a gap.
pub struct Pacer {
    clock: Arc<dyn Clock>,
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last: Mutex::new(None),
        }
    }

    /// Try to take the next slot.
    ///
    /// Returns `Ok(())` if the slot was taken.
    /// Returns `Err(wait)` with the remaining time otherwise.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        match *last {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev);
                if elapsed >= self.interval {
                    *last = Some(now);
                    Ok(())
                } else {
                    Err(self.interval - elapsed)
                }
            }
            None => {
                *last = Some(now);
                Ok(())
            }
        }
    }

    /// Wait until the next slot is available and take it.
    pub async fn ready(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => self.clock.sleep(wait).await,
            }
        }
    }

    /// Restart the interval from now.
    pub fn mark_done(&self) {
        let now = self.clock.now();
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
    }

    /// Forget the previous acquisition so the next one passes immediately.
    pub fn reset(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
