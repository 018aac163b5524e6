//! Virtual clock for testing paced code without real delays.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::pacing::Clock;

#[derive(Debug, Default)]
struct ClockState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

/// Clock whose time only moves when told to.
///
/// `sleep` records the requested duration, advances virtual time by it and
/// yields once, so paced loops run at full speed while still observing the
/// intervals they asked for.
///
/// # Example
///
/// ```rust,ignore
/// let clock = Arc::new(ManualClock::new());
/// let pacer = Pacer::new(clock.clone(), Duration::from_secs(2));
///
/// pacer.ready().await;
/// pacer.ready().await;
/// assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(2)]);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ClockState>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ClockState::default()),
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        self.lock().offset += by;
    }

    /// Durations passed to `sleep`, in call order.
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Total virtual time elapsed since creation.
    pub fn total_advanced(&self) -> Duration {
        self.lock().offset
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.lock().offset
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.sleeps.push(duration);
            state.offset += duration;
        }
        tokio::task::yield_now().await;
    }
}
