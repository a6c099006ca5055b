//! Injectable time source.
//!
//! The suppression deadline and the cluster-id retry backoff both depend on
//! wall-clock time. Putting both behind a trait keeps those paths testable
//! without real waiting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Wall-clock time and blocking sleep.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the unix epoch.
    fn now_millis(&self) -> u64;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// System clock backed by `std::time`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock for tests. `sleep` advances the clock instead of
/// blocking, so retry loops run instantly.
#[derive(Default)]
pub struct ManualClock {
    now_millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `now_millis`.
    pub fn at(now_millis: u64) -> Self {
        Self {
            now_millis: AtomicU64::new(now_millis),
        }
    }

    /// Advance the clock.
    pub fn advance(&self, duration: Duration) {
        self.now_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 3_000);
    }

    #[test]
    fn manual_sleep_advances_instead_of_blocking() {
        let clock = ManualClock::at(0);
        clock.sleep(Duration::from_secs(60));
        assert_eq!(clock.now_millis(), 60_000);
    }
}
