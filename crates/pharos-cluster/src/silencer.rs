//! Repeated-diagnostic throttling.
//!
//! While a cluster converges the same condition (a member still partially
//! started, a sync token not yet seen) recurs on every call. The first
//! occurrence logs at info, repeats log at debug, and a clean view build
//! resets the slate so the next episode is loud again.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{debug, info};

/// Logs each distinct message at info once, then at debug until reset.
#[derive(Default)]
pub struct LogSilencer {
    seen: Mutex<HashSet<String>>,
}

impl LogSilencer {
    /// Create an empty silencer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `msg`, loud on first occurrence since the last reset.
    pub fn info_or_debug(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        let mut seen = self.seen.lock().expect("silencer poisoned");
        if seen.insert(msg.to_string()) {
            info!("{msg}");
        } else {
            debug!("{msg}");
        }
    }

    /// Forget all previously seen messages.
    pub fn reset(&self) {
        let mut seen = self.seen.lock().expect("silencer poisoned");
        if !seen.is_empty() {
            seen.clear();
        }
    }

    #[cfg(test)]
    fn has_seen(&self, msg: &str) -> bool {
        self.seen.lock().unwrap().contains(msg)
    }
}
