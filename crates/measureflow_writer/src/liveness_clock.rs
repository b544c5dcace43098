//! The sink's shared idle-timeout clock: written by both the network loop
//! and the disk thread (via its `touch()` callback), read only by the
//! network loop.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct LivenessClock {
    last_event: Mutex<Instant>,
}

impl LivenessClock {
    pub fn new() -> Self {
        Self {
            last_event: Mutex::new(Instant::now()),
        }
    }

    /// Resets the clock to "now". Called on every liveness request, every
    /// data frame, and every message the disk thread finishes processing.
    pub fn touch(&self) {
        let mut guard = self.last_event.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Instant::now();
    }

    /// Time elapsed since the last touch. May be stale by at most one poll
    /// interval if the disk thread just touched it; that is acceptable
    /// per the liveness clock's consistency requirements.
    pub fn elapsed(&self) -> Duration {
        let guard = self.last_event.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.elapsed()
    }
}

impl Default for LivenessClock {
    fn default() -> Self {
        Self::new()
    }
}
