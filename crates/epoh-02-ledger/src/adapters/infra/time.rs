use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::ports::outbound::TimeSource;

/// System wall clock plus a process-local monotonic clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn wall_micros(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }

    fn monotonic_micros(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: u64,
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock reading `wall_micros`.
    pub fn new(wall_micros: u64) -> Self {
        Self {
            start: wall_micros,
            now: Arc::new(AtomicU64::new(wall_micros)),
        }
    }

    /// Move forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute wall time; may go backwards.
    pub fn set(&self, wall_micros: u64) {
        self.now.store(wall_micros, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn wall_micros(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn monotonic_micros(&self) -> u64 {
        self.wall_micros().saturating_sub(self.start)
    }
}
