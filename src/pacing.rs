use crate::cancel::CancelToken;
use log::debug;
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Bounded random delay between successive page fetches. Always randomized,
/// never fixed, so successive requests don't land on a predictable rhythm.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    min_ms: u64,
    max_ms: u64,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        assert!(min_ms <= max_ms, "pacing interval inverted");
        Pacing { min_ms, max_ms }
    }

    /// No delay at all. For tests.
    pub fn none() -> Self {
        Pacing { min_ms: 0, max_ms: 0 }
    }

    /// Sleep for a random duration inside the interval. The sleep is sliced
    /// so a cancellation arriving mid-wait is observed within ~50ms.
    pub fn wait(&self, cancel: &CancelToken) {
        let total = if self.min_ms == self.max_ms {
            self.min_ms
        } else {
            rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
        };
        if total == 0 {
            return;
        }
        debug!("Waiting {} ms (Page Delay)...", total);

        let mut remaining = total;
        while remaining > 0 && !cancel.is_cancelled() {
            let slice = remaining.min(50);
            thread::sleep(Duration::from_millis(slice));
            remaining -= slice;
        }
    }
}
