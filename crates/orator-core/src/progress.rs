use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// The estimate never claims completion; only the real response does.
pub const PROGRESS_CAP: u8 = 95;

/// Cosmetic loading-progress estimate for the upload wait.
///
/// The analysis call reports no real progress, so frontends show a steady
/// fixed-rate climb instead: +1 per tick, capped at [`PROGRESS_CAP`]. The
/// backing task is scoped to this handle; `stop` or drop aborts it, so no
/// terminal transition (finished, error, teardown) can leak the timer.
pub struct ProgressTicker {
    value: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn start(period: Duration) -> Self {
        let value = Arc::new(AtomicU8::new(0));
        let shared = Arc::clone(&value);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so value(0) holds
            // for a full period.
            interval.tick().await;
            loop {
                interval.tick().await;
                let current = shared.load(Ordering::Relaxed);
                if current < PROGRESS_CAP {
                    shared.store(current + 1, Ordering::Relaxed);
                }
            }
        });

        Self { value, task }
    }

    /// Current estimate in percent, 0 to [`PROGRESS_CAP`].
    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
