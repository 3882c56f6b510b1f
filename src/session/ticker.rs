//! Elapsed-time ticker
//!
//! Counts whole seconds while recording. Frozen (value retained) across a
//! pause, reset to zero only when a new session starts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct ElapsedTicker {
    seconds: Arc<AtomicU64>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl ElapsedTicker {
    pub fn new() -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(0)),
            tick_task: Mutex::new(None),
        }
    }

    /// Reset to zero and begin ticking (new session)
    pub fn start_from_zero(&self) {
        self.freeze();
        self.seconds.store(0, Ordering::SeqCst);
        self.spawn_tick();
    }

    /// Continue ticking from the current value (resume)
    pub fn resume(&self) {
        let mut task = self.tick_task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return;
        }
        *task = Some(self.tick_handle());
    }

    /// Stop ticking without resetting (pause or stop)
    pub fn freeze(&self) {
        let mut task = self.tick_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    /// `mm:ss` rendering of the current value
    pub fn display(&self) -> String {
        format_mmss(self.elapsed_secs())
    }

    fn spawn_tick(&self) {
        let mut task = self.tick_task.lock().unwrap_or_else(|e| e.into_inner());
        *task = Some(self.tick_handle());
    }

    fn tick_handle(&self) -> JoinHandle<()> {
        let seconds = Arc::clone(&self.seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                seconds.fetch_add(1, Ordering::SeqCst);
            }
        })
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.freeze();
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Format whole seconds as `mm:ss`
pub fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, Duration};

    #[test]
    fn formats_mm_ss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(5), "00:05");
        assert_eq!(format_mmss(65), "01:05");
        assert_eq!(format_mmss(600), "10:00");
    }

    #[tokio::test(start_paused = true)]
    async fn counts_seconds_while_running() {
        let ticker = ElapsedTicker::new();
        ticker.start_from_zero();
        assert_eq!(ticker.elapsed_secs(), 0);

        advance(Duration::from_secs(3)).await;
        assert_eq!(ticker.elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn freeze_retains_value_and_resume_continues() {
        let ticker = ElapsedTicker::new();
        ticker.start_from_zero();
        advance(Duration::from_secs(3)).await;

        ticker.freeze();
        advance(Duration::from_secs(10)).await;
        assert_eq!(ticker.elapsed_secs(), 3);

        ticker.resume();
        advance(Duration::from_secs(2)).await;
        assert_eq!(ticker.elapsed_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_to_zero() {
        let ticker = ElapsedTicker::new();
        ticker.start_from_zero();
        advance(Duration::from_secs(42)).await;

        ticker.start_from_zero();
        assert_eq!(ticker.elapsed_secs(), 0);
        advance(Duration::from_secs(1)).await;
        assert_eq!(ticker.elapsed_secs(), 1);
    }
}
