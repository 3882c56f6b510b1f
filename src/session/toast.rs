//! Save-confirmation toast
//!
//! Visible for a fixed window after a completed stop. Re-triggering before
//! expiry replaces the pending dismissal timer (never stacks a second one);
//! dropping the notifier clears any pending timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// How long a toast stays visible
pub const TOAST_DURATION: Duration = Duration::from_millis(2000);

pub struct ToastNotifier {
    visible: Arc<AtomicBool>,
    dismiss_task: Mutex<Option<JoinHandle<()>>>,
    duration: Duration,
}

impl ToastNotifier {
    pub fn new() -> Self {
        Self::with_duration(TOAST_DURATION)
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(false)),
            dismiss_task: Mutex::new(None),
            duration,
        }
    }

    /// Show the toast and (re)arm its dismissal timer
    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);

        let mut task = self.dismiss_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = task.take() {
            pending.abort();
        }

        let visible = Arc::clone(&self.visible);
        let duration = self.duration;
        *task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            visible.store(false, Ordering::SeqCst);
        }));
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl Drop for ToastNotifier {
    fn drop(&mut self) {
        let mut task = self.dismiss_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = task.take() {
            pending.abort();
        }
    }
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::new()
    }
}
