//! Recording session management
//!
//! This module provides the session controller that manages:
//! - The Idle/Recording/Paused state machine, driven by transport events
//! - The elapsed-time ticker and save-confirmation toast
//! - The photo accumulator for the active session
//! - Hand-off of the finished artifact to the ingestion pipeline

mod controller;
mod state;
mod ticker;
mod toast;

pub use controller::{SessionController, SessionError, SessionStatus};
pub use state::SessionState;
pub use ticker::{format_mmss, ElapsedTicker};
pub use toast::{ToastNotifier, TOAST_DURATION};
