use std::sync::Arc;

use crate::session::SessionController;
use crate::store::MemoStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single recording session controller
    pub controller: Arc<SessionController>,
    /// Finalized memo records
    pub store: Arc<MemoStore>,
}

impl AppState {
    pub fn new(controller: Arc<SessionController>, store: Arc<MemoStore>) -> Self {
        Self { controller, store }
    }
}
