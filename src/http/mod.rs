//! HTTP control surface
//!
//! REST API that carries UI intent into the session controller:
//! - POST /record/start|pause|resume|stop|retry|camera
//! - GET /record/status - session state, elapsed time, toast
//! - GET /memos/:id - review a finalized memo
//! - GET /health - health check
//!
//! The stop route blocks until ingestion completes and answers with the
//! review destination for the new memo.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
