//! HTTP bridge for the web application layer
//!
//! The web layer calls `exec(action, args)`; this module carries those calls
//! as JSON:
//! - POST /exec - Submit `downloadAudioFile` or `exists`
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ExecRequest, ExecResponse};
pub use routes::create_router;
pub use state::AppState;
