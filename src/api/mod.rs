//! HTTP API: the presentation boundary over the chat core.
//!
//! Handlers stay thin; they translate requests into core calls against the
//! session context and stream/serialize the results.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
