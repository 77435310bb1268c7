//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `stream` - Call audio WebSocket and session orchestration

pub mod api;
pub mod stream;

pub use stream::stream_handler;
