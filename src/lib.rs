//! callstream - real-time phone call session server
//!
//! Bridges telephony audio streams to streaming speech recognition and
//! conversational AI. Each phone call maps to one WebSocket connection and
//! one session holding the call's voice activity detector, recognition
//! stream, conversation context and AI chat session.

pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod notify;
pub mod providers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use crate::core::*;
pub use config::ServerConfig;
pub use errors::{SessionError, SessionResult};
pub use state::AppState;
