//! Error taxonomy for call session handling.
//!
//! Provider-layer transient failures are retried at their own layer; only
//! retry exhaustion surfaces upward, and then only as a notification event.
//! The sole errors that terminate a call are transport-level ones and the
//! inactivity sweep.

use thiserror::Error;

/// Errors that can occur while managing a call session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session creation rejected because the live-session ceiling was reached
    #[error("maximum concurrent calls reached")]
    CapacityExceeded,

    /// The connection request was missing or carried a malformed call id
    #[error("invalid connection request: {0}")]
    Validation(String),

    /// Speech recognition failed after exhausting internal retries
    #[error("speech recognition failed: {0}")]
    RecognitionTransient(String),

    /// AI response generation failed mid-stream
    #[error("response generation failed: {0}")]
    Generation(String),

    /// AI stream creation failed (provider unreachable or misconfigured)
    #[error("AI stream initialization failed: {0}")]
    Initialization(String),

    /// Transport-level error on the duplex connection
    #[error("transport error: {0}")]
    Transport(String),

    /// The duplex connection was closed
    #[error("transport closed")]
    TransportClosed,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
