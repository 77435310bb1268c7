//! Session-side handle to the duplex connection
//!
//! The WebSocket handler owns the socket; the session holds this sender-side
//! handle so teardown can close the connection without reaching into the
//! handler task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

/// Messages routed to the connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMessage {
    /// A serialized JSON payload for the client
    Text(String),
    /// Liveness probe
    Ping,
    /// Close the connection normally
    Close,
    /// Close the connection with a specific status code and reason
    CloseWith { code: u16, reason: String },
}

/// Owned transport handle for one session's lifetime.
#[derive(Debug, Clone)]
pub struct Transport {
    tx: mpsc::Sender<TransportMessage>,
    closed: Arc<AtomicBool>,
}

impl Transport {
    pub fn new(tx: mpsc::Sender<TransportMessage>) -> Self {
        Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether `close` has already been issued.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a message to the client. Returns false if the connection's
    /// writer task is gone; the caller treats that as a closed transport,
    /// not an error.
    pub async fn send(&self, message: TransportMessage) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx.send(message).await.is_ok()
    }

    /// Close the connection. Idempotent; later calls are no-ops.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(TransportMessage::Close).await;
    }
}
