//! Call session lifecycle
//!
//! A `Session` is the aggregate root for one active phone call: it owns the
//! VAD instance, the conversation context, the lazily-created AI stream and
//! the transport handle. The `SessionStore` is the process-wide registry
//! with the concurrency ceiling and the idempotent destroy path.

pub mod context;
pub mod store;
pub mod transport;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use crate::core::generation::AiStream;
use crate::core::vad::{EnergyVad, VadConfig};

pub use context::ConversationContext;
pub use store::SessionStore;
pub use transport::{Transport, TransportMessage};

/// Lifecycle state of a session.
///
/// `Created → Active → {Closing | TimedOut | Errored} → Destroyed`; every
/// terminal transition funnels through the same idempotent destroy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Registered, no frames received yet
    Created,
    /// Receiving frames
    Active,
    /// Explicit disconnect in progress
    Closing,
    /// Destroyed by the inactivity sweep
    TimedOut,
    /// Destroyed after an unrecoverable transport failure
    Errored,
    /// Fully torn down
    Destroyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::TimedOut => write!(f, "timed_out"),
            SessionState::Errored => write!(f, "errored"),
            SessionState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Interior mutable state, serialized by the session's own mutex so frame
/// processing for one call is strictly sequential.
pub struct SessionInner {
    pub vad: EnergyVad,
    pub context: ConversationContext,
    /// Lazily created on the first completed utterance; dropped and
    /// recreated after a generation failure.
    pub ai_stream: Option<AiStream>,
}

/// All state and resources for one active call.
pub struct Session {
    call_id: String,
    inner: Mutex<SessionInner>,
    state: parking_lot::Mutex<SessionState>,
    last_speech_at: parking_lot::Mutex<Instant>,
    last_activity_at: parking_lot::Mutex<Instant>,
    destroyed: AtomicBool,
    transport: Transport,
}

impl Session {
    pub fn new(
        call_id: String,
        transport: Transport,
        vad_config: VadConfig,
        personality_id: String,
        max_history: usize,
    ) -> Self {
        let now = Instant::now();
        Self {
            call_id,
            inner: Mutex::new(SessionInner {
                vad: EnergyVad::new(vad_config),
                context: ConversationContext::new(personality_id, max_history),
                ai_stream: None,
            }),
            state: parking_lot::Mutex::new(SessionState::Created),
            last_speech_at: parking_lot::Mutex::new(now),
            last_activity_at: parking_lot::Mutex::new(now),
            destroyed: AtomicBool::new(false),
            transport,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Acquire the per-session state lock. Frame handlers hold this for the
    /// duration of the pipeline so turns never interleave.
    pub async fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().await
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    /// Record activity; called on every inbound frame and on liveness pongs.
    pub fn touch(&self) {
        *self.last_activity_at.lock() = Instant::now();
        let mut state = self.state.lock();
        if *state == SessionState::Created {
            *state = SessionState::Active;
        }
    }

    pub fn mark_speech(&self) {
        *self.last_speech_at.lock() = Instant::now();
    }

    pub fn silence_duration(&self) -> Duration {
        self.last_speech_at.lock().elapsed()
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_activity_at.lock().elapsed()
    }

    /// True once the destroy path has claimed this session. Handlers use
    /// this to discard results of operations that were in flight when the
    /// session was torn down.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Claim the session for destruction. Returns true exactly once.
    pub(crate) fn claim_destroy(&self) -> bool {
        !self.destroyed.swap(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("call_id", &self.call_id)
            .field("state", &self.state())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn session() -> Session {
        let (tx, _rx) = mpsc::channel(8);
        Session::new(
            "CA123".to_string(),
            Transport::new(tx),
            VadConfig::default(),
            "professional".to_string(),
            10,
        )
    }

    #[tokio::test]
    async fn test_touch_activates_created_session() {
        let session = session();
        assert_eq!(session.state(), SessionState::Created);
        session.touch();
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_and_idle_tracking() {
        let session = session();
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(session.silence_duration() >= Duration::from_millis(1500));

        session.mark_speech();
        session.touch();
        assert!(session.silence_duration() < Duration::from_millis(10));
        assert!(session.idle_duration() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_destroy_claimed_once() {
        let session = session();
        assert!(!session.is_destroyed());
        assert!(session.claim_destroy());
        assert!(!session.claim_destroy());
        assert!(session.is_destroyed());
    }
}
