//! Process-wide session registry
//!
//! The registry mutex is the only cross-session lock; it guards map
//! mutation so the capacity check is atomic with insertion. Per-session
//! state is owned by each session's own mutex.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::StreamConfig;
use crate::core::recognition::RecognitionGateway;
use crate::core::vad::VadConfig;
use crate::errors::{SessionError, SessionResult};

use super::{Session, SessionState, Transport};

/// Owns every live session and the concurrency ceiling.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    recognition: Arc<RecognitionGateway>,
    config: StreamConfig,
    vad_config: VadConfig,
}

impl SessionStore {
    pub fn new(
        recognition: Arc<RecognitionGateway>,
        config: StreamConfig,
        vad_config: VadConfig,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            recognition,
            config,
            vad_config,
        }
    }

    /// Register a session for a new connection.
    ///
    /// Rejects with `CapacityExceeded` at the configured ceiling. A second
    /// connection for an already-live call id replaces the old session: the
    /// old one is removed atomically with the new insertion and then torn
    /// down, which keeps duplicate webhook deliveries from wedging a call.
    pub async fn create_session(
        &self,
        call_id: &str,
        transport: Transport,
    ) -> SessionResult<Arc<Session>> {
        let (session, replaced) = {
            let mut sessions = self.sessions.lock();
            let replaced = sessions.remove(call_id);
            if replaced.is_none() && sessions.len() >= self.config.max_concurrent_calls {
                return Err(SessionError::CapacityExceeded);
            }
            let session = Arc::new(Session::new(
                call_id.to_string(),
                transport,
                self.vad_config.clone(),
                self.config.default_personality.clone(),
                self.config.max_history_length,
            ));
            sessions.insert(call_id.to_string(), session.clone());
            (session, replaced)
        };

        if let Some(old) = replaced {
            warn!(call_id, "replacing existing session for call");
            self.teardown(old, SessionState::Closing).await;
        }

        info!(call_id, live_sessions = self.len(), "session created");
        Ok(session)
    }

    pub fn get(&self, call_id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(call_id).cloned()
    }

    /// Refresh the session's activity timestamp.
    pub fn touch(&self, call_id: &str) {
        if let Some(session) = self.get(call_id) {
            session.touch();
        }
    }

    /// Whether the session has exceeded the inactivity timeout. Missing
    /// sessions are reported inactive.
    pub fn is_inactive(&self, call_id: &str) -> bool {
        match self.get(call_id) {
            Some(session) => session.idle_duration() > self.config.inactivity_timeout(),
            None => true,
        }
    }

    /// Tear down a session and release its resources. Idempotent: repeat
    /// calls, and destroy-then-sweep races, are no-ops after the first.
    pub async fn destroy_session(&self, call_id: &str, reason: SessionState) {
        let session = self.sessions.lock().remove(call_id);
        if let Some(session) = session {
            self.teardown(session, reason).await;
        }
    }

    /// Tear down one specific session handle.
    ///
    /// The registry entry is removed only if it still refers to this exact
    /// session. A handle that was already replaced by a newer connection for
    /// the same call id tears down alone and leaves the replacement live.
    pub async fn destroy_session_handle(&self, session: &Arc<Session>, reason: SessionState) {
        {
            let mut sessions = self.sessions.lock();
            if sessions
                .get(session.call_id())
                .is_some_and(|current| Arc::ptr_eq(current, session))
            {
                sessions.remove(session.call_id());
            }
        }
        self.teardown(Arc::clone(session), reason).await;
    }

    /// Release order: AI stream, then transport, then the recognition
    /// gateway's per-call stream.
    async fn teardown(&self, session: Arc<Session>, reason: SessionState) {
        if !session.claim_destroy() {
            return;
        }
        session.set_state(reason);

        {
            let mut inner = session.lock_inner().await;
            if let Some(mut ai_stream) = inner.ai_stream.take() {
                ai_stream.close().await;
            }
        }
        session.transport().close().await;
        self.recognition.close_stream(session.call_id()).await;

        session.set_state(SessionState::Destroyed);
        info!(
            call_id = session.call_id(),
            reason = %reason,
            live_sessions = self.len(),
            "session destroyed"
        );
    }

    /// Call ids of every live session, for sweep iteration.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Tear down every live session (server shutdown).
    pub async fn destroy_all(&self) {
        for call_id in self.session_ids() {
            self.destroy_session(&call_id, SessionState::Closing).await;
        }
    }
}
