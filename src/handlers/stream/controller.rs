//! Stream session orchestration
//!
//! The controller owns the connection-accept entrypoint, the per-frame
//! processing pipeline and the periodic inactivity sweep. Frame processing
//! for one call runs under that session's state lock, so VAD, recognition
//! and finalize-turn never interleave within a call; sessions for different
//! calls proceed fully in parallel.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::StreamConfig;
use crate::core::generation::{AiStream, GenerationProvider};
use crate::core::personality::PersonalityStore;
use crate::core::recognition::RecognitionGateway;
use crate::core::retry::RetryPolicy;
use crate::core::session::{Session, SessionInner, SessionState, SessionStore, Transport};
use crate::errors::{SessionError, SessionResult};
use crate::notify::{CallEvent, NotificationSink, epoch_millis};

use super::messages::AudioFrame;

/// Orchestrates all live call sessions.
pub struct StreamSessionController {
    store: Arc<SessionStore>,
    recognition: Arc<RecognitionGateway>,
    generation: Arc<dyn GenerationProvider>,
    personalities: Arc<PersonalityStore>,
    sink: Arc<dyn NotificationSink>,
    config: StreamConfig,
    ai_retry: RetryPolicy,
}

impl StreamSessionController {
    pub fn new(
        store: Arc<SessionStore>,
        recognition: Arc<RecognitionGateway>,
        generation: Arc<dyn GenerationProvider>,
        personalities: Arc<PersonalityStore>,
        sink: Arc<dyn NotificationSink>,
        config: StreamConfig,
    ) -> Self {
        Self {
            store,
            recognition,
            generation,
            personalities,
            sink,
            config,
            ai_retry: RetryPolicy::default(),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Accept a new connection for a call. Validates the call id and
    /// registers the session; capacity rejection and validation failures
    /// surface to the handler, which closes the connection with a distinct
    /// status.
    pub async fn register(
        &self,
        call_id: &str,
        transport: Transport,
    ) -> SessionResult<Arc<Session>> {
        validate_call_id(call_id)?;
        self.store.create_session(call_id, transport).await
    }

    /// Run one inbound frame through the VAD → recognition → finalize
    /// pipeline. Frames for unknown (already destroyed) sessions are
    /// silently dropped.
    pub async fn process_frame(&self, frame: &AudioFrame) -> SessionResult<()> {
        let call_id = frame.metadata.call_sid.as_str();
        let Some(session) = self.store.get(call_id) else {
            debug!(call_id, "dropping frame for unknown session");
            return Ok(());
        };
        session.touch();

        let mut inner = session.lock_inner().await;
        if session.is_destroyed() {
            return Ok(());
        }

        let vad_result = inner.vad.analyze(&frame.payload);

        if vad_result.is_speech {
            session.mark_speech();

            match self.recognition.process_chunk(call_id, &frame.payload).await {
                Ok(Some(result)) => {
                    self.notify(
                        call_id,
                        CallEvent::SpeechRecognized {
                            text: result.text.clone(),
                            is_final: result.is_final,
                            confidence: result.confidence,
                            timestamp: epoch_millis(),
                        },
                    )
                    .await;

                    if result.is_final {
                        // Primary finalize path: the provider settled the
                        // utterance explicitly.
                        inner.context.current_speech.clear();
                        self.finalize_turn(&session, &mut inner, &result.text).await;
                    } else {
                        inner.context.current_speech = result.text;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    // The call continues, degraded; only transport failures
                    // and the sweep tear sessions down.
                    warn!(call_id, error = %e, "speech recognition failed");
                    self.notify(
                        call_id,
                        CallEvent::SpeechError {
                            error: e.to_string(),
                            timestamp: epoch_millis(),
                        },
                    )
                    .await;
                }
            }
        } else if !inner.context.current_speech.is_empty()
            && session.silence_duration() > self.config.silence_finalize()
        {
            // Fallback finalize path: the provider never flagged a final
            // result but the caller has stopped talking.
            let text = std::mem::take(&mut inner.context.current_speech);
            self.finalize_turn(&session, &mut inner, &text).await;
        }

        if frame.is_final && !inner.context.current_speech.is_empty() {
            // Last chunk of the call's audio; settle whatever is buffered.
            let text = std::mem::take(&mut inner.context.current_speech);
            self.finalize_turn(&session, &mut inner, &text).await;
        }

        Ok(())
    }

    /// Complete one user turn: update history, drive a streamed AI response
    /// and emit the per-chunk / completion events.
    async fn finalize_turn(&self, session: &Arc<Session>, inner: &mut SessionInner, text: &str) {
        let call_id = session.call_id();
        inner.context.push_history(format!("User: {text}"));
        let history = inner.context.history();

        if inner.ai_stream.is_none() {
            let personality = self.personalities.get(&inner.context.personality_id);
            let created = self
                .ai_retry
                .run(|| AiStream::create(self.generation.as_ref(), personality, &history))
                .await;
            match created {
                Ok(stream) => inner.ai_stream = Some(stream),
                Err(e) => {
                    // Turn dropped; the call itself continues.
                    warn!(call_id, error = %e, "AI stream initialization failed");
                    self.notify(
                        call_id,
                        CallEvent::AiResponseError {
                            error: e.to_string(),
                            timestamp: epoch_millis(),
                        },
                    )
                    .await;
                    return;
                }
            }
        } else if let Some(ai_stream) = inner.ai_stream.as_mut() {
            ai_stream.update_context(&history).await;
        }

        let turn = inner.context.turn_count;
        let Some(ai_stream) = inner.ai_stream.as_mut() else {
            return;
        };

        let result = ai_stream
            .stream_response(text, |chunk| {
                let sink = Arc::clone(&self.sink);
                let session = Arc::clone(session);
                async move {
                    // A session destroyed mid-generation discards the rest
                    // of its response.
                    if session.is_destroyed() {
                        return;
                    }
                    let event = CallEvent::AiResponsePartial {
                        text: chunk,
                        turn_count: turn,
                        timestamp: epoch_millis(),
                    };
                    if let Err(e) = sink.emit(session.call_id(), event).await {
                        warn!(call_id = session.call_id(), error = %e, "notification emit failed");
                    }
                }
            })
            .await;

        match result {
            Ok(response) => {
                inner.context.last_response = response;
                inner.context.turn_count += 1;
                if !session.is_destroyed() {
                    self.notify(
                        call_id,
                        CallEvent::AiResponseComplete {
                            turn_count: inner.context.turn_count,
                            timestamp: epoch_millis(),
                        },
                    )
                    .await;
                }
            }
            Err(e) => {
                self.notify(
                    call_id,
                    CallEvent::AiResponseError {
                        error: e.to_string(),
                        timestamp: epoch_millis(),
                    },
                )
                .await;
                // Drop the handle so the next turn reinitializes it instead
                // of reusing a possibly corrupt chat session.
                if let Some(mut ai_stream) = inner.ai_stream.take() {
                    ai_stream.close().await;
                }
            }
        }
    }

    /// Tear down one connection's session on disconnect or transport error.
    ///
    /// Keyed by session identity, not call id: when a duplicate connection
    /// has already replaced this session, the old connection's disconnect
    /// must not take the replacement down with it.
    pub async fn handle_disconnect(&self, session: &Arc<Session>, reason: SessionState) {
        self.store.destroy_session_handle(session, reason).await;
    }

    /// One pass of the inactivity sweep: destroy sessions idle beyond the
    /// timeout and close orphaned recognition streams. Guards against
    /// transports that fail without ever delivering a close event.
    pub async fn sweep_once(&self) {
        for call_id in self.store.session_ids() {
            if self.store.is_inactive(&call_id) {
                info!(call_id = %call_id, "destroying inactive session");
                self.store
                    .destroy_session(&call_id, SessionState::TimedOut)
                    .await;
            }
        }
        self.recognition.close_idle_streams().await;
    }

    /// Spawn the periodic sweep task for the controller's lifetime.
    pub fn spawn_sweep(self: Arc<Self>) -> JoinHandle<()> {
        let controller = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(controller.config.sweep_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately; skip the startup tick
            ticker.tick().await;
            loop {
                ticker.tick().await;
                controller.sweep_once().await;
            }
        })
    }

    /// Fire-and-forget event emission; failures never abort call handling.
    async fn notify(&self, call_id: &str, event: CallEvent) {
        if let Err(e) = self.sink.emit(call_id, event).await {
            warn!(call_id, error = %e, "notification emit failed");
        }
    }
}

fn validate_call_id(call_id: &str) -> SessionResult<()> {
    if call_id.is_empty() {
        return Err(SessionError::Validation("missing call id".to_string()));
    }
    if call_id.len() > 64
        || !call_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SessionError::Validation(format!(
            "malformed call id: {call_id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_validation() {
        assert!(validate_call_id("CA123").is_ok());
        assert!(validate_call_id("CA-123_abc").is_ok());
        assert!(validate_call_id("").is_err());
        assert!(validate_call_id("CA 123").is_err());
        assert!(validate_call_id(&"x".repeat(65)).is_err());
    }
}
