//! Per-call AI stream adapter
//!
//! Wraps one chat session and enforces the caller-always-hears-something
//! contract: an empty provider response is replaced by a single fallback
//! chunk, and a mid-stream failure emits a spoken apology before the error
//! is reported to the controller.

use std::future::Future;

use tracing::warn;

use crate::core::personality::Personality;
use crate::errors::{SessionError, SessionResult};

use super::base::{ChatSession, GenerationEvent, GenerationProvider};

/// Spoken when the provider completes without producing any text.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "I'm sorry, I didn't catch that. Could you say it again?";

/// Spoken when generation fails mid-stream.
pub const APOLOGY_RESPONSE: &str =
    "I apologize, but I encountered an issue. Could you please repeat that?";

/// Streaming AI response handle owned by one session.
///
/// Lazily created on the first completed utterance and recreated by the
/// controller after a generation failure.
pub struct AiStream {
    chat: Option<Box<dyn ChatSession>>,
}

impl AiStream {
    /// Start a chat session seeded with the call's personality and current
    /// history. Initialization failures propagate; the turn is dropped but
    /// the call continues.
    pub async fn create(
        provider: &dyn GenerationProvider,
        personality: &Personality,
        history: &[String],
    ) -> SessionResult<Self> {
        let chat = provider
            .start_chat(personality, history)
            .await
            .map_err(|e| SessionError::Initialization(e.to_string()))?;
        Ok(Self { chat: Some(chat) })
    }

    /// Stream one response, invoking `on_chunk` for each incremental piece
    /// of text as it arrives. Returns the accumulated response text.
    ///
    /// The callback is always invoked at least once: with real chunks, with
    /// a single fallback chunk when the provider returns nothing, or with an
    /// apology when generation fails mid-stream. In the failure case the
    /// error is also returned so the controller can reinitialize the stream
    /// for the next turn.
    pub async fn stream_response<F, Fut>(
        &mut self,
        input: &str,
        mut on_chunk: F,
    ) -> SessionResult<String>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let Some(chat) = self.chat.as_mut() else {
            return Err(SessionError::Generation("AI stream is closed".to_string()));
        };

        let mut rx = match chat.send_message(input).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "failed to start response generation");
                on_chunk(APOLOGY_RESPONSE.to_string()).await;
                return Err(SessionError::Generation(e.to_string()));
            }
        };

        let mut response = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Chunk(text) => {
                    response.push_str(&text);
                    on_chunk(text).await;
                }
                GenerationEvent::Error(message) => {
                    warn!(error = %message, "generation failed mid-stream");
                    on_chunk(APOLOGY_RESPONSE.to_string()).await;
                    return Err(SessionError::Generation(message));
                }
            }
        }

        if response.is_empty() {
            on_chunk(EMPTY_RESPONSE_FALLBACK.to_string()).await;
            response.push_str(EMPTY_RESPONSE_FALLBACK);
        }

        Ok(response)
    }

    /// Replace the rolling context so the next turn reflects it.
    pub async fn update_context(&mut self, history: &[String]) {
        if let Some(chat) = self.chat.as_mut() {
            chat.update_history(history).await;
        }
    }

    /// Release provider resources. Idempotent.
    pub async fn close(&mut self) {
        if let Some(mut chat) = self.chat.take() {
            chat.close().await;
        }
    }
}
