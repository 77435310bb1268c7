//! Base traits and types for streaming generation providers.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::personality::Personality;

/// Errors from the generation provider layer.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider was unreachable or misconfigured at chat creation
    #[error("provider initialization failed: {0}")]
    Initialization(String),

    /// Generation failed after the chat was established
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// One event on a streamed model response.
///
/// The stream is finite and not restartable; an `Error` event terminates it.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// An incremental piece of generated text
    Chunk(String),
    /// The provider failed mid-stream
    Error(String),
}

/// A streaming generative-text vendor binding.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a chat session bound to one call's personality and rolling
    /// history. Fails with `Initialization` if the provider is unreachable
    /// or misconfigured; the caller propagates this rather than substituting
    /// a fallback.
    async fn start_chat(
        &self,
        personality: &Personality,
        history: &[String],
    ) -> GenerationResult<Box<dyn ChatSession>>;
}

/// One live chat session with the generation provider.
#[async_trait]
pub trait ChatSession: Send {
    /// Send a user utterance and receive a channel of incremental response
    /// events. The channel closes when the response is complete.
    async fn send_message(&mut self, input: &str)
    -> GenerationResult<mpsc::Receiver<GenerationEvent>>;

    /// Replace the rolling conversation context; the next turn must reflect
    /// the new history.
    async fn update_history(&mut self, history: &[String]);

    /// Release provider resources. Must be safe to call more than once.
    async fn close(&mut self);
}
