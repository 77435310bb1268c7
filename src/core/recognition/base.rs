//! Base traits and types for streaming speech recognition providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the recognition provider layer.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Opening a new per-call stream failed
    #[error("stream creation failed: {0}")]
    StreamCreation(String),

    /// Writing audio to an open stream failed
    #[error("stream write failed: {0}")]
    StreamWrite(String),

    /// The stream was closed by the provider
    #[error("stream closed")]
    StreamClosed,
}

/// Result type for recognition operations.
pub type RecognitionResult<T> = Result<T, RecognitionError>;

/// A transcription result surfaced by the provider.
///
/// Interim results (`is_final == false`) may still change; final results are
/// settled and trigger downstream AI invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// The transcribed text
    pub text: String,
    /// Whether the provider considers this result settled
    pub is_final: bool,
    /// Provider confidence in [0.0, 1.0]
    pub confidence: f32,
}

/// A streaming speech-to-text vendor binding.
///
/// Implementations wrap one vendor connection factory; the gateway calls
/// `open_stream` once per call (and again when recreating a failed stream).
#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    /// Open a new streaming recognition session for the given call.
    async fn open_stream(&self, call_id: &str) -> RecognitionResult<Box<dyn RecognitionStream>>;
}

/// One live per-call recognition stream.
#[async_trait]
pub trait RecognitionStream: Send {
    /// Write one frame of audio samples. Returns a transcript if the
    /// provider surfaced one for this write, `None` otherwise.
    async fn write_frame(&mut self, samples: &[f32])
    -> RecognitionResult<Option<TranscriptResult>>;

    /// Close the stream. Must be safe to call more than once.
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecognitionError::StreamCreation("dns failure".to_string());
        assert!(err.to_string().contains("dns failure"));
        assert_eq!(RecognitionError::StreamClosed.to_string(), "stream closed");
    }

    #[test]
    fn test_transcript_result_serde() {
        let result = TranscriptResult {
            text: "hello".to_string(),
            is_final: true,
            confidence: 0.9,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: TranscriptResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
