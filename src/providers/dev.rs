//! Offline development providers
//!
//! Deterministic stand-ins for the vendor bindings, used when the server
//! runs without credentials. The recognition stand-in simulates interim and
//! final transcripts from frame counts; the generation stand-in streams a
//! canned word-by-word reply.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::generation::{
    ChatSession, GenerationEvent, GenerationProvider, GenerationResult,
};
use crate::core::personality::Personality;
use crate::core::recognition::{
    RecognitionProvider, RecognitionResult, RecognitionStream, TranscriptResult,
};

/// Simulated transcription: interim results while an utterance accumulates,
/// a final result once enough frames arrived.
pub struct DevRecognitionProvider {
    utterance: String,
    frames_per_utterance: u32,
}

impl Default for DevRecognitionProvider {
    fn default() -> Self {
        Self {
            utterance: "hello can you hear me".to_string(),
            frames_per_utterance: 25,
        }
    }
}

impl DevRecognitionProvider {
    pub fn new(utterance: impl Into<String>, frames_per_utterance: u32) -> Self {
        Self {
            utterance: utterance.into(),
            frames_per_utterance: frames_per_utterance.max(1),
        }
    }
}

#[async_trait]
impl RecognitionProvider for DevRecognitionProvider {
    async fn open_stream(&self, _call_id: &str) -> RecognitionResult<Box<dyn RecognitionStream>> {
        Ok(Box::new(DevRecognitionStream {
            utterance: self.utterance.clone(),
            frames_per_utterance: self.frames_per_utterance,
            frames: 0,
        }))
    }
}

struct DevRecognitionStream {
    utterance: String,
    frames_per_utterance: u32,
    frames: u32,
}

#[async_trait]
impl RecognitionStream for DevRecognitionStream {
    async fn write_frame(
        &mut self,
        _samples: &[f32],
    ) -> RecognitionResult<Option<TranscriptResult>> {
        self.frames += 1;

        if self.frames >= self.frames_per_utterance {
            self.frames = 0;
            return Ok(Some(TranscriptResult {
                text: self.utterance.clone(),
                is_final: true,
                confidence: 0.95,
            }));
        }

        // Interim every fifth frame: a growing prefix of the utterance
        if self.frames % 5 == 0 {
            let words: Vec<&str> = self.utterance.split_whitespace().collect();
            if words.is_empty() {
                return Ok(None);
            }
            let progress = (self.frames as usize * words.len()) / self.frames_per_utterance as usize;
            let prefix = words[..progress.clamp(1, words.len())].join(" ");
            return Ok(Some(TranscriptResult {
                text: prefix,
                is_final: false,
                confidence: 0.6,
            }));
        }

        Ok(None)
    }

    async fn close(&mut self) {}
}

/// Streams a canned reply that echoes the caller's input.
#[derive(Default)]
pub struct DevGenerationProvider;

#[async_trait]
impl GenerationProvider for DevGenerationProvider {
    async fn start_chat(
        &self,
        personality: &Personality,
        _history: &[String],
    ) -> GenerationResult<Box<dyn ChatSession>> {
        Ok(Box::new(DevChat {
            personality_name: personality.name.clone(),
        }))
    }
}

struct DevChat {
    personality_name: String,
}

#[async_trait]
impl ChatSession for DevChat {
    async fn send_message(
        &mut self,
        input: &str,
    ) -> GenerationResult<mpsc::Receiver<GenerationEvent>> {
        let (tx, rx) = mpsc::channel(32);
        let reply = format!(
            "This is {} speaking. You said: {}. How can I help further?",
            self.personality_name, input
        );
        tokio::spawn(async move {
            for word in reply.split_inclusive(' ') {
                if tx
                    .send(GenerationEvent::Chunk(word.to_string()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn update_history(&mut self, _history: &[String]) {}

    async fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dev_recognition_finalizes_after_enough_frames() {
        let provider = DevRecognitionProvider::new("testing one two", 10);
        let mut stream = provider.open_stream("CA1").await.unwrap();

        let mut finals = 0;
        for _ in 0..10 {
            if let Some(result) = stream.write_frame(&[0.2; 16]).await.unwrap() {
                if result.is_final {
                    assert_eq!(result.text, "testing one two");
                    finals += 1;
                }
            }
        }
        assert_eq!(finals, 1);
    }

    #[tokio::test]
    async fn test_dev_generation_echoes_input() {
        let provider = DevGenerationProvider;
        let personality = crate::core::personality::PersonalityStore::builtin("professional")
            .get("professional")
            .clone();
        let mut chat = provider.start_chat(&personality, &[]).await.unwrap();

        let mut rx = chat.send_message("hi there").await.unwrap();
        let mut response = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Chunk(text) => response.push_str(&text),
                GenerationEvent::Error(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(response.contains("hi there"));
    }
}
