//! Mock providers and fixtures for integration tests
//!
//! The recognition mock replays a shared script of per-write outcomes, so a
//! stream recreated by the gateway mid-call continues where the failed one
//! left off. The generation mock replays one event list per turn.

// Allow dead code in test infrastructure - not every test uses every helper
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use callstream::config::StreamConfig;
use callstream::core::generation::{
    ChatSession, GenerationError, GenerationEvent, GenerationProvider, GenerationResult,
};
use callstream::core::personality::{Personality, PersonalityStore};
use callstream::core::recognition::{
    RecognitionConfig, RecognitionError, RecognitionGateway, RecognitionProvider,
    RecognitionResult, RecognitionStream, TranscriptResult,
};
use callstream::core::session::{SessionStore, Transport, TransportMessage};
use callstream::core::vad::VadConfig;
use callstream::handlers::stream::{AudioFrame, FrameMetadata, StreamSessionController};
use callstream::notify::{CallEvent, NotificationSink};

/// One scripted outcome for a recognition stream write.
#[derive(Debug, Clone)]
pub enum ScriptedWrite {
    /// No transcript for this frame
    Silent,
    /// An interim transcript
    Interim(&'static str),
    /// A final transcript with the given confidence
    Final(&'static str, f32),
    /// The write fails
    Fail,
}

/// Recognition provider replaying a shared script across stream recreations.
pub struct MockRecognitionProvider {
    script: Arc<Mutex<VecDeque<ScriptedWrite>>>,
    pub opens: AtomicU32,
    pub closes: Arc<AtomicU32>,
    fail_opens: AtomicU32,
}

impl MockRecognitionProvider {
    pub fn new(script: Vec<ScriptedWrite>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            opens: AtomicU32::new(0),
            closes: Arc::new(AtomicU32::new(0)),
            fail_opens: AtomicU32::new(0),
        }
    }

    /// Make the next `n` `open_stream` calls fail.
    pub fn fail_next_opens(&self, n: u32) {
        self.fail_opens.store(n, Ordering::SeqCst);
    }

    pub fn push_script(&self, writes: Vec<ScriptedWrite>) {
        self.script.lock().extend(writes);
    }
}

#[async_trait]
impl RecognitionProvider for MockRecognitionProvider {
    async fn open_stream(&self, _call_id: &str) -> RecognitionResult<Box<dyn RecognitionStream>> {
        if self.fail_opens.load(Ordering::SeqCst) > 0 {
            self.fail_opens.fetch_sub(1, Ordering::SeqCst);
            return Err(RecognitionError::StreamCreation(
                "mock open failure".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRecognitionStream {
            script: self.script.clone(),
            closes: self.closes.clone(),
        }))
    }
}

struct MockRecognitionStream {
    script: Arc<Mutex<VecDeque<ScriptedWrite>>>,
    closes: Arc<AtomicU32>,
}

#[async_trait]
impl RecognitionStream for MockRecognitionStream {
    async fn write_frame(
        &mut self,
        _samples: &[f32],
    ) -> RecognitionResult<Option<TranscriptResult>> {
        let next = self.script.lock().pop_front();
        match next {
            None | Some(ScriptedWrite::Silent) => Ok(None),
            Some(ScriptedWrite::Interim(text)) => Ok(Some(TranscriptResult {
                text: text.to_string(),
                is_final: false,
                confidence: 0.6,
            })),
            Some(ScriptedWrite::Final(text, confidence)) => Ok(Some(TranscriptResult {
                text: text.to_string(),
                is_final: true,
                confidence,
            })),
            Some(ScriptedWrite::Fail) => {
                Err(RecognitionError::StreamWrite("mock write failure".to_string()))
            }
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Generation provider replaying one scripted event list per turn.
pub struct MockGenerationProvider {
    turns: Arc<Mutex<VecDeque<Vec<GenerationEvent>>>>,
    pub starts: Arc<AtomicU32>,
    pub chat_closes: Arc<AtomicU32>,
    fail_starts: AtomicU32,
}

impl MockGenerationProvider {
    pub fn new(turns: Vec<Vec<GenerationEvent>>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(turns.into())),
            starts: Arc::new(AtomicU32::new(0)),
            chat_closes: Arc::new(AtomicU32::new(0)),
            fail_starts: AtomicU32::new(0),
        }
    }

    /// Make the next `n` `start_chat` calls fail.
    pub fn fail_next_starts(&self, n: u32) {
        self.fail_starts.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn start_chat(
        &self,
        _personality: &Personality,
        _history: &[String],
    ) -> GenerationResult<Box<dyn ChatSession>> {
        if self.fail_starts.load(Ordering::SeqCst) > 0 {
            self.fail_starts.fetch_sub(1, Ordering::SeqCst);
            return Err(GenerationError::Initialization(
                "mock start failure".to_string(),
            ));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockChat {
            turns: self.turns.clone(),
            closes: self.chat_closes.clone(),
        }))
    }
}

struct MockChat {
    turns: Arc<Mutex<VecDeque<Vec<GenerationEvent>>>>,
    closes: Arc<AtomicU32>,
}

#[async_trait]
impl ChatSession for MockChat {
    async fn send_message(
        &mut self,
        _input: &str,
    ) -> GenerationResult<mpsc::Receiver<GenerationEvent>> {
        let events = self.turns.lock().pop_front().unwrap_or_default();
        let (tx, rx) = mpsc::channel(64);
        for event in events {
            tx.try_send(event).expect("mock channel capacity");
        }
        Ok(rx)
    }

    async fn update_history(&mut self, _history: &[String]) {}

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink that records every emitted event for assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<(String, CallEvent)>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<(String, CallEvent)> {
        self.events.lock().clone()
    }

    /// Event names for one call, in emission order.
    pub fn names_for(&self, call_id: &str) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|(id, _)| id == call_id)
            .map(|(_, event)| event.name())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for CollectingSink {
    async fn emit(&self, call_id: &str, event: CallEvent) -> anyhow::Result<()> {
        self.events.lock().push((call_id.to_string(), event));
        Ok(())
    }
}

/// The full session stack wired around mocks.
pub struct TestStack {
    pub controller: Arc<StreamSessionController>,
    pub store: Arc<SessionStore>,
    pub sink: Arc<CollectingSink>,
}

pub fn build_stack(
    stream_config: StreamConfig,
    recognition_provider: Arc<dyn RecognitionProvider>,
    generation_provider: Arc<dyn GenerationProvider>,
) -> TestStack {
    let sink = Arc::new(CollectingSink::default());
    let recognition = Arc::new(RecognitionGateway::new(
        recognition_provider,
        RecognitionConfig::default(),
    ));
    let store = Arc::new(SessionStore::new(
        recognition.clone(),
        stream_config.clone(),
        VadConfig::default(),
    ));
    let personalities = Arc::new(PersonalityStore::builtin(
        &stream_config.default_personality,
    ));
    let controller = Arc::new(StreamSessionController::new(
        store.clone(),
        recognition,
        generation_provider,
        personalities,
        sink.clone(),
        stream_config,
    ));
    TestStack {
        controller,
        store,
        sink,
    }
}

/// A connected transport plus the receiving end of its writer channel.
pub fn transport_pair() -> (Transport, mpsc::Receiver<TransportMessage>) {
    let (tx, rx) = mpsc::channel(64);
    (Transport::new(tx), rx)
}

pub fn speech_frame(call_id: &str) -> AudioFrame {
    frame(call_id, vec![0.5; 160], false)
}

pub fn silence_frame(call_id: &str) -> AudioFrame {
    frame(call_id, vec![0.0; 160], false)
}

pub fn frame(call_id: &str, payload: Vec<f32>, is_final: bool) -> AudioFrame {
    AudioFrame {
        metadata: FrameMetadata {
            call_sid: call_id.to_string(),
            stream_sid: None,
            timestamp: None,
        },
        payload,
        is_final,
    }
}
