//! Notification sink
//!
//! Fire-and-forget event emission keyed by call id, consumed by the
//! observing dashboard. Emission failures are logged and never abort call
//! processing. The pub/sub transport itself is out of scope; the default
//! sink logs events through tracing.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Milliseconds since the Unix epoch, for event timestamps.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Events emitted per call for dashboard observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum CallEvent {
    #[serde(rename = "speech.recognized")]
    SpeechRecognized {
        text: String,
        is_final: bool,
        confidence: f32,
        timestamp: u64,
    },
    #[serde(rename = "speech.error")]
    SpeechError { error: String, timestamp: u64 },
    #[serde(rename = "ai.response.partial")]
    AiResponsePartial {
        text: String,
        turn_count: u32,
        timestamp: u64,
    },
    #[serde(rename = "ai.response.complete")]
    AiResponseComplete { turn_count: u32, timestamp: u64 },
    #[serde(rename = "ai.response.error")]
    AiResponseError { error: String, timestamp: u64 },
}

impl CallEvent {
    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::SpeechRecognized { .. } => "speech.recognized",
            CallEvent::SpeechError { .. } => "speech.error",
            CallEvent::AiResponsePartial { .. } => "ai.response.partial",
            CallEvent::AiResponseComplete { .. } => "ai.response.complete",
            CallEvent::AiResponseError { .. } => "ai.response.error",
        }
    }
}

/// Destination for per-call events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Emit one event for the given call. Implementations should be quick;
    /// the controller treats failures as log-only.
    async fn emit(&self, call_id: &str, event: CallEvent) -> anyhow::Result<()>;
}

/// Default sink that logs events through tracing.
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn emit(&self, call_id: &str, event: CallEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        info!(call_id, event = event.name(), %payload, "call event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let event = CallEvent::SpeechRecognized {
            text: "hello".to_string(),
            is_final: true,
            confidence: 0.9,
            timestamp: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "speech.recognized");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["is_final"], true);

        let event = CallEvent::AiResponseComplete {
            turn_count: 3,
            timestamp: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ai.response.complete");
        assert_eq!(json["turn_count"], 3);
    }

    #[tokio::test]
    async fn test_tracing_sink_never_fails_on_events() {
        let sink = TracingSink;
        let result = sink
            .emit(
                "CA123",
                CallEvent::SpeechError {
                    error: "boom".to_string(),
                    timestamp: epoch_millis(),
                },
            )
            .await;
        assert!(result.is_ok());
    }
}
