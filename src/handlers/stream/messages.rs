//! Wire types for the call audio WebSocket

use serde::{Deserialize, Serialize};

/// Addressing metadata attached to every inbound frame.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameMetadata {
    #[serde(rename = "callSid")]
    pub call_sid: String,

    /// Telephony stream identifier; carried for observability only.
    #[serde(default, rename = "streamSid")]
    pub stream_sid: Option<String>,

    /// Sender-side timestamp, opaque to the server.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One inbound chunk of raw audio samples. Ephemeral: consumed by the VAD
/// immediately and never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFrame {
    pub metadata: FrameMetadata,

    /// Raw audio samples, normalized to [-1.0, 1.0].
    pub payload: Vec<f32>,

    /// Marks the final chunk of the call's audio.
    #[serde(default, rename = "isFinal")]
    pub is_final: bool,
}

/// Outbound messages sent to the connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_deserialization() {
        let json = r#"{
            "metadata": {"callSid": "CA123", "streamSid": "MZ1", "timestamp": "12345"},
            "payload": [0.1, -0.2, 0.3],
            "isFinal": false
        }"#;
        let frame: AudioFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.metadata.call_sid, "CA123");
        assert_eq!(frame.payload.len(), 3);
        assert!(!frame.is_final);
    }

    #[test]
    fn test_frame_optional_fields_default() {
        let json = r#"{"metadata": {"callSid": "CA123"}, "payload": []}"#;
        let frame: AudioFrame = serde_json::from_str(json).unwrap();
        assert!(frame.metadata.stream_sid.is_none());
        assert!(!frame.is_final);
    }

    #[test]
    fn test_outgoing_error_shape() {
        let msg = OutgoingMessage::Error {
            message: "failed to process audio".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "failed to process audio");
    }
}
