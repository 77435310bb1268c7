pub mod generation;
pub mod personality;
pub mod recognition;
pub mod retry;
pub mod session;
pub mod vad;

// Re-export commonly used types for convenience
pub use generation::{AiStream, ChatSession, GenerationError, GenerationEvent, GenerationProvider};
pub use personality::{Personality, PersonalityStore};
pub use recognition::{
    RecognitionConfig, RecognitionGateway, RecognitionProvider, RecognitionStream, TranscriptResult,
};
pub use retry::RetryPolicy;
pub use session::{
    ConversationContext, Session, SessionState, SessionStore, Transport, TransportMessage,
};
pub use vad::{EnergyVad, VadConfig, VadResult};
