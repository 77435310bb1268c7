//! Streaming conversational AI
//!
//! The provider contract is abstract; any streaming generative-text vendor
//! can back it. Responses are streamed rather than awaited whole because a
//! voice call cannot tolerate multi-second silent gaps: each chunk is
//! forwarded downstream as soon as it arrives.

pub mod base;
pub mod stream;

pub use base::{ChatSession, GenerationError, GenerationEvent, GenerationProvider, GenerationResult};
pub use stream::{AiStream, APOLOGY_RESPONSE, EMPTY_RESPONSE_FALLBACK};
