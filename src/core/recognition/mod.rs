//! Streaming speech recognition
//!
//! The provider contract is abstract; any streaming speech-to-text vendor can
//! back it. The gateway owns one recognition stream per call and recreates
//! failed streams transparently with a bounded retry budget.

pub mod base;
pub mod gateway;

pub use base::{
    RecognitionError, RecognitionProvider, RecognitionResult, RecognitionStream, TranscriptResult,
};
pub use gateway::{RecognitionConfig, RecognitionGateway};
