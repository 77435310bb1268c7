//! Provider bindings
//!
//! Vendor bindings implement the `RecognitionProvider` and
//! `GenerationProvider` traits from `core`. The crate ships with offline
//! stand-ins so the server runs end to end without vendor credentials;
//! real bindings slot in through the same traits.

pub mod dev;

pub use dev::{DevGenerationProvider, DevRecognitionProvider};
