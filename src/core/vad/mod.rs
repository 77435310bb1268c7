//! Voice Activity Detection
//!
//! Classifies short audio frames as speech or silence based on RMS energy.
//! Pure computation: analysis never fails, malformed (empty) frames yield
//! zero energy.

pub mod config;
pub mod detector;

pub use config::VadConfig;
pub use detector::{EnergyVad, VadResult};
