//! VAD configuration

use serde::{Deserialize, Serialize};

/// Configuration for the energy-based voice activity detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// RMS energy above this value is classified as speech.
    /// Default: 0.1
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,

    /// Maximum number of recent frames kept in the rolling buffer.
    /// Oldest frames are dropped on overflow.
    /// Default: 50
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_silence_threshold() -> f32 {
    0.1
}

fn default_max_buffer_size() -> usize {
    50
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            silence_threshold: default_silence_threshold(),
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

impl VadConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.silence_threshold) {
            return Err(format!(
                "silence_threshold must be within [0.0, 1.0], got {}",
                self.silence_threshold
            ));
        }
        if self.max_buffer_size == 0 {
            return Err("max_buffer_size must be greater than zero".to_string());
        }
        Ok(())
    }
}
