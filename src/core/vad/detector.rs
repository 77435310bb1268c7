//! Energy-based voice activity detector
//!
//! Each frame is classified by comparing its root-mean-square energy against
//! a fixed silence threshold. A bounded rolling buffer of recent frames is
//! kept for smoothing; the buffer never blocks or fails.

use std::collections::VecDeque;

use tokio::time::Instant;

use super::config::VadConfig;

/// Result of analyzing a single audio frame.
#[derive(Debug, Clone)]
pub struct VadResult {
    /// Whether the frame contains speech
    pub is_speech: bool,
    /// Detection confidence in [0.0, 1.0]
    pub confidence: f32,
    /// When the frame was analyzed
    pub observed_at: Instant,
}

/// Detects voice activity in a stream of audio frames.
///
/// One detector instance is owned by each call session; it is not shared
/// across calls.
#[derive(Debug)]
pub struct EnergyVad {
    buffer: VecDeque<Vec<f32>>,
    config: VadConfig,
}

impl EnergyVad {
    pub fn new(config: VadConfig) -> Self {
        Self {
            buffer: VecDeque::with_capacity(config.max_buffer_size),
            config,
        }
    }

    /// Analyze one frame of audio samples.
    ///
    /// An empty frame yields zero energy rather than an error.
    pub fn analyze(&mut self, samples: &[f32]) -> VadResult {
        let energy = rms_energy(samples);

        self.buffer.push_back(samples.to_vec());
        while self.buffer.len() > self.config.max_buffer_size {
            self.buffer.pop_front();
        }

        VadResult {
            is_speech: energy > self.config.silence_threshold,
            confidence: self.confidence(energy),
            observed_at: Instant::now(),
        }
    }

    /// Confidence is the energy normalized against twice the silence
    /// threshold, clamped to [0, 1].
    fn confidence(&self, energy: f32) -> f32 {
        (energy / (self.config.silence_threshold * 2.0)).clamp(0.0, 1.0)
    }

    /// Clear the rolling buffer. Called when a session is reused or
    /// restarted; not required mid-call under normal operation.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of frames currently buffered.
    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }
}

/// Root-mean-square of the sample amplitudes. Zero for empty input.
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
