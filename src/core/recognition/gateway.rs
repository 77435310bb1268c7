//! Per-call recognition stream management
//!
//! The gateway lazily opens one provider stream per call, tracks per-stream
//! activity, and recreates failed streams with a bounded retry budget before
//! surfacing the failure. Stream closure is idempotent and safe on unknown
//! call ids.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::retry::RetryPolicy;
use crate::errors::{SessionError, SessionResult};

use super::base::{RecognitionProvider, RecognitionStream, TranscriptResult};

/// Configuration for the recognition gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Retries before a stream failure is propagated. Default: 3
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed backoff between retries, in milliseconds. Default: 1000
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Streams with no activity for this long are eligible for proactive
    /// closure by the sweep. Default: 300 (5 minutes)
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_stream_idle_timeout_secs() -> u64 {
    300
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

impl RecognitionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.stream_idle_timeout_secs == 0 {
            return Err("stream_idle_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

struct StreamEntry {
    stream: Box<dyn RecognitionStream>,
    last_activity: Instant,
}

/// Wraps a streaming recognition provider with per-call stream lifecycle.
pub struct RecognitionGateway {
    provider: Arc<dyn RecognitionProvider>,
    streams: DashMap<String, Arc<Mutex<StreamEntry>>>,
    retry: RetryPolicy,
    idle_timeout: Duration,
}

impl RecognitionGateway {
    pub fn new(provider: Arc<dyn RecognitionProvider>, config: RecognitionConfig) -> Self {
        Self {
            provider,
            streams: DashMap::new(),
            retry: config.retry_policy(),
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Feed one audio frame through the call's recognition stream, creating
    /// the stream if this is the first frame for the call.
    ///
    /// On a write error the underlying stream is recreated (bounded retries,
    /// fixed backoff) and the write is attempted once more before the failure
    /// is propagated as `RecognitionTransient`.
    pub async fn process_chunk(
        &self,
        call_id: &str,
        samples: &[f32],
    ) -> SessionResult<Option<TranscriptResult>> {
        let entry = match self.streams.get(call_id) {
            Some(existing) => existing.value().clone(),
            None => self.create_stream(call_id).await?,
        };

        let mut guard = entry.lock().await;
        guard.last_activity = Instant::now();

        match guard.stream.write_frame(samples).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(call_id, error = %e, "recognition write failed, recreating stream");
                guard.stream.close().await;
                let new_stream = self
                    .retry
                    .run(|| self.provider.open_stream(call_id))
                    .await
                    .map_err(|e| SessionError::RecognitionTransient(e.to_string()))?;
                guard.stream = new_stream;
                guard
                    .stream
                    .write_frame(samples)
                    .await
                    .map_err(|e| SessionError::RecognitionTransient(e.to_string()))
            }
        }
    }

    async fn create_stream(&self, call_id: &str) -> SessionResult<Arc<Mutex<StreamEntry>>> {
        let stream = self
            .retry
            .run(|| self.provider.open_stream(call_id))
            .await
            .map_err(|e| SessionError::RecognitionTransient(e.to_string()))?;

        debug!(call_id, "opened recognition stream");
        let entry = Arc::new(Mutex::new(StreamEntry {
            stream,
            last_activity: Instant::now(),
        }));
        self.streams.insert(call_id.to_string(), entry.clone());
        Ok(entry)
    }

    /// Close and forget the call's stream. Safe to call on an already-closed
    /// or nonexistent stream.
    pub async fn close_stream(&self, call_id: &str) {
        if let Some((_, entry)) = self.streams.remove(call_id) {
            entry.lock().await.stream.close().await;
            debug!(call_id, "closed recognition stream");
        }
    }

    /// Close streams with no activity beyond the idle timeout.
    ///
    /// Streams whose lock is currently held are active by definition and are
    /// skipped.
    pub async fn close_idle_streams(&self) {
        let now = Instant::now();
        let mut idle: Vec<String> = Vec::new();
        for item in self.streams.iter() {
            if let Ok(guard) = item.value().try_lock()
                && now.duration_since(guard.last_activity) > self.idle_timeout
            {
                idle.push(item.key().clone());
            }
        }
        for call_id in idle {
            warn!(call_id = %call_id, "closing idle recognition stream");
            self.close_stream(&call_id).await;
        }
    }

    /// Number of currently open streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
