//! Configuration for the callstream server
//!
//! Configuration is loaded from a YAML file or from environment variables
//! (with `.env` support via dotenvy). Priority: YAML > environment >
//! defaults. The tunables that were fixed constants in earlier iterations
//! of this system (silence finalize threshold, inactivity timeout) are
//! exposed here.
//!
//! # Example
//! ```rust,no_run
//! use callstream::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::recognition::RecognitionConfig;
use crate::core::vad::VadConfig;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for call session handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Ceiling on concurrently live sessions. Default: 100
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Bound on conversation history entries per call. Default: 10
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// Sessions idle beyond this are destroyed by the sweep. Default: 300
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Interval between inactivity sweeps. Default: 60
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Interval between transport liveness pings. Default: 30
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Silence duration that finalizes a pending partial utterance, in
    /// milliseconds. Default: 1000
    #[serde(default = "default_silence_finalize_ms")]
    pub silence_finalize_ms: u64,

    /// Personality assigned to new sessions. Default: "professional"
    #[serde(default = "default_personality")]
    pub default_personality: String,
}

fn default_max_concurrent_calls() -> usize {
    100
}

fn default_max_history_length() -> usize {
    10
}

fn default_inactivity_timeout_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_silence_finalize_ms() -> u64 {
    1000
}

fn default_personality() -> String {
    "professional".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: default_max_concurrent_calls(),
            max_history_length: default_max_history_length(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            silence_finalize_ms: default_silence_finalize_ms(),
            default_personality: default_personality(),
        }
    }
}

impl StreamConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn silence_finalize(&self) -> Duration {
        Duration::from_millis(self.silence_finalize_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_calls == 0 {
            return Err("max_concurrent_calls must be greater than zero".to_string());
        }
        if self.max_history_length == 0 {
            return Err("max_history_length must be greater than zero".to_string());
        }
        if self.inactivity_timeout_secs == 0 || self.sweep_interval_secs == 0 {
            return Err("inactivity timeout and sweep interval must be nonzero".to_string());
        }
        if self.heartbeat_interval_secs == 0 {
            return Err("heartbeat_interval_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host. Default: 0.0.0.0
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port. Default: 3001
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated allowed CORS origins, or "*" for any. None means
    /// same-origin only.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub vad: VadConfig,

    #[serde(default)]
    pub recognition: RecognitionConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: None,
            stream: StreamConfig::default(),
            vad: VadConfig::default(),
            recognition: RecognitionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid PORT value: {port}")))?;
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = Some(origins);
        }
        if let Ok(value) = std::env::var("MAX_CONCURRENT_CALLS") {
            config.stream.max_concurrent_calls = parse_env("MAX_CONCURRENT_CALLS", &value)?;
        }
        if let Ok(value) = std::env::var("MAX_HISTORY_LENGTH") {
            config.stream.max_history_length = parse_env("MAX_HISTORY_LENGTH", &value)?;
        }
        if let Ok(value) = std::env::var("INACTIVITY_TIMEOUT_SECS") {
            config.stream.inactivity_timeout_secs = parse_env("INACTIVITY_TIMEOUT_SECS", &value)?;
        }
        if let Ok(value) = std::env::var("SILENCE_FINALIZE_MS") {
            config.stream.silence_finalize_ms = parse_env("SILENCE_FINALIZE_MS", &value)?;
        }
        if let Ok(personality) = std::env::var("DEFAULT_PERSONALITY") {
            config.stream.default_personality = personality;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file over defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The socket address string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream.validate().map_err(ConfigError::Invalid)?;
        self.vad.validate().map_err(ConfigError::Invalid)?;
        self.recognition.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid {name} value: {value}")))
}
