//! Narravox Error Types
//!
//! One taxonomy for both speech backends. Adapter-level failures are
//! returned as values, never panicked across the boundary; the
//! orchestrator inspects them to decide on fallback.

use thiserror::Error;

/// Central error type for speech synthesis and playback.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("cloud voice not configured (missing or invalid API key)")]
    NotConfigured,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid synthesis request: {0}")]
    InvalidRequest(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider error (HTTP {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("no speech engine available on this system")]
    PlatformUnsupported,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for narravox operations
pub type SpeechResult<T> = Result<T, SpeechError>;

impl SpeechError {
    /// Short machine-readable kind, used in notices and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SpeechError::NotConfigured => "not_configured",
            SpeechError::AuthFailed(_) => "auth_failed",
            SpeechError::InvalidRequest(_) => "invalid_request",
            SpeechError::RateLimited(_) => "rate_limited",
            SpeechError::Provider { .. } => "provider_error",
            SpeechError::Network(_) => "network_error",
            SpeechError::Playback(_) => "playback_error",
            SpeechError::PlatformUnsupported => "platform_unsupported",
            SpeechError::Io(_) => "io_error",
        }
    }
}
