//! Voice configuration.
//!
//! The credential and voice identity are read once (typically from the
//! environment) into an immutable `VoiceConfig` handed to the cloud
//! client at construction time. Nothing reads the environment at call
//! sites.

use serde::Serialize;
use tracing::debug;

/// Default ElevenLabs API root.
pub const DEFAULT_ENDPOINT: &str = "https://api.elevenlabs.io/v1";
/// Default narration voice.
pub const DEFAULT_VOICE_ID: &str = "E95NigJoVU5BI8HjQeN3";

const PLACEHOLDER_KEY: &str = "your_elevenlabs_api_key";
const KEY_PREFIX: &str = "sk_";
const MIN_KEY_LEN: usize = 11;

/// Cloud voice configuration, read-only after construction.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub api_key: String,
    pub voice_id: String,
    /// API root without a trailing slash, e.g. `https://api.elevenlabs.io/v1`.
    pub endpoint: String,
    pub settings: VoiceSettings,
}

/// Voice quality knobs, serialized verbatim into the synthesis request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

impl VoiceConfig {
    /// Build a config from `ELEVENLABS_API_KEY`, with optional
    /// `NARRAVOX_VOICE_ID` / `NARRAVOX_ENDPOINT` overrides.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            voice_id: std::env::var("NARRAVOX_VOICE_ID")
                .unwrap_or_else(|_| DEFAULT_VOICE_ID.to_string()),
            endpoint: std::env::var("NARRAVOX_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            settings: VoiceSettings::default(),
        }
    }

    /// Pure validity check for the cloud credential.
    ///
    /// The key must be non-empty, not the documented placeholder, long
    /// enough to be real, and carry the `sk_` prefix the provider issues.
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.as_str();
        let ok = !key.is_empty()
            && key != PLACEHOLDER_KEY
            && key.len() >= MIN_KEY_LEN
            && key.starts_with(KEY_PREFIX);
        if !ok {
            debug!(
                empty = key.is_empty(),
                placeholder = (key == PLACEHOLDER_KEY),
                long_enough = (key.len() >= MIN_KEY_LEN),
                prefixed = key.starts_with(KEY_PREFIX),
                "cloud voice credential failed validation"
            );
        }
        ok
    }
}
