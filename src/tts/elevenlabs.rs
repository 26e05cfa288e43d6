//! ElevenLabs cloud synthesis client.
//!
//! Builds the synthesis request, classifies HTTP failures, and returns
//! the provider's compressed audio. One attempt per call: no caching,
//! no retries (retry policy, if any, belongs to the caller).

use crate::config::{VoiceConfig, VoiceSettings};
use crate::error::{SpeechError, SpeechResult};
use crate::tts::AudioClip;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum text length accepted by a single synthesis request.
pub const MAX_TEXT_CHARS: usize = 500;

const MODEL_ID: &str = "eleven_monolingual_v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// HTTP client for the ElevenLabs text-to-speech endpoint.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: VoiceConfig,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("voice_id", &self.config.voice_id)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

impl ElevenLabsClient {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Whether the credential passes the validity predicate.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Synthesize `text` into compressed audio, truncated to
    /// [`MAX_TEXT_CHARS`] characters.
    pub async fn synthesize(&self, text: &str) -> SpeechResult<AudioClip> {
        if !self.is_configured() {
            return Err(SpeechError::NotConfigured);
        }

        let trimmed = truncate(text, MAX_TEXT_CHARS);
        let url = format!(
            "{}/text-to-speech/{}",
            self.config.endpoint, self.config.voice_id
        );
        debug!(
            chars = trimmed.chars().count(),
            voice = %self.config.voice_id,
            "requesting cloud synthesis"
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.config.api_key)
            .json(&SynthesisRequest {
                text: trimmed,
                model_id: MODEL_ID,
                voice_settings: self.config.settings,
            })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "cloud synthesis rejected");
            return Err(classify(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        info!(bytes = bytes.len(), "cloud synthesis succeeded");
        Ok(AudioClip(bytes.to_vec()))
    }
}

/// Map a non-2xx response onto the error taxonomy.
fn classify(status: u16, body: String) -> SpeechError {
    match status {
        401 => SpeechError::AuthFailed(body),
        422 => SpeechError::InvalidRequest(body),
        429 => SpeechError::RateLimited(body),
        _ => SpeechError::Provider { status, body },
    }
}

/// Truncate to at most `max_chars` characters, never splitting one.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
