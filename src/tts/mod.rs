//! Speech backends.
//!
//! Two backends with different capabilities: the ElevenLabs cloud API
//! produces compressed audio bytes for local playback, and the system
//! voice engine renders an utterance directly through host TTS tooling.

use crate::error::SpeechResult;
use async_trait::async_trait;

pub mod elevenlabs;
pub mod system;

/// Opaque compressed audio returned by the cloud backend (audio/mpeg).
#[derive(Debug, Clone)]
pub struct AudioClip(pub Vec<u8>);

impl AudioClip {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A request to the platform voice engine.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    /// Effective output level in [0, 1].
    pub volume: f32,
    /// Speaking rate relative to the engine default of 1.0.
    pub rate: f32,
    /// Pitch relative to the engine default of 1.0.
    pub pitch: f32,
    /// Engine voice name; `None` lets the engine pick.
    pub voice: Option<String>,
}

/// Platform speech capability.
#[async_trait]
pub trait VoiceEngine: Send + Sync + std::fmt::Debug {
    /// Names of the voices the engine offers. May be empty.
    fn list_voices(&self) -> Vec<String>;

    /// Speak the utterance; resolves when speech finishes or is cancelled.
    async fn speak(&self, utterance: &Utterance) -> SpeechResult<()>;

    /// Cancel any in-progress utterance.
    fn cancel(&self);

    /// Get the engine name
    fn name(&self) -> &str;
}
