//! Shared test fixtures.
#![allow(dead_code)]

pub mod mock_engines;

pub use mock_engines::{MockOutput, MockVoice};

use narravox::config::{VoiceConfig, VoiceSettings};
use narravox::playback::PlaybackController;
use narravox::voice::Narrator;
use std::sync::Arc;

pub const TEST_API_KEY: &str = "sk_test_0123456789";

/// A valid-looking config pointed at `endpoint` (a mock server).
pub fn test_config(endpoint: &str) -> VoiceConfig {
    VoiceConfig {
        api_key: TEST_API_KEY.to_string(),
        voice_id: "test-voice".to_string(),
        endpoint: endpoint.to_string(),
        settings: VoiceSettings::default(),
    }
}

/// A config whose credential fails the validity predicate.
pub fn unconfigured_config() -> VoiceConfig {
    VoiceConfig {
        api_key: String::new(),
        voice_id: "test-voice".to_string(),
        // Unroutable on purpose; nothing may reach it.
        endpoint: "http://127.0.0.1:1/v1".to_string(),
        settings: VoiceSettings::default(),
    }
}

/// A narrator wired to recording mocks, handing the mocks back for
/// inspection.
pub fn mock_narrator(config: VoiceConfig) -> (Narrator, Arc<MockOutput>, Arc<MockVoice>) {
    mock_narrator_with(config, MockOutput::new(), MockVoice::new())
}

pub fn mock_narrator_with(
    config: VoiceConfig,
    output: MockOutput,
    voice: MockVoice,
) -> (Narrator, Arc<MockOutput>, Arc<MockVoice>) {
    let output = Arc::new(output);
    let voice = Arc::new(voice);
    let playback = Arc::new(PlaybackController::new(output.clone(), voice.clone()));
    (Narrator::new(config, playback), output, voice)
}
