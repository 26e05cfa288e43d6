//! Mock audio output and voice engine for orchestration tests.
//!
//! Both record what they were asked to do so tests can verify it.

use async_trait::async_trait;
use narravox::error::{SpeechError, SpeechResult};
use narravox::playback::AudioOutput;
use narravox::tts::{AudioClip, Utterance, VoiceEngine};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Audio output that records clips. Completes each clip immediately
/// unless `hold_next` is set, in which case the test releases it.
#[derive(Debug, Default)]
pub struct MockOutput {
    /// (byte length, starting volume) per played clip
    pub clips: Arc<Mutex<Vec<(usize, f32)>>>,
    /// Every live volume adjustment
    pub volumes: Arc<Mutex<Vec<f32>>>,
    pub fail_next: Arc<Mutex<bool>>,
    hold: Arc<Mutex<bool>>,
    held: Arc<Mutex<Option<oneshot::Sender<SpeechResult<()>>>>>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the next clip playing until `release` (or a stop).
    pub fn hold_next(&self) {
        *self.hold.lock().unwrap() = true;
    }

    /// Finish a held clip as if playback ended normally.
    pub fn release(&self) {
        if let Some(done) = self.held.lock().unwrap().take() {
            let _ = done.send(Ok(()));
        }
    }

    pub fn played_count(&self) -> usize {
        self.clips.lock().unwrap().len()
    }
}

impl AudioOutput for MockOutput {
    fn play(&self, clip: AudioClip, volume: f32, done: oneshot::Sender<SpeechResult<()>>) {
        self.clips.lock().unwrap().push((clip.len(), volume));
        if *self.fail_next.lock().unwrap() {
            let _ = done.send(Err(SpeechError::Playback("mock playback failure".into())));
        } else if *self.hold.lock().unwrap() {
            *self.held.lock().unwrap() = Some(done);
        } else {
            let _ = done.send(Ok(()));
        }
    }

    fn set_volume(&self, volume: f32) {
        self.volumes.lock().unwrap().push(volume);
    }

    fn stop(&self) {
        self.release();
    }
}

/// Voice engine that records utterances, with switchable failure.
#[derive(Debug, Default)]
pub struct MockVoice {
    pub spoken: Arc<Mutex<Vec<Utterance>>>,
    pub voices: Arc<Mutex<Vec<String>>>,
    pub unsupported: Arc<Mutex<bool>>,
    pub cancelled: Arc<Mutex<usize>>,
}

impl MockVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        let voice = Self::default();
        *voice.unsupported.lock().unwrap() = true;
        voice
    }

    /// Check if a phrase was spoken
    pub fn was_spoken(&self, text: &str) -> bool {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.text.contains(text))
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }
}

#[async_trait]
impl VoiceEngine for MockVoice {
    fn list_voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }

    async fn speak(&self, utterance: &Utterance) -> SpeechResult<()> {
        if *self.unsupported.lock().unwrap() {
            return Err(SpeechError::PlatformUnsupported);
        }
        self.spoken.lock().unwrap().push(utterance.clone());
        Ok(())
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap() += 1;
    }

    fn name(&self) -> &str {
        "mock"
    }
}
