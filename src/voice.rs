//! Speech orchestration.
//!
//! [`Narrator`] ties the cloud client and the playback controller
//! together: cloud-first synthesis, fallback to the system voice on any
//! cloud failure, at most one utterance in flight.

use crate::config::VoiceConfig;
use crate::error::SpeechError;
use crate::playback::{PlaybackController, PlaybackStatus, RodioOutput, SessionId};
use crate::tts::elevenlabs::ElevenLabsClient;
use crate::tts::system::SystemVoice;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

const NOTICE_CAPACITY: usize = 16;

/// Why the orchestrator fell back to the system voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Credential missing or invalid; the network was never tried.
    NotConfigured,
    /// The cloud request was made and failed.
    SynthesisFailed { kind: &'static str, detail: String },
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NotConfigured => {
                write!(f, "cloud voice API key not configured, using system voice")
            }
            FallbackReason::SynthesisFailed { kind, detail } => {
                write!(f, "cloud synthesis failed ({kind}), using system voice: {detail}")
            }
        }
    }
}

/// Presentation-layer notifications emitted by [`Narrator::speak`].
#[derive(Debug, Clone)]
pub enum SpeechNotice {
    /// Cloud audio is starting.
    CloudPlayback,
    /// The cloud path was skipped or failed; the system voice takes over.
    Fallback(FallbackReason),
    /// Neither backend could speak the text.
    Failed(String),
}

/// The speech orchestrator consumed by the presentation layer.
pub struct Narrator {
    cloud: ElevenLabsClient,
    playback: Arc<PlaybackController>,
    notice_tx: broadcast::Sender<SpeechNotice>,
}

impl Narrator {
    pub fn new(config: VoiceConfig, playback: Arc<PlaybackController>) -> Self {
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            cloud: ElevenLabsClient::new(config),
            playback,
            notice_tx,
        }
    }

    /// Wire up the real backends: rodio playback and host TTS commands.
    pub fn with_defaults(config: VoiceConfig) -> Self {
        let playback = PlaybackController::new(
            Arc::new(RodioOutput::new()),
            Arc::new(SystemVoice::new()),
        );
        Self::new(config, Arc::new(playback))
    }

    /// Narrate `text`, preferring the cloud voice.
    ///
    /// No-op while an utterance is already generating or playing.
    /// Failures surface as [`SpeechNotice`]s and log lines; nothing
    /// escapes to the caller and the state always returns to idle.
    pub async fn speak(&self, text: &str) {
        match self.playback.status() {
            PlaybackStatus::Generating | PlaybackStatus::Playing => {
                debug!("speak ignored: an utterance is already in flight");
                return;
            }
            PlaybackStatus::Idle => {}
        }

        let session = self.playback.start_session();

        if !self.cloud.is_configured() {
            self.fall_back(session, text, FallbackReason::NotConfigured)
                .await;
            return;
        }

        match self.cloud.synthesize(text).await {
            Ok(clip) => {
                // A stop may have landed while the request was in flight;
                // the controller drops the clip, so skip the notice too.
                if self.playback.is_current(session) {
                    self.notify(SpeechNotice::CloudPlayback);
                }
                match self.playback.play_clip(session, clip).await {
                    Ok(true) => info!("cloud narration finished"),
                    Ok(false) => debug!("cloud clip dropped, session superseded"),
                    Err(e) => {
                        error!("cloud playback failed: {e}");
                        self.notify(SpeechNotice::Failed(format!(
                            "audio playback failed: {e}"
                        )));
                    }
                }
            }
            Err(e) => {
                warn!("cloud synthesis failed: {e}");
                self.fall_back(
                    session,
                    text,
                    FallbackReason::SynthesisFailed {
                        kind: e.kind(),
                        detail: e.to_string(),
                    },
                )
                .await;
            }
        }
    }

    /// Speak through the system voice with the full, untruncated text.
    async fn fall_back(&self, session: SessionId, text: &str, reason: FallbackReason) {
        warn!(%reason, "falling back to system voice");
        self.notify(SpeechNotice::Fallback(reason));
        match self.playback.play_utterance(session, text).await {
            Ok(true) => info!("system voice narration finished"),
            Ok(false) => debug!("utterance dropped, session superseded"),
            Err(SpeechError::PlatformUnsupported) => {
                error!("no system voice available");
                self.notify(SpeechNotice::Failed(
                    "speech is not supported on this system".to_string(),
                ));
            }
            Err(e) => {
                error!("system voice failed: {e}");
                self.notify(SpeechNotice::Failed(format!("system voice failed: {e}")));
            }
        }
    }

    /// Stop any active narration. Valid in any state.
    pub fn stop(&self) {
        self.playback.stop();
    }

    /// Flip the mute state, returning the new value.
    pub fn toggle_mute(&self) -> bool {
        self.playback.toggle_muted()
    }

    /// Set the stored volume (clamped to [0, 1]).
    pub fn set_volume(&self, volume: f32) {
        self.playback.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.playback.volume()
    }

    pub fn is_muted(&self) -> bool {
        self.playback.is_muted()
    }

    pub fn is_generating(&self) -> bool {
        self.playback.status() == PlaybackStatus::Generating
    }

    pub fn is_playing(&self) -> bool {
        self.playback.status() == PlaybackStatus::Playing
    }

    pub fn is_configured(&self) -> bool {
        self.cloud.is_configured()
    }

    /// Status view for the presentation layer.
    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.playback.subscribe()
    }

    /// Notices emitted by `speak`.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<SpeechNotice> {
        self.notice_tx.subscribe()
    }

    fn notify(&self, notice: SpeechNotice) {
        debug!(?notice, "speech notice");
        let _ = self.notice_tx.send(notice);
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator").field("cloud", &self.cloud).finish()
    }
}
