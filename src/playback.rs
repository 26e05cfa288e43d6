//! Playback controller and audio output.
//!
//! Owns the single active playback session. Cloud clips go through an
//! [`AudioOutput`]; platform utterances go through a
//! [`VoiceEngine`](crate::tts::VoiceEngine). The rodio implementation
//! uses a channel to a dedicated audio thread because rodio's output
//! stream is not `Send`.

use crate::error::{SpeechError, SpeechResult};
use crate::tts::{AudioClip, Utterance, VoiceEngine};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Starting volume before the user touches the slider.
pub const DEFAULT_VOLUME: f32 = 0.8;

// Utterance tunables: mildly slowed, slightly raised.
const FALLBACK_RATE: f32 = 0.9;
const FALLBACK_PITCH: f32 = 1.1;

/// Status of the single playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Generating,
    Playing,
}

/// Identifies one generation/playback attempt. Results arriving for a
/// superseded identifier are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(u64);

/// Where cloud clip bytes go. Implemented by [`RodioOutput`] for real
/// hardware and by recording fakes in tests.
pub trait AudioOutput: Send + Sync + std::fmt::Debug {
    /// Begin playing `clip` at `volume`, firing `done` when playback
    /// ends or is stopped.
    fn play(&self, clip: AudioClip, volume: f32, done: oneshot::Sender<SpeechResult<()>>);

    /// Adjust the volume of the live clip, if any.
    fn set_volume(&self, volume: f32);

    /// Tear down the live clip, if any.
    fn stop(&self);
}

/// Commands sent to the audio thread
enum AudioCommand {
    Play {
        clip: AudioClip,
        volume: f32,
        done: oneshot::Sender<SpeechResult<()>>,
    },
    SetVolume(f32),
    Stop,
}

/// Rodio-backed output on a dedicated audio thread.
pub struct RodioOutput {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput").finish()
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioOutput {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();
        thread::spawn(move || Self::audio_thread(receiver));
        Self { sender }
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>) {
        use rodio::{OutputStream, Sink};

        let (stream, handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("audio output unavailable: {e}");
                Self::drain_unavailable(receiver);
                return;
            }
        };
        // Keep stream alive
        let _stream = stream;
        info!("audio thread started");

        let mut live: Option<(Sink, oneshot::Sender<SpeechResult<()>>)> = None;

        loop {
            // While a sink is live, poll so stop/volume stay responsive
            // and drainage can be noticed.
            let cmd = if live.is_some() {
                match receiver.recv_timeout(Duration::from_millis(50)) {
                    Ok(cmd) => Some(cmd),
                    Err(mpsc::RecvTimeoutError::Timeout) => None,
                    Err(mpsc::RecvTimeoutError::Disconnected) => return,
                }
            } else {
                match receiver.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => return,
                }
            };

            if live.as_ref().is_some_and(|(sink, _)| sink.empty()) {
                if let Some((_, done)) = live.take() {
                    let _ = done.send(Ok(()));
                }
            }

            let Some(cmd) = cmd else { continue };
            match cmd {
                AudioCommand::Play { clip, volume, done } => {
                    // Implicit stop-then-start.
                    if let Some((old, old_done)) = live.take() {
                        old.stop();
                        let _ = old_done.send(Ok(()));
                    }
                    match Self::start_clip(&handle, clip, volume) {
                        Ok(sink) => live = Some((sink, done)),
                        Err(e) => {
                            error!("failed to start clip: {e}");
                            let _ = done.send(Err(e));
                        }
                    }
                }
                AudioCommand::SetVolume(volume) => {
                    if let Some((sink, _)) = &live {
                        sink.set_volume(volume);
                    }
                }
                AudioCommand::Stop => {
                    if let Some((sink, done)) = live.take() {
                        sink.stop();
                        let _ = done.send(Ok(()));
                    }
                }
            }
        }
    }

    fn start_clip(
        handle: &rodio::OutputStreamHandle,
        clip: AudioClip,
        volume: f32,
    ) -> SpeechResult<rodio::Sink> {
        let source = rodio::Decoder::new(Cursor::new(clip.0))
            .map_err(|e| SpeechError::Playback(format!("could not decode audio: {e}")))?;
        let sink = rodio::Sink::try_new(handle)
            .map_err(|e| SpeechError::Playback(format!("could not open audio sink: {e}")))?;
        sink.set_volume(volume);
        sink.append(source);
        Ok(sink)
    }

    /// No output device: fail every play so the caller can fall back.
    fn drain_unavailable(receiver: mpsc::Receiver<AudioCommand>) {
        while let Ok(cmd) = receiver.recv() {
            if let AudioCommand::Play { done, .. } = cmd {
                let _ = done.send(Err(SpeechError::Playback(
                    "no audio output device".to_string(),
                )));
            }
        }
    }

    fn send(&self, cmd: AudioCommand) {
        if let Err(mpsc::SendError(lost)) = self.sender.send(cmd) {
            if let AudioCommand::Play { done, .. } = lost {
                let _ = done.send(Err(SpeechError::Playback(
                    "audio thread is gone".to_string(),
                )));
            }
        }
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, clip: AudioClip, volume: f32, done: oneshot::Sender<SpeechResult<()>>) {
        self.send(AudioCommand::Play { clip, volume, done });
    }

    fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    fn stop(&self) {
        self.send(AudioCommand::Stop);
    }
}

#[derive(Debug)]
struct SessionState {
    volume: f32,
    muted: bool,
    status: PlaybackStatus,
    session: u64,
}

/// Owns the single active playback session: at most one clip or
/// utterance is live, and starting a new one tears down the old one.
pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    voice: Arc<dyn VoiceEngine>,
    state: Mutex<SessionState>,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("voice", &self.voice.name())
            .finish()
    }
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>, voice: Arc<dyn VoiceEngine>) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::Idle);
        Self {
            output,
            voice,
            state: Mutex::new(SessionState {
                volume: DEFAULT_VOLUME,
                muted: false,
                status: PlaybackStatus::Idle,
                session: 0,
            }),
            status_tx,
        }
    }

    /// Stop whatever is active and open a new session in `Generating`.
    pub fn start_session(&self) -> SessionId {
        self.output.stop();
        self.voice.cancel();
        let mut s = self.lock();
        s.session += 1;
        let id = SessionId(s.session);
        self.set_status(&mut s, PlaybackStatus::Generating);
        id
    }

    /// Whether `session` is still the live one.
    pub fn is_current(&self, session: SessionId) -> bool {
        self.lock().session == session.0
    }

    /// Play a cloud clip for `session`. Returns `Ok(false)` without
    /// playing when the session was superseded or stopped while the
    /// clip was being generated.
    pub async fn play_clip(&self, session: SessionId, clip: AudioClip) -> SpeechResult<bool> {
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut s = self.lock();
            if s.session != session.0 || s.status != PlaybackStatus::Generating {
                debug!(session = session.0, "dropping stale cloud clip");
                return Ok(false);
            }
            let volume = if s.muted { 0.0 } else { s.volume };
            debug!(bytes = clip.len(), volume, "starting cloud clip");
            self.output.play(clip, volume, done_tx);
            self.set_status(&mut s, PlaybackStatus::Playing);
        }

        let result = done_rx.await;
        self.finish(session);
        match result {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            // Sender dropped without a verdict; treat as ended.
            Err(_) => Ok(true),
        }
    }

    /// Speak `text` through the platform voice for `session`, with the
    /// same stale guard as [`play_clip`](Self::play_clip). The text is
    /// not truncated on this path.
    pub async fn play_utterance(&self, session: SessionId, text: &str) -> SpeechResult<bool> {
        let utterance = {
            let mut s = self.lock();
            if s.session != session.0 || s.status != PlaybackStatus::Generating {
                debug!(session = session.0, "dropping stale utterance");
                return Ok(false);
            }
            self.set_status(&mut s, PlaybackStatus::Playing);
            Utterance {
                text: text.to_string(),
                volume: if s.muted { 0.0 } else { s.volume },
                rate: FALLBACK_RATE,
                pitch: FALLBACK_PITCH,
                voice: choose_voice(&self.voice.list_voices()),
            }
        };

        let result = self.voice.speak(&utterance).await;
        self.finish(session);
        result.map(|_| true)
    }

    /// Idempotent teardown of the active session.
    pub fn stop(&self) {
        self.output.stop();
        self.voice.cancel();
        let mut s = self.lock();
        s.session += 1;
        if s.status != PlaybackStatus::Idle {
            info!("playback stopped");
        }
        self.set_status(&mut s, PlaybackStatus::Idle);
    }

    /// Clamp and store the volume; forwarded to the live clip unless
    /// muted. An utterance's volume is fixed when it starts.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let mut s = self.lock();
        s.volume = volume;
        if s.status == PlaybackStatus::Playing && !s.muted {
            self.output.set_volume(volume);
        }
    }

    /// Mute or unmute without touching the stored volume.
    pub fn set_muted(&self, muted: bool) {
        let mut s = self.lock();
        s.muted = muted;
        if s.status == PlaybackStatus::Playing {
            self.output.set_volume(if muted { 0.0 } else { s.volume });
        }
    }

    /// Flip the mute state, returning the new value.
    pub fn toggle_muted(&self) -> bool {
        let mut s = self.lock();
        s.muted = !s.muted;
        if s.status == PlaybackStatus::Playing {
            self.output.set_volume(if s.muted { 0.0 } else { s.volume });
        }
        s.muted
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().status
    }

    /// Watch the status view consumed by the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    fn finish(&self, session: SessionId) {
        let mut s = self.lock();
        if s.session == session.0 {
            self.set_status(&mut s, PlaybackStatus::Idle);
        }
    }

    fn set_status(&self, s: &mut SessionState, status: PlaybackStatus) {
        if s.status != status {
            s.status = status;
            self.status_tx.send_replace(status);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Pick a friendlier-sounding voice when a name gives a hint; else the
/// first voice; else none (an empty list is accepted silently).
fn choose_voice(voices: &[String]) -> Option<String> {
    const HINTS: [&str; 3] = ["female", "woman", "girl"];
    voices
        .iter()
        .find(|name| {
            let lower = name.to_lowercase();
            HINTS.iter().any(|hint| lower.contains(hint))
        })
        .or_else(|| voices.first())
        .cloned()
}
