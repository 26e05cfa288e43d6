//! System voice engine over host TTS commands.
//!
//! Prefers espeak-ng, which maps volume, rate, pitch and voice selection
//! onto command-line flags; falls back to spd-say (speech-dispatcher),
//! which only honors rate and volume.

use crate::error::{SpeechError, SpeechResult};
use crate::tts::{Utterance, VoiceEngine};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// espeak-ng flag neutrals: amplitude 100 (of 200), 175 wpm, pitch 50 (of 99).
const ESPEAK_MAX_AMPLITUDE: f32 = 200.0;
const ESPEAK_BASE_WPM: f32 = 175.0;
const ESPEAK_BASE_PITCH: f32 = 50.0;

/// Host TTS subprocess engine.
#[derive(Debug, Default)]
pub struct SystemVoice {
    /// Live child tagged with the run that owns it, kept so `cancel`
    /// can kill it mid-utterance. The tag stops a cancelled run from
    /// reaping a successor's child.
    current: Mutex<Option<(u64, Child)>>,
    generation: AtomicU64,
}

impl SystemVoice {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(&self, mut cmd: Command) -> SpeechResult<()> {
        let child = match cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SpeechError::PlatformUnsupported)
            }
            Err(e) => return Err(e.into()),
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        // A replaced child is killed on drop.
        *self.lock() = Some((generation, child));

        // Poll so the child stays reachable for cancel() on another task.
        loop {
            {
                let mut guard = self.lock();
                match guard.as_mut() {
                    Some((owner, child)) if *owner == generation => match child.try_wait() {
                        Ok(Some(status)) => {
                            guard.take();
                            if status.success() {
                                return Ok(());
                            }
                            return Err(SpeechError::Playback(format!(
                                "speech command exited with {status}"
                            )));
                        }
                        Ok(None) => {}
                        Err(e) => {
                            guard.take();
                            return Err(e.into());
                        }
                    },
                    // Taken by cancel() or replaced by a newer run; the
                    // utterance ended early.
                    _ => return Ok(()),
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(u64, Child)>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VoiceEngine for SystemVoice {
    fn list_voices(&self) -> Vec<String> {
        let output = match std::process::Command::new("espeak-ng")
            .arg("--voices")
            .output()
        {
            Ok(output) if output.status.success() => output,
            Ok(_) | Err(_) => {
                debug!("espeak-ng voice listing unavailable");
                return Vec::new();
            }
        };
        parse_voice_table(&String::from_utf8_lossy(&output.stdout))
    }

    async fn speak(&self, utterance: &Utterance) -> SpeechResult<()> {
        match self.run(espeak_command(utterance)).await {
            Err(SpeechError::PlatformUnsupported) => {
                debug!("espeak-ng not found, trying spd-say");
            }
            other => return other,
        }
        match self.run(spd_command(utterance)).await {
            Err(SpeechError::PlatformUnsupported) => {
                warn!("no system TTS command found (tried espeak-ng, spd-say)");
                Err(SpeechError::PlatformUnsupported)
            }
            other => other,
        }
    }

    fn cancel(&self) {
        if let Some((_, mut child)) = self.lock().take() {
            debug!("cancelling system utterance");
            let _ = child.start_kill();
        }
    }

    fn name(&self) -> &str {
        "system"
    }
}

fn espeak_command(u: &Utterance) -> Command {
    let mut cmd = Command::new("espeak-ng");
    cmd.arg("-a")
        .arg(
            (((u.volume.clamp(0.0, 1.0)) * ESPEAK_MAX_AMPLITUDE).round() as i32).to_string(),
        )
        .arg("-s")
        .arg(((u.rate * ESPEAK_BASE_WPM).round() as i32).to_string())
        .arg("-p")
        .arg((((u.pitch * ESPEAK_BASE_PITCH).clamp(0.0, 99.0)).round() as i32).to_string());
    if let Some(voice) = &u.voice {
        cmd.arg("-v").arg(voice);
    }
    cmd.arg(&u.text);
    cmd
}

fn spd_command(u: &Utterance) -> Command {
    let mut cmd = Command::new("spd-say");
    // spd-say takes -100..100 offsets around its defaults; pitch and
    // voice selection are dropped on this path.
    cmd.arg("-w")
        .arg("-i")
        .arg(((u.volume.clamp(0.0, 1.0) * 200.0 - 100.0).round() as i32).to_string())
        .arg("-r")
        .arg((((u.rate - 1.0) * 100.0).clamp(-100.0, 100.0).round() as i32).to_string())
        .arg(&u.text);
    cmd
}

/// Pull the VoiceName column out of `espeak-ng --voices` output.
fn parse_voice_table(table: &str) -> Vec<String> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(3))
        .map(|name| name.to_string())
        .collect()
}
