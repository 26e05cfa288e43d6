//! Narravox - speak a line of text aloud.
//!
//! Thin CLI over the library: cloud voice when configured, system voice
//! otherwise.

use anyhow::Result;
use clap::Parser;
use narravox::config::VoiceConfig;
use narravox::voice::{Narrator, SpeechNotice};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text to narrate
    text: String,

    /// Output volume (0.0 - 1.0)
    #[arg(long, default_value_t = narravox::playback::DEFAULT_VOLUME)]
    volume: f32,

    /// Start muted (useful for dry runs)
    #[arg(long)]
    muted: bool,

    /// Override the cloud voice ID
    #[arg(long)]
    voice_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = VoiceConfig::from_env();
    if let Some(voice_id) = args.voice_id {
        config.voice_id = voice_id;
    }

    let narrator = Narrator::with_defaults(config);
    narrator.set_volume(args.volume);
    if args.muted {
        narrator.toggle_mute();
    }

    let mut notices = narrator.subscribe_notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice {
                SpeechNotice::CloudPlayback => info!("🔊 Playing with the cloud voice"),
                SpeechNotice::Fallback(reason) => info!("⚠️ {reason}"),
                SpeechNotice::Failed(detail) => info!("❌ {detail}"),
            }
        }
    });

    if !narrator.is_configured() {
        info!("💡 No cloud credential found, the system voice will be used");
    }

    info!("🗣️ Narrating {} characters...", args.text.chars().count());
    narrator.speak(&args.text).await;

    Ok(())
}
