//! Narravox Library
//!
//! Cloud-first narration: speak short text snippets through the
//! ElevenLabs text-to-speech API, falling back to the host system voice
//! when the cloud backend is unconfigured or failing.

pub mod config;
pub mod error;
pub mod playback;
pub mod tts;
pub mod voice;
