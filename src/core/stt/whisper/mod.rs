//! Local Whisper inference on candle.

mod assets;
mod audio;
mod config;
mod engine;

pub use assets::{WhisperAssets, read_mel_filters};
pub use audio::{TARGET_SAMPLE_RATE, decode_file_to_pcm};
pub use config::{DEFAULT_MAX_DECODE_TOKENS, WhisperConfig};
pub use engine::WhisperEngine;
