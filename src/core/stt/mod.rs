mod base;
mod scratch;
mod transcriber;

#[cfg(feature = "local-whisper")]
pub mod whisper;

pub use base::{SpeechModel, SttError};
pub use scratch::ScratchAudio;
pub use transcriber::{Transcriber, UnavailableModel};
