use std::path::Path;

use thiserror::Error;

/// Errors raised while turning an uploaded file into a transcript.
///
/// Every variant is a server-side failure from the caller's point of view;
/// the message is returned verbatim in the HTTP error body.
#[derive(Debug, Error)]
pub enum SttError {
    /// The uploaded bytes could not be written to the scratch file.
    #[error("Failed to store uploaded audio: {0}")]
    ScratchFile(String),

    /// Unsupported container/codec or a corrupt file.
    #[error("Audio decoding failed: {0}")]
    AudioDecoding(String),

    /// Weights, tokenizer or mel filters could not be fetched or parsed.
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    /// The model ran but inference failed.
    #[error("Transcription failed: {0}")]
    Inference(String),

    /// The binary was built without a local speech model.
    #[error("Local transcription is unavailable: {0}")]
    Unavailable(String),
}

/// Convenience conversions from foreign errors into [`SttError`] with context.
pub(crate) trait SttResultExt<T> {
    fn inference(self, context: &str) -> Result<T, SttError>;
    fn model_load(self, context: &str) -> Result<T, SttError>;
    fn decoding(self, context: &str) -> Result<T, SttError>;
}

impl<T, E: std::fmt::Display> SttResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, SttError> {
        self.map_err(|e| SttError::Inference(describe(context, &e)))
    }

    fn model_load(self, context: &str) -> Result<T, SttError> {
        self.map_err(|e| SttError::ModelLoad(describe(context, &e)))
    }

    fn decoding(self, context: &str) -> Result<T, SttError> {
        self.map_err(|e| SttError::AudioDecoding(describe(context, &e)))
    }
}

/// First line of the error only. Candle appends a backtrace when
/// `RUST_BACKTRACE` is set and that must not reach the response body.
fn describe(context: &str, error: &dyn std::fmt::Display) -> String {
    let message = error.to_string();
    let first_line = message.lines().next().unwrap_or_default().trim_end();
    format!("{context}: {first_line}")
}

/// A loaded speech-recognition model.
///
/// Implementations are driven from a blocking thread and never concurrently:
/// the [`Transcriber`](super::Transcriber) owning the model serializes calls,
/// so `&mut self` is available for stateful runtimes (KV caches, sessions).
pub trait SpeechModel: Send + 'static {
    /// Model name reported by the health endpoint.
    fn name(&self) -> &str;

    /// Transcribe the audio file at `path`. The returned text is trimmed by the caller.
    fn transcribe_file(&mut self, path: &Path) -> Result<String, SttError>;
}
