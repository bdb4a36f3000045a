use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::base::{SpeechModel, SttError};
use super::scratch::ScratchAudio;
use crate::config::ServerConfig;

/// Shared handle to the process-wide speech model.
///
/// Cloning is cheap. All clones share one model; concurrent requests queue on
/// the mutex, and the work itself runs on tokio's blocking pool so the async
/// runtime keeps serving `/chat` and `/health` meanwhile.
#[derive(Clone)]
pub struct Transcriber {
    model: Arc<Mutex<Box<dyn SpeechModel>>>,
    model_name: Arc<str>,
    scratch_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Transcriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcriber")
            .field("model_name", &self.model_name)
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

impl Transcriber {
    pub fn new(model: Box<dyn SpeechModel>, scratch_dir: Option<PathBuf>) -> Self {
        let model_name: Arc<str> = Arc::from(model.name());
        Self {
            model: Arc::new(Mutex::new(model)),
            model_name,
            scratch_dir,
        }
    }

    /// Load the model selected by `config`.
    ///
    /// With the `local-whisper` feature this downloads (first run only) and
    /// loads Whisper on a blocking thread. Without it, every transcription
    /// fails with [`SttError::Unavailable`] while the rest of the gateway runs.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, SttError> {
        let scratch_dir = config.scratch_dir.clone();

        #[cfg(feature = "local-whisper")]
        {
            let whisper = super::whisper::WhisperConfig::from_server_config(config);
            let engine = tokio::task::spawn_blocking(move || {
                super::whisper::WhisperEngine::load(&whisper)
            })
            .await
            .map_err(|e| SttError::ModelLoad(format!("model loading task failed: {e}")))??;
            Ok(Self::new(Box::new(engine), scratch_dir))
        }

        #[cfg(not(feature = "local-whisper"))]
        {
            tracing::warn!("Built without the local-whisper feature; /transcribe will fail");
            Ok(Self::new(
                Box::new(UnavailableModel::new(config.whisper_display_name())),
                scratch_dir,
            ))
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Persist `audio` to a scratch file, run the model on it and return the
    /// trimmed transcript. The scratch file is gone when this returns,
    /// whatever the outcome.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        file_name: Option<String>,
    ) -> Result<String, SttError> {
        let model = Arc::clone(&self.model);
        let scratch_dir = self.scratch_dir.clone();

        tokio::task::spawn_blocking(move || -> Result<String, SttError> {
            let scratch = ScratchAudio::create(&audio, file_name.as_deref(), scratch_dir.as_deref())?;

            let mut model = model.lock();
            debug!(model = model.name(), path = %scratch.path().display(), "Running transcription");
            let text = model.transcribe_file(scratch.path())?;
            let text = text.trim().to_string();

            info!(chars = text.len(), "Transcription finished");
            Ok(text)
        })
        .await
        .map_err(|e| SttError::Inference(format!("transcription task failed: {e}")))?
    }
}

/// Stand-in model for builds without a local speech engine.
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    name: String,
}

impl UnavailableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SpeechModel for UnavailableModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn transcribe_file(&mut self, _path: &Path) -> Result<String, SttError> {
        Err(SttError::Unavailable(
            "rebuild with the `local-whisper` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Records the scratch path it was given and echoes the file contents.
    struct EchoModel {
        seen: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl SpeechModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        fn transcribe_file(&mut self, path: &Path) -> Result<String, SttError> {
            self.seen.lock().push(path.to_path_buf());
            let bytes = std::fs::read(path).map_err(|e| SttError::Inference(e.to_string()))?;
            if bytes.starts_with(b"FAIL") {
                return Err(SttError::Inference("model rejected input".to_string()));
            }
            Ok(format!("  {}\n", String::from_utf8_lossy(&bytes)))
        }
    }

    fn echo_transcriber(dir: &TempDir) -> (Transcriber, Arc<Mutex<Vec<PathBuf>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = EchoModel {
            seen: Arc::clone(&seen),
        };
        (
            Transcriber::new(Box::new(model), Some(dir.path().to_path_buf())),
            seen,
        )
    }

    #[tokio::test]
    async fn test_transcribe_trims_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let (transcriber, seen) = echo_transcriber(&dir);

        let text = transcriber
            .transcribe(Bytes::from_static(b"hello world"), Some("clip.mp3".into()))
            .await
            .unwrap();

        assert_eq!(text, "hello world");
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].extension().unwrap(), "mp3");
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn test_transcribe_failure_still_cleans_up() {
        let dir = TempDir::new().unwrap();
        let (transcriber, seen) = echo_transcriber(&dir);

        let err = transcriber
            .transcribe(Bytes::from_static(b"FAIL"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SttError::Inference(_)));
        assert!(!seen.lock()[0].exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_model() {
        let dir = TempDir::new().unwrap();
        let (transcriber, seen) = echo_transcriber(&dir);

        let a = transcriber.clone();
        let b = transcriber.clone();
        let (ra, rb) = tokio::join!(
            a.transcribe(Bytes::from_static(b"one"), None),
            b.transcribe(Bytes::from_static(b"two"), None)
        );

        assert_eq!(ra.unwrap(), "one");
        assert_eq!(rb.unwrap(), "two");
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_model() {
        let transcriber = Transcriber::new(Box::new(UnavailableModel::new("whisper-base")), None);
        assert_eq!(transcriber.model_name(), "whisper-base");

        let err = transcriber
            .transcribe(Bytes::from_static(b"RIFF"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SttError::Unavailable(_)));
    }
}
