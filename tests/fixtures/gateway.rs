//! Gateway fixtures: configuration, stub backends and app construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;

use voxchat_gateway::{
    AppState, ServerConfig, build_router,
    core::{ChatBackend, ChatMessage, LlmError, SpeechModel, SttError, Transcriber},
};

/// Plain-HTTP configuration with no API key and scratch files in `scratch_dir`.
pub fn test_config(scratch_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.tls = None;
    config.openai_api_key = None;
    config.scratch_dir = Some(scratch_dir.to_path_buf());
    config
}

/// Speech model returning a fixed transcript and recording each scratch path.
pub struct ScriptedModel {
    pub transcript: Result<String, String>,
    pub seen_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl SpeechModel for ScriptedModel {
    fn name(&self) -> &str {
        "whisper-base"
    }

    fn transcribe_file(&mut self, path: &Path) -> Result<String, SttError> {
        assert!(path.exists(), "scratch file must exist while the model runs");
        self.seen_paths.lock().push(path.to_path_buf());
        self.transcript.clone().map_err(SttError::Inference)
    }
}

/// Chat backend with a canned result that records the conversations it received.
pub struct StubChat {
    pub reply: Result<String, String>,
    pub received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatBackend for StubChat {
    fn model(&self) -> &str {
        "gpt-4o"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.received.lock().push(messages.to_vec());
        self.reply.clone().map_err(LlmError::Network)
    }
}

pub struct TestGateway {
    pub app: Router,
    pub seen_paths: Arc<Mutex<Vec<PathBuf>>>,
}

/// Build the full router around a scripted model and the given chat backend.
pub fn gateway(
    config: ServerConfig,
    transcript: Result<&str, &str>,
    chat: Arc<dyn ChatBackend>,
) -> TestGateway {
    let seen_paths = Arc::new(Mutex::new(Vec::new()));
    let model = ScriptedModel {
        transcript: transcript.map(str::to_string).map_err(str::to_string),
        seen_paths: Arc::clone(&seen_paths),
    };
    let transcriber = Transcriber::new(Box::new(model), config.scratch_dir.clone());
    let state = AppState::with_components(config, transcriber, chat);

    TestGateway {
        app: build_router(state),
        seen_paths,
    }
}

/// Build a `multipart/form-data` body with one file part.
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "voxchat-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// Multipart body with a plain text field and no file.
pub fn multipart_text_body(field: &str, value: &str) -> (String, Vec<u8>) {
    let boundary = "voxchat-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{boundary}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
