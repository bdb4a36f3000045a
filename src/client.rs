//! HTTP client for a running gateway.
//!
//! Drives the same two-step flow as the browser page: upload audio to
//! `/transcribe`, then send the transcript to `/chat` as a single user turn.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::core::ChatMessage;
use crate::handlers::messages::{ChatRequest, ChatResponse, HealthResponse, TranscribeResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with an error status.
    #[error("Gateway returned {status}: {message}")]
    Gateway { status: StatusCode, message: String },
}

/// Transcript and chat reply for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub transcript: String,
    pub reply: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    http: Client,
}

impl GatewayClient {
    /// Create a client for `base_url`.
    ///
    /// `accept_invalid_certs` is needed to talk to a gateway using its
    /// self-signed certificate.
    pub fn new(base_url: &str, accept_invalid_certs: bool) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.http.get(self.endpoint("health")?).send().await?;
        if !response.status().is_success() {
            return Err(gateway_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Upload `bytes` under `file_name` and return the transcript.
    pub async fn transcribe(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("audio", part);

        let response = self
            .http
            .post(self.endpoint("transcribe")?)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(gateway_error(response).await);
        }

        let body: TranscribeResponse = response.json().await?;
        match (body.success, body.transcript) {
            (true, Some(transcript)) => Ok(transcript),
            (_, _) => Err(ClientError::Gateway {
                status,
                message: body.error.unwrap_or_else(|| "missing transcript".to_string()),
            }),
        }
    }

    pub async fn transcribe_file(&self, path: &Path) -> Result<String, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav");
        self.transcribe(file_name, bytes).await
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.endpoint("chat")?)
            .json(&ChatRequest { messages })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(gateway_error(response).await);
        }

        let body: ChatResponse = response.json().await?;
        body.reply.ok_or_else(|| ClientError::Gateway {
            status,
            message: body.error.unwrap_or_else(|| "missing reply".to_string()),
        })
    }

    /// Transcribe `path`, then ask the chat backend about the transcript.
    pub async fn transcribe_and_reply(&self, path: &Path) -> Result<Exchange, ClientError> {
        let transcript = self.transcribe_file(path).await?;
        debug!(transcript = %transcript, "Transcription received");

        let reply = self.chat(vec![ChatMessage::user(transcript.clone())]).await?;
        Ok(Exchange { transcript, reply })
    }
}

/// Turn an error response into [`ClientError::Gateway`], preferring its `error` field.
async fn gateway_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);
    ClientError::Gateway { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcribe_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "transcript": "what time is it"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "messages": [{"role": "user", "content": "what time is it"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Noon."})))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("question.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let client = GatewayClient::new(&server.uri(), false).unwrap();
        let exchange = client.transcribe_and_reply(&file).await.unwrap();
        assert_eq!(exchange.transcript, "what time is it");
        assert_eq!(exchange.reply, "Noon.");
    }

    #[tokio::test]
    async fn test_gateway_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "upstream down"})),
            )
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri(), false).unwrap();
        let err = client.chat(vec![]).await.unwrap_err();
        match err {
            ClientError::Gateway { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let client = GatewayClient::new("https://10.0.0.2:5000/gateway", true).unwrap();
        assert_eq!(
            client.endpoint("health").unwrap().as_str(),
            "https://10.0.0.2:5000/gateway/health"
        );
    }
}
