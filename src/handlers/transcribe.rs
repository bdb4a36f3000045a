use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

use super::messages::TranscribeResponse;
use crate::core::SttError;
use crate::errors::AppError;
use crate::state::AppState;

/// Multipart field carrying the uploaded audio.
pub const AUDIO_FIELD: &str = "audio";

const NO_AUDIO_MESSAGE: &str = "No audio file provided";

/// Error rendered with the `{success: false, error}` envelope.
#[derive(Debug)]
pub struct TranscribeFailure(pub AppError);

impl From<AppError> for TranscribeFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<SttError> for TranscribeFailure {
    fn from(err: SttError) -> Self {
        Self(AppError::Transcription(err))
    }
}

impl IntoResponse for TranscribeFailure {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status_code();
        (status, Json(TranscribeResponse::failed(self.0.to_string()))).into_response()
    }
}

struct AudioUpload {
    file_name: Option<String>,
    bytes: Bytes,
}

/// Transcribe an uploaded audio file with the local speech model.
///
/// Expects a multipart body whose `audio` part is a file. The upload is
/// written to a scratch file that is removed before the response is sent.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, TranscribeFailure> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Rejected non-multipart upload: {}", rejection.body_text());
        AppError::BadRequest(NO_AUDIO_MESSAGE.to_string())
    })?;

    let upload = read_audio_field(multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest(NO_AUDIO_MESSAGE.to_string()))?;

    info!(
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.bytes.len(),
        "Received audio for transcription"
    );

    let transcript = state
        .transcriber
        .transcribe(upload.bytes, upload.file_name)
        .await?;

    info!(transcript = %transcript, "Transcribed");
    Ok(Json(TranscribeResponse::ok(transcript)))
}

/// Find the first `audio` part that is a file. Other parts are drained and ignored.
async fn read_audio_field(mut multipart: Multipart) -> Result<Option<AudioUpload>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field.bytes().await.map_err(multipart_error)?;
        let file_name = (!file_name.is_empty()).then_some(file_name);
        return Ok(Some(AudioUpload { file_name, bytes }));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
