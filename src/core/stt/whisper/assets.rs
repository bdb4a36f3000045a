//! Whisper model asset download and caching.
//!
//! Files are fetched through the Hugging Face hub cache
//! (`~/.cache/huggingface/hub` or `HF_HOME`), so only the first start of a
//! given model touches the network.

use std::path::PathBuf;

use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tracing::info;

use super::config::WhisperConfig;
use crate::core::stt::base::{SttError, SttResultExt};

/// Local paths of every file the engine needs.
#[derive(Debug, Clone)]
pub struct WhisperAssets {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
    pub mel_filters_80: PathBuf,
    /// Only present in repos that ship it; required by large-v3 style models.
    pub mel_filters_128: Option<PathBuf>,
}

impl WhisperAssets {
    /// Resolve all assets, downloading any that are not cached yet.
    pub fn fetch(config: &WhisperConfig) -> Result<Self, SttError> {
        let api = Api::new().model_load("hf-hub api")?;

        info!(model = %config.model_id, "Resolving Whisper model files");
        let repo = api.repo(Repo::new(config.model_id.clone(), RepoType::Model));
        let config_path = repo.get("config.json").model_load("config.json")?;
        let tokenizer = repo.get("tokenizer.json").model_load("tokenizer.json")?;
        let weights = repo.get("model.safetensors").model_load("model.safetensors")?;

        let mel_repo = api.repo(Repo::new(config.mel_filters_repo.clone(), RepoType::Model));
        let mel_filters_80 = mel_repo.get("melfilters.bytes").model_load("melfilters.bytes")?;
        let mel_filters_128 = mel_repo.get("melfilters128.bytes").ok();

        info!(
            model = %config.model_id,
            weights = %weights.display(),
            "Whisper model files ready"
        );

        Ok(Self {
            config: config_path,
            tokenizer,
            weights,
            mel_filters_80,
            mel_filters_128,
        })
    }

    /// Mel filter bank file matching the model's bin count.
    pub fn mel_filters_for(&self, num_mel_bins: usize) -> Result<&PathBuf, SttError> {
        match num_mel_bins {
            80 => Ok(&self.mel_filters_80),
            128 => self.mel_filters_128.as_ref().ok_or_else(|| {
                SttError::ModelLoad("melfilters128.bytes not found in mel filter repo".to_string())
            }),
            other => Err(SttError::ModelLoad(format!(
                "unsupported number of mel bins: {other}"
            ))),
        }
    }
}

/// Decode a little-endian `f32` filter bank of exactly `expected_len` values.
pub fn read_mel_filters(bytes: &[u8], expected_len: usize) -> Result<Vec<f32>, SttError> {
    if bytes.len() < expected_len * 4 {
        return Err(SttError::ModelLoad(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
