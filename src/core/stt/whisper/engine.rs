use std::path::Path;

use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::assets::{WhisperAssets, read_mel_filters};
use super::audio::decode_file_to_pcm;
use super::config::WhisperConfig;
use crate::config::model_display_name;
use crate::core::stt::base::{SpeechModel, SttError, SttResultExt};

/// Special token ids resolved once at load time.
#[derive(Debug, Clone, Copy)]
struct PromptTokens {
    sot: u32,
    transcribe: u32,
    no_timestamps: u32,
    eot: u32,
    language: Option<u32>,
}

impl PromptTokens {
    fn resolve(tokenizer: &Tokenizer, config: &WhisperConfig) -> Result<Self, SttError> {
        let language = match config.language_token() {
            Some(token) => Some(token_id(tokenizer, &token).map_err(|_| {
                SttError::ModelLoad(format!("unsupported Whisper language token {token}"))
            })?),
            None => None,
        };

        Ok(Self {
            sot: token_id(tokenizer, m::SOT_TOKEN)?,
            transcribe: token_id(tokenizer, m::TRANSCRIBE_TOKEN)?,
            no_timestamps: token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?,
            eot: token_id(tokenizer, m::EOT_TOKEN)?,
            language,
        })
    }

    fn prompt(&self) -> Vec<u32> {
        let mut tokens = vec![self.sot];
        tokens.extend(self.language);
        tokens.push(self.transcribe);
        tokens.push(self.no_timestamps);
        tokens
    }
}

/// Whisper running in-process on the CPU through candle.
pub struct WhisperEngine {
    model: m::model::Whisper,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
    prompt: PromptTokens,
    max_decode_tokens: usize,
    name: String,
}

impl WhisperEngine {
    /// Download (or reuse cached) assets and load the model. Blocking.
    pub fn load(whisper: &WhisperConfig) -> Result<Self, SttError> {
        let device = Device::Cpu;
        info!(
            device = ?device,
            model = %whisper.model_id,
            "Initializing Whisper transcription engine"
        );

        let assets = WhisperAssets::fetch(whisper)?;

        let config_contents = std::fs::read_to_string(&assets.config).model_load("read config")?;
        let config: Config = serde_json::from_str(&config_contents).model_load("parse config")?;

        let tokenizer = Tokenizer::from_file(&assets.tokenizer).model_load("tokenizer")?;
        let prompt = PromptTokens::resolve(&tokenizer, whisper)?;

        let mel_path = assets.mel_filters_for(config.num_mel_bins)?;
        let mel_bytes = std::fs::read(mel_path).model_load("mel filters")?;
        let mel_filters = read_mel_filters(&mel_bytes, config.num_mel_bins * (m::N_FFT / 2 + 1))?;

        // SAFETY: the safetensors file is memory-mapped read-only and outlives the model
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&assets.weights], m::DTYPE, &device)
                .model_load("weights")?
        };
        let model = m::model::Whisper::load(&vb, config.clone()).model_load("model")?;

        info!(model = %whisper.model_id, "Whisper engine loaded");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            mel_filters,
            prompt,
            max_decode_tokens: whisper.max_decode_tokens,
            name: model_display_name(&whisper.model_id).to_string(),
        })
    }

    /// Transcribe 16 kHz mono samples, one 30 second window at a time.
    pub fn transcribe_pcm(&mut self, pcm: &[f32]) -> Result<String, SttError> {
        let mut segments: Vec<String> = Vec::new();

        for (index, mel) in self.mel_windows(pcm)?.iter().enumerate() {
            debug!(segment = index, "Decoding audio window");
            let text = self.decode_window(mel)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");
        info!(
            segments = segments.len(),
            chars = transcript.len(),
            "Audio transcription completed"
        );
        Ok(transcript)
    }

    /// Log-mel spectrogram of `pcm` cut into encoder-sized windows.
    ///
    /// The spectrogram is computed once over the whole input; candle pads it
    /// with trailing silence, so every window covering real audio can take a
    /// full `N_FRAMES` slice.
    fn mel_windows(&self, pcm: &[f32]) -> Result<Vec<Tensor>, SttError> {
        let n_mel = self.config.num_mel_bins;
        let mel = m::audio::pcm_to_mel(&self.config, pcm, &self.mel_filters);
        let total_frames = mel.len() / n_mel;
        let mel = Tensor::from_vec(mel, (1, n_mel, total_frames), &self.device)
            .inference("mel tensor")?;

        let content_frames = pcm.len() / m::HOP_LENGTH;
        let mut windows = Vec::new();
        let mut seek = 0;
        while seek < content_frames {
            let len = m::N_FRAMES.min(total_frames - seek);
            windows.push(mel.narrow(2, seek, len).inference("mel window")?);
            seek += m::N_FRAMES;
        }
        Ok(windows)
    }

    fn decode_window(&mut self, mel: &Tensor) -> Result<String, SttError> {
        let audio_features = self.model.encoder.forward(mel, true).inference("encoder")?;

        let prompt = self.prompt.prompt();
        let prompt_len = prompt.len();
        let mut tokens = prompt;

        for _ in 0..self.max_decode_tokens {
            let token_tensor = Tensor::new(tokens.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .inference("token tensor")?;

            let hidden = self
                .model
                .decoder
                .forward(&token_tensor, &audio_features, tokens.len() == prompt_len)
                .inference("decoder")?;
            let logits = hidden
                .squeeze(0)
                .and_then(|h| self.model.decoder.final_linear(&h))
                .inference("final linear")?;

            let seq_len = logits.dim(0).inference("logits shape")?;
            let next_token = logits
                .i(seq_len - 1)
                .and_then(|last| last.argmax(0))
                .and_then(|t| t.to_scalar::<u32>())
                .inference("argmax")?;

            if next_token == self.prompt.eot {
                break;
            }
            tokens.push(next_token);
        }

        self.model.reset_kv_cache();

        let text = self
            .tokenizer
            .decode(&tokens[prompt_len..], true)
            .inference("detokenize")?;
        Ok(text.trim().to_string())
    }
}

impl SpeechModel for WhisperEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn transcribe_file(&mut self, path: &Path) -> Result<String, SttError> {
        let pcm = decode_file_to_pcm(path)?;
        self.transcribe_pcm(&pcm)
    }
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, SttError> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| SttError::ModelLoad(format!("token not found: {token}")))
}
