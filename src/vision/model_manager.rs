// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup loading of the captioning model
//!
//! The model is loaded once per process and shared by every request through
//! a [`CaptionGenerator`] handle. Files come from a local directory when one
//! is configured, otherwise from the HuggingFace hub cache.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::caption::CaptionGenerator;
use super::onnx::{CaptionModelFiles, ExecutionDevice, OnnxCaptionModel, SessionOptions};

/// Default pretrained model identifier on the HuggingFace hub
pub const DEFAULT_MODEL_ID: &str = "onnx-community/Florence-2-base-ft";

/// Configuration for loading the captioning model
#[derive(Debug, Clone)]
pub struct CaptionModelConfig {
    /// Local directory holding the model files; takes precedence over the hub
    pub model_dir: Option<PathBuf>,
    /// Pretrained model identifier, used for hub downloads and reporting
    pub model_id: String,
    pub vision_encoder_file: String,
    pub embed_tokens_file: String,
    pub decoder_file: String,
    pub tokenizer_file: String,
    pub device: ExecutionDevice,
    pub intra_threads: usize,
}

impl Default for CaptionModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            vision_encoder_file: "onnx/vision_encoder.onnx".to_string(),
            embed_tokens_file: "onnx/embed_tokens.onnx".to_string(),
            decoder_file: "onnx/decoder_model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            device: ExecutionDevice::Auto,
            intra_threads: 4,
        }
    }
}

impl CaptionModelConfig {
    fn file_names(&self) -> [&str; 4] {
        [
            self.vision_encoder_file.as_str(),
            self.embed_tokens_file.as_str(),
            self.decoder_file.as_str(),
            self.tokenizer_file.as_str(),
        ]
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            device: self.device,
            intra_threads: self.intra_threads,
        }
    }
}

/// Locate the model files for `config`
pub async fn resolve_model_files(config: &CaptionModelConfig) -> Result<CaptionModelFiles> {
    match config.model_dir {
        Some(ref dir) => resolve_local(dir, config),
        None => download_from_hub(config).await,
    }
}

/// Find each file in a local directory, by its relative path or bare file name
pub fn resolve_local(dir: &Path, config: &CaptionModelConfig) -> Result<CaptionModelFiles> {
    if !dir.is_dir() {
        anyhow::bail!("Model directory not found: {}", dir.display());
    }

    let [encoder, embed, decoder, tokenizer] = config.file_names();
    Ok(CaptionModelFiles {
        vision_encoder: find_model_file(dir, encoder)?,
        embed_tokens: find_model_file(dir, embed)?,
        decoder: find_model_file(dir, decoder)?,
        tokenizer: find_model_file(dir, tokenizer)?,
    })
}

fn find_model_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let nested = dir.join(name);
    if nested.exists() {
        return Ok(nested);
    }

    if let Some(file_name) = Path::new(name).file_name() {
        let flat = dir.join(file_name);
        if flat.exists() {
            return Ok(flat);
        }
    }

    anyhow::bail!("Model file {} not found in {}", name, dir.display())
}

async fn download_from_hub(config: &CaptionModelConfig) -> Result<CaptionModelFiles> {
    info!("Fetching {} from the HuggingFace hub", config.model_id);

    let api = hf_hub::api::tokio::Api::new().context("Failed to initialise HuggingFace hub client")?;
    let repo = api.model(config.model_id.clone());

    let mut paths = Vec::with_capacity(4);
    for name in config.file_names() {
        let path = repo
            .get(name)
            .await
            .with_context(|| format!("Failed to fetch {} from {}", name, config.model_id))?;
        paths.push(path);
    }

    let mut paths = paths.into_iter();
    let mut next = || {
        paths
            .next()
            .ok_or_else(|| anyhow::anyhow!("Hub download returned too few files"))
    };
    Ok(CaptionModelFiles {
        vision_encoder: next()?,
        embed_tokens: next()?,
        decoder: next()?,
        tokenizer: next()?,
    })
}

/// Resolve, load and wrap the captioning model
///
/// Session creation is CPU-heavy, so it runs on the blocking pool.
pub async fn load_caption_generator(config: &CaptionModelConfig) -> Result<CaptionGenerator> {
    let files = resolve_model_files(config).await?;
    let options = config.session_options();

    let device = options.device.resolve();
    if config.device == ExecutionDevice::Auto && device == ExecutionDevice::Cpu {
        warn!("No CUDA device available, captioning will run on CPU");
    }
    info!("Loading caption model {} on {}", config.model_id, device);

    let name = config.model_id.clone();
    let model = tokio::task::spawn_blocking(move || OnnxCaptionModel::load(name, &files, &options))
        .await
        .context("Model loading task panicked")??;

    Ok(CaptionGenerator::new(Arc::new(model)))
}
