// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encoder-decoder captioning model
//!
//! Combines the vision encoder and the text decoder into a
//! [`CaptionBackend`].

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use super::decoder::TextDecoder;
use super::encoder::VisionEncoder;
use super::preprocessing::{preprocess_for_encoder, ENCODER_INPUT_SIZE};
use super::session::SessionOptions;
use crate::vision::caption::CaptionBackend;

/// Paths of the files making up one captioning model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionModelFiles {
    pub vision_encoder: PathBuf,
    pub embed_tokens: PathBuf,
    pub decoder: PathBuf,
    pub tokenizer: PathBuf,
}

pub struct OnnxCaptionModel {
    name: String,
    encoder: VisionEncoder,
    decoder: TextDecoder,
    input_size: u32,
}

impl std::fmt::Debug for OnnxCaptionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxCaptionModel")
            .field("name", &self.name)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl OnnxCaptionModel {
    /// Load all sessions of the model
    ///
    /// # Errors
    /// Returns error if any file is missing or ONNX Runtime rejects it.
    pub fn load(
        name: impl Into<String>,
        files: &CaptionModelFiles,
        options: &SessionOptions,
    ) -> Result<Self> {
        let name = name.into();
        let start = Instant::now();

        let encoder = VisionEncoder::new(&files.vision_encoder, options)
            .context("Failed to load vision encoder")?;
        let decoder = TextDecoder::new(&files.decoder, &files.embed_tokens, &files.tokenizer, options)
            .context("Failed to load text decoder")?;

        info!(
            "Caption model {} ready in {}ms",
            name,
            start.elapsed().as_millis()
        );

        Ok(Self {
            name,
            encoder,
            decoder,
            input_size: ENCODER_INPUT_SIZE,
        })
    }
}

impl CaptionBackend for OnnxCaptionModel {
    fn generate(
        &self,
        image: &DynamicImage,
        prompt: &str,
        max_new_tokens: usize,
    ) -> Result<String> {
        let pixel_values = preprocess_for_encoder(image, self.input_size);

        let features = self
            .encoder
            .encode(&pixel_values)
            .context("Failed to encode image")?;
        debug!(
            "Encoded to {} sequences x {} dimensions",
            features.nrows(),
            features.ncols()
        );

        self.decoder
            .generate(&features, prompt, max_new_tokens)
            .context("Failed to generate caption")
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
