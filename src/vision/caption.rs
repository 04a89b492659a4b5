// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Road damage caption generation
//!
//! `CaptionGenerator` is the service the HTTP layer talks to. It normalises
//! the input image, asks the backend a fixed question about road damage and
//! replaces degenerate answers (empty, or the prompt echoed back) with
//! [`FAILED_CAPTION`]. The model itself sits behind [`CaptionBackend`].

use image::imageops::FilterType;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Fixed question asked about every uploaded photo
pub const CAPTION_PROMPT: &str = "What is the road damage in this image?";

/// Images are stretched to this square size before captioning
pub const CAPTION_INPUT_SIZE: u32 = 512;

/// Upper bound on generated tokens per caption
pub const MAX_NEW_TOKENS: usize = 100;

/// Caption substituted when the model produces nothing useful
pub const FAILED_CAPTION: &str = "[Model failed to generate meaningful caption]";

/// A captioning model
///
/// Implementations return the decoded text with special tokens removed.
/// Calls may block for the full duration of inference.
pub trait CaptionBackend: Send + Sync {
    fn generate(
        &self,
        image: &DynamicImage,
        prompt: &str,
        max_new_tokens: usize,
    ) -> anyhow::Result<String>;

    /// Identifier reported by the health endpoint
    fn model_name(&self) -> &str {
        "unknown"
    }
}

/// Caption generation failed somewhere between resize and decode
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for GenerationError {
    fn from(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the whole context chain
        Self::new(format!("{:#}", err))
    }
}

#[derive(Clone)]
pub struct CaptionGenerator {
    backend: Arc<dyn CaptionBackend>,
}

impl std::fmt::Debug for CaptionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionGenerator")
            .field("model", &self.backend.model_name())
            .finish()
    }
}

impl CaptionGenerator {
    pub fn new(backend: Arc<dyn CaptionBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Describe the road damage visible in `image`
    ///
    /// Never returns an empty string: degenerate model output becomes
    /// [`FAILED_CAPTION`]. Backend failures are logged and returned.
    pub fn caption(&self, image: &DynamicImage) -> Result<String, GenerationError> {
        let start = Instant::now();

        debug!(
            "Resizing {}x{} image to {}x{}",
            image.width(),
            image.height(),
            CAPTION_INPUT_SIZE,
            CAPTION_INPUT_SIZE
        );
        let resized = image.resize_exact(CAPTION_INPUT_SIZE, CAPTION_INPUT_SIZE, FilterType::Lanczos3);

        let generated = self
            .backend
            .generate(&resized, CAPTION_PROMPT, MAX_NEW_TOKENS)
            .map_err(|e| {
                let err = GenerationError::from(e);
                error!("Caption generation failed: {}", err);
                err
            })?;

        let caption = generated.trim();
        let caption = if Self::is_degenerate(caption) {
            info!("Model returned no usable caption: '{}'", caption);
            FAILED_CAPTION.to_string()
        } else {
            caption.to_string()
        };

        info!(
            "Caption generated in {}ms ({} chars)",
            start.elapsed().as_millis(),
            caption.len()
        );
        Ok(caption)
    }

    /// True when `text` is empty or just the prompt echoed back
    pub fn is_degenerate(text: &str) -> bool {
        let normalized = text.trim().to_lowercase();
        normalized.is_empty() || normalized == CAPTION_PROMPT.trim().to_lowercase()
    }
}
