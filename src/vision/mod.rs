// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for road damage analysis
//!
//! This module provides:
//! - Image decoding to RGB
//! - Caption generation behind the [`CaptionBackend`] seam
//! - An ONNX Runtime encoder-decoder backend
//! - Startup model loading

pub mod caption;
pub mod image_utils;
pub mod model_manager;
pub mod onnx;

pub use caption::{
    CaptionBackend, CaptionGenerator, GenerationError, CAPTION_INPUT_SIZE, CAPTION_PROMPT,
    FAILED_CAPTION, MAX_NEW_TOKENS,
};
pub use image_utils::{decode_image_bytes, is_jpeg_or_png, ImageError, ImageInfo};
pub use model_manager::{load_caption_generator, CaptionModelConfig, DEFAULT_MODEL_ID};
pub use onnx::ExecutionDevice;
