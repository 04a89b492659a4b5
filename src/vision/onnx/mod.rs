// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime captioning backend
//!
//! Components:
//! - `session` - session construction and device selection
//! - `preprocessing` - image to encoder tensor
//! - `encoder` - vision encoder for image features
//! - `decoder` - greedy text generation from image features
//! - `model` - the combined pipeline

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;
pub mod session;

pub use decoder::TextDecoder;
pub use encoder::VisionEncoder;
pub use model::{CaptionModelFiles, OnnxCaptionModel};
pub use session::{ExecutionDevice, SessionOptions};
