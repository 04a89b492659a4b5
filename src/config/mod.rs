// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration from command-line flags and environment variables

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::api::DEFAULT_MAX_UPLOAD_BYTES;
use crate::vision::{CaptionModelConfig, ExecutionDevice, DEFAULT_MODEL_ID};

/// SafeStreet road damage analysis server
#[derive(Parser, Debug, Clone)]
#[command(name = "safestreet-vision")]
#[command(version)]
#[command(about = "HTTP service that captions road images and rates the damage", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "SAFESTREET_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: SocketAddr,

    /// Local directory with the ONNX model files (skips the hub download)
    #[arg(long, env = "SAFESTREET_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Pretrained model id on the HuggingFace hub
    #[arg(long, env = "SAFESTREET_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Inference device: auto, cpu or cuda
    #[arg(long, env = "SAFESTREET_DEVICE", default_value = "auto")]
    pub device: ExecutionDevice,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "SAFESTREET_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Only accept JPEG and PNG uploads
    #[arg(long, env = "SAFESTREET_STRICT_FORMATS")]
    pub strict_formats: bool,

    /// Intra-op threads per ONNX Runtime session
    #[arg(long, env = "SAFESTREET_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServerConfig {
    pub fn caption_model_config(&self) -> CaptionModelConfig {
        CaptionModelConfig {
            model_dir: self.model_dir.clone(),
            model_id: self.model_id.clone(),
            device: self.device,
            intra_threads: self.intra_threads,
            ..Default::default()
        }
    }
}
