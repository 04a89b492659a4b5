// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision encoder
//!
//! Extracts visual features from a preprocessed image for the decoder.

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayViewD, Axis, Ix2, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::session::{build_session, SessionOptions};

#[derive(Clone)]
pub struct VisionEncoder {
    /// ONNX Runtime session, one run at a time
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for VisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionEncoder")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl VisionEncoder {
    /// Load the vision encoder from an ONNX file
    pub fn new(model_path: &Path, options: &SessionOptions) -> Result<Self> {
        let session = build_session(model_path, options, "Vision encoder")?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Encode a `[1, 3, H, W]` tensor into `[seq_len, embedding_dim]` features
    pub fn encode(&self, input: &ndarray::Array4<f32>) -> Result<Array2<f32>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Vision encoder session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output")?;
        debug!("Encoder output shape: {:?}", output.shape());

        flatten_batch(output)
    }
}

/// Drop the batch axis of an encoder output
///
/// Accepts `[1, seq_len, dim]` or `[seq_len, dim]`.
pub(crate) fn flatten_batch(output: ArrayViewD<'_, f32>) -> Result<Array2<f32>> {
    match output.ndim() {
        3 => {
            let view = output
                .into_dimensionality::<Ix3>()
                .context("Encoder output is not 3-dimensional")?;
            Ok(view.index_axis(Axis(0), 0).to_owned())
        }
        2 => {
            let view = output
                .into_dimensionality::<Ix2>()
                .context("Encoder output is not 2-dimensional")?;
            Ok(view.to_owned())
        }
        _ => anyhow::bail!("Unexpected encoder output shape: {:?}", output.shape()),
    }
}
