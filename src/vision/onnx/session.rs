// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime session construction and device selection

use anyhow::{Context, Result};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Where inference runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionDevice {
    /// CUDA when ONNX Runtime reports it available, CPU otherwise
    #[default]
    Auto,
    Cpu,
    /// CUDA only; loading fails if it cannot be registered
    Cuda,
}

impl FromStr for ExecutionDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!(
                "unknown device '{}', expected one of: auto, cpu, cuda",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutionDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda => f.write_str("cuda"),
        }
    }
}

impl ExecutionDevice {
    /// Resolve `Auto` to the device that will actually be used
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto => {
                if cuda_available() {
                    Self::Cuda
                } else {
                    Self::Cpu
                }
            }
            other => other,
        }
    }

    /// Execution providers to register, in priority order
    pub fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self.resolve() {
            Self::Cuda if self == Self::Cuda => vec![
                CUDAExecutionProvider::default().build().error_on_failure(),
                CPUExecutionProvider::default().build(),
            ],
            Self::Cuda => vec![
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ],
            _ => vec![CPUExecutionProvider::default().build()],
        }
    }
}

fn cuda_available() -> bool {
    match CUDAExecutionProvider::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            warn!("Could not query CUDA availability: {}", e);
            false
        }
    }
}

/// Options shared by every session of one model
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub device: ExecutionDevice,
    pub intra_threads: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device: ExecutionDevice::Auto,
            intra_threads: 4,
        }
    }
}

/// Load an ONNX model file into a session
pub fn build_session(model_path: &Path, options: &SessionOptions, role: &str) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("{} model not found: {}", role, model_path.display());
    }

    info!("Loading {} from {}", role, model_path.display());

    let session = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers(options.device.execution_providers())
        .context("Failed to register execution providers")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(options.intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load {} model from {}",
            role,
            model_path.display()
        ))?;

    let input_names: Vec<_> = session.inputs.iter().map(|i| &i.name).collect();
    debug!("{} inputs: {:?}", role, input_names);

    Ok(session)
}
