// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Road damage analysis endpoint module
//!
//! Provides POST /analyze for captioning and classifying an uploaded image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::analyze_handler;
pub use request::{read_image_upload, ImageUpload, IMAGE_FIELD};
pub use response::AnalyzeResponse;
