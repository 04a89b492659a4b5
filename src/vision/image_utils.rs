// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading utilities for uploaded road photographs

use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while turning uploaded bytes into an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to decode image: image data is empty")]
    EmptyData,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Unsupported image format")]
    UnsupportedFormat,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Container format guessed from the content, if recognised
    pub format: Option<ImageFormat>,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes (multipart uploads) into an RGB image
///
/// The container format is guessed from the content, so anything the
/// `image` crate can decode is accepted. The result is always RGB8,
/// whatever the source colour type was.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    let format = reader.format();

    let img = reader
        .decode()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let info = ImageInfo {
        width: rgb.width(),
        height: rgb.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((rgb, info))
}

/// Whether the format is one of the two formats the mobile client uploads
pub fn is_jpeg_or_png(format: Option<ImageFormat>) -> bool {
    matches!(format, Some(ImageFormat::Jpeg) | Some(ImageFormat::Png))
}
