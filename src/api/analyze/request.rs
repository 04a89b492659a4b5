// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};

use crate::api::errors::ApiError;

/// Name of the multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// The uploaded image as received
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied filename; may be empty but the part is always a file
    pub filename: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Read the first `image` file part of a multipart body
///
/// Other fields are skipped, and so is a plain (non-file) field named
/// `image`. A body without an `image` file part is
/// [`ApiError::NoImageProvided`]; a failure while reading the stream is
/// an internal error that keeps the parser's reason.
pub async fn read_image_upload(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // Only file parts count as uploads
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field.bytes().await.map_err(read_error)?;

        return Ok(ImageUpload {
            filename: Some(filename),
            bytes,
        });
    }

    Err(ApiError::NoImageProvided)
}

fn read_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Internal(format!("Upload exceeds the size limit: {}", err.body_text()))
    } else {
        ApiError::Internal(err.body_text())
    }
}
