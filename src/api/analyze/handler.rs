// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use std::time::Instant;
use tracing::{error, info, warn};

use super::request::{read_image_upload, ImageUpload};
use super::response::AnalyzeResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::severity::classify;
use crate::vision::{decode_image_bytes, is_jpeg_or_png, CaptionGenerator, ImageError};

/// POST /analyze - Caption an uploaded road image and rate the damage
///
/// Expects a multipart body with the image under the `image` field.
pub async fn analyze_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let start = Instant::now();

    let upload = match multipart {
        Ok(multipart) => read_image_upload(multipart).await,
        Err(rejection) => {
            warn!("Rejected non-multipart analyze request: {}", rejection);
            Err(ApiError::NoImageProvided)
        }
    };

    let upload = match upload {
        Ok(upload) => upload,
        Err(ApiError::NoImageProvided) => {
            warn!("Analyze request without an image field");
            return Err(ApiError::NoImageProvided);
        }
        Err(e) => {
            error!("Failed to read upload: {}", e);
            return Err(e);
        }
    };

    info!(
        "Received image {} ({} bytes)",
        upload.filename.as_deref().unwrap_or("<unnamed>"),
        upload.size()
    );

    let captioner = state.captioner.clone();
    let strict_formats = state.strict_formats;
    let caption = tokio::task::spawn_blocking(move || {
        caption_upload(&captioner, &upload, strict_formats)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Analysis task failed: {}", e)))
    .and_then(|result| result);

    let caption = match caption {
        Ok(caption) => caption,
        Err(e) => {
            match e {
                ApiError::Internal(_) => error!("Analysis failed: {}", e),
                _ => warn!("Analysis rejected: {}", e),
            }
            return Err(e);
        }
    };

    let classification = classify(&caption);
    info!(
        "Analyzed in {}ms: {}",
        start.elapsed().as_millis(),
        classification.summary()
    );

    Ok(Json(AnalyzeResponse::new(caption, &classification)))
}

/// Decode the upload and caption it; runs on the blocking pool
fn caption_upload(
    captioner: &CaptionGenerator,
    upload: &ImageUpload,
    strict_formats: bool,
) -> Result<String, ApiError> {
    let (image, info) = decode_image_bytes(&upload.bytes)?;

    if strict_formats && !is_jpeg_or_png(info.format) {
        return Err(ImageError::UnsupportedFormat.into());
    }

    Ok(captioner.caption(&image)?)
}
