// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the vision encoder

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Default square input size of the vision encoder
pub const ENCODER_INPUT_SIZE: u32 = 768;

/// ImageNet normalization mean values
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet normalization std values
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Turn an image into an encoder input tensor
///
/// Steps:
/// 1. Stretch to `size` x `size` (aspect ratio is not preserved)
/// 2. Convert to RGB
/// 3. Normalize: (pixel/255 - mean) / std
/// 4. Lay out as NCHW `[1, 3, size, size]`
pub fn preprocess_for_encoder(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = if image.width() == size && image.height() == size {
        image.to_rgb8()
    } else {
        image.resize_exact(size, size, FilterType::Triangle).to_rgb8()
    };

    let side = size as usize;
    Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c]
    })
}
