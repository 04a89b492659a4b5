// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Caption generator tests through the public API
//!
//! A stub backend stands in for the model so decode, caption and classify
//! can be chained the way a request does.

use image::{DynamicImage, ImageFormat};
use safestreet_vision::{
    classify,
    vision::{decode_image_bytes, CaptionBackend, CaptionGenerator, FAILED_CAPTION},
    DamageType, Priority, Severity,
};
use std::io::Cursor;
use std::sync::Arc;

struct EchoBackend;

impl CaptionBackend for EchoBackend {
    fn generate(&self, _: &DynamicImage, prompt: &str, _: usize) -> anyhow::Result<String> {
        Ok(format!("  {}  ", prompt.to_uppercase()))
    }
}

struct ContextBackend;

impl CaptionBackend for ContextBackend {
    fn generate(&self, _: &DynamicImage, _: &str, _: usize) -> anyhow::Result<String> {
        use anyhow::Context;
        Err(anyhow::anyhow!("shape mismatch")).context("Decoder inference failed")
    }
}

struct FixedBackend(&'static str);

impl CaptionBackend for FixedBackend {
    fn generate(&self, _: &DynamicImage, _: &str, _: usize) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::new_rgba8(width, height)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn test_uppercase_echo_is_degenerate() {
    let generator = CaptionGenerator::new(Arc::new(EchoBackend));
    let caption = generator.caption(&DynamicImage::new_rgb8(10, 10)).unwrap();
    assert_eq!(caption, FAILED_CAPTION);

    let classification = classify(&caption);
    assert_eq!(classification.damage_type, DamageType::Unknown);
    assert_eq!(classification.severity, Severity::Unknown);
    assert_eq!(classification.priority, Priority::Unknown);
}

#[test]
fn test_error_keeps_context_chain() {
    let generator = CaptionGenerator::new(Arc::new(ContextBackend));
    let err = generator.caption(&DynamicImage::new_rgb8(10, 10)).unwrap_err();
    assert_eq!(err.to_string(), "Decoder inference failed: shape mismatch");
}

#[test]
fn test_decode_then_caption_then_classify() {
    let (image, info) = decode_image_bytes(&png_bytes(300, 120)).unwrap();
    assert_eq!((info.width, info.height), (300, 120));
    assert_eq!(info.format, Some(ImageFormat::Png));

    let generator = CaptionGenerator::new(Arc::new(FixedBackend("a blocked road after a landslide")));
    let caption = generator.caption(&image).unwrap();

    assert_eq!(
        classify(&caption).summary(),
        "Roadblock detected. Severity: High. Priority: Critical."
    );
}

#[test]
fn test_unmatched_caption_is_general() {
    let generator = CaptionGenerator::new(Arc::new(FixedBackend("a quiet suburban street")));
    let caption = generator.caption(&DynamicImage::new_rgb8(4, 4)).unwrap();

    assert_eq!(
        classify(&caption).summary(),
        "General damage detected. Severity: Medium. Priority: Moderate."
    );
}
