// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /analyze tests
//!
//! Drive the router end to end with stub caption backends.

use super::common::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use image::ImageFormat;
use safestreet_vision::vision::{CAPTION_PROMPT, FAILED_CAPTION, MAX_NEW_TOKENS};

#[tokio::test]
async fn test_missing_image_field_is_bad_request() {
    let state = state_with(StubBackend::new("unused"));
    let body = multipart_body("photo", "road.png", "image/png", &encoded_image(ImageFormat::Png));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"error": "No image provided"})
    );
}

#[tokio::test]
async fn test_non_multipart_body_is_bad_request() {
    let state = state_with(StubBackend::new("unused"));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image": "abc"}"#))
        .unwrap();

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image provided");
}

#[tokio::test]
async fn test_text_field_named_image_is_bad_request() {
    let state = state_with(StubBackend::new("a deep pothole"));
    let body = text_field_body("image", "not a file upload");

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image provided");
}

#[tokio::test]
async fn test_upload_over_body_limit_reports_cause() {
    let state = state_with(StubBackend::new("unused")).with_max_upload_bytes(1024);
    let body = multipart_body("image", "big.png", "image/png", &vec![0u8; 4096]);

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = json_body(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.starts_with("Internal server error: Upload exceeds the size limit"));
}

#[tokio::test]
async fn test_upload_under_body_limit_is_accepted() {
    let image = encoded_image(ImageFormat::Png);
    let limit = image.len() + 1024;
    let state = state_with(StubBackend::new("debris")).with_max_upload_bytes(limit);

    let response = send(state, analyze_request(multipart_body("image", "road.png", "image/png", &image))).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_image_bytes_is_server_error() {
    let state = state_with(StubBackend::new("unused"));
    let body = multipart_body("image", "notes.txt", "text/plain", b"definitely not an image");

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = json_body(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.starts_with("Internal server error: "));
    assert!(error.contains("decode"));
}

#[tokio::test]
async fn test_empty_image_field_is_server_error() {
    let state = state_with(StubBackend::new("unused"));
    let body = multipart_body("image", "empty.png", "image/png", b"");

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_deep_center_pothole_is_urgent() {
    let backend = StubBackend::new("a deep pothole in the center of the road");
    let state = state_with(backend.clone());
    let body = multipart_body("image", "road.png", "image/png", &encoded_image(ImageFormat::Png));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "caption": "a deep pothole in the center of the road",
            "summary": "Pothole detected. Severity: High. Priority: Urgent."
        })
    );

    let seen = backend.seen.lock().unwrap().clone().unwrap();
    assert_eq!((seen.0, seen.1), (512, 512));
    assert_eq!(seen.2, CAPTION_PROMPT);
    assert_eq!(seen.3, MAX_NEW_TOKENS);
}

#[tokio::test]
async fn test_jpeg_upload_with_long_crack() {
    let state = state_with(StubBackend::new("  A long crack across the lane  "));
    let body = multipart_body("image", "road.jpg", "image/jpeg", &encoded_image(ImageFormat::Jpeg));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["caption"], "A long crack across the lane");
    assert_eq!(json["summary"], "Crack detected. Severity: Medium. Priority: Moderate.");
}

#[tokio::test]
async fn test_echoed_prompt_is_unknown() {
    let state = state_with(StubBackend::new(CAPTION_PROMPT));
    let body = multipart_body("image", "road.png", "image/png", &encoded_image(ImageFormat::Png));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["caption"], FAILED_CAPTION);
    assert_eq!(
        json["summary"],
        "Unknown detected. Severity: Unknown. Priority: Unknown."
    );
}

#[tokio::test]
async fn test_generation_failure_is_server_error() {
    let state = state_with(std::sync::Arc::new(FailingBackend("CUDA out of memory")));
    let body = multipart_body("image", "road.png", "image/png", &encoded_image(ImageFormat::Png));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"error": "Internal server error: CUDA out of memory"})
    );
}

#[tokio::test]
async fn test_bmp_accepted_by_default() {
    let state = state_with(StubBackend::new("debris on the shoulder"));
    let body = multipart_body("image", "road.bmp", "image/bmp", &encoded_image(ImageFormat::Bmp));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["summary"],
        "Debris detected. Severity: Low. Priority: Moderate."
    );
}

#[tokio::test]
async fn test_bmp_rejected_with_strict_formats() {
    let state = state_with(StubBackend::new("unused")).with_strict_formats(true);
    let body = multipart_body("image", "road.bmp", "image/bmp", &encoded_image(ImageFormat::Bmp));

    let response = send(state, analyze_request(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Unsupported image format");
}

#[tokio::test]
async fn test_get_analyze_not_allowed() {
    let state = state_with(StubBackend::new("unused"));
    let request = Request::builder()
        .method(Method::GET)
        .uri("/analyze")
        .body(Body::empty())
        .unwrap();

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let state = state_with(StubBackend::new("a collapsed bridge approach"));
    let mut request =
        analyze_request(multipart_body("image", "road.png", "image/png", &encoded_image(ImageFormat::Png)));
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://mobile.example".parse().unwrap());

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
