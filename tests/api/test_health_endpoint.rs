// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health tests

use super::common::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use safestreet_vision::version::VERSION;

#[tokio::test]
async fn test_health_reports_model_and_version() {
    let state = state_with(StubBackend::new("unused"));
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "ok", "version": VERSION, "model": "stub-model"})
    );
}

#[tokio::test]
async fn test_cors_preflight() {
    let state = state_with(StubBackend::new("unused"));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/analyze")
        .header(header::ORIGIN, "http://mobile.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = state_with(StubBackend::new("unused"));
    let request = Request::builder()
        .uri("/v1/models")
        .body(Body::empty())
        .unwrap();

    let response = send(state, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
