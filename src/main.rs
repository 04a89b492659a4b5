// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use safestreet_vision::{
    api::{start_server, AppState},
    config::ServerConfig,
    version,
    vision::load_caption_generator,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so its values feed the env fallbacks
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    tracing::info!("Starting {}", version::get_version_string());

    let model_config = config.caption_model_config();
    let captioner = load_caption_generator(&model_config)
        .await
        .context("Failed to load caption model")?;
    tracing::info!("Caption model ready: {}", captioner.model_name());

    let state = AppState::new(captioner)
        .with_strict_formats(config.strict_formats)
        .with_max_upload_bytes(config.max_upload_bytes);

    start_server(config.addr, state).await
}
