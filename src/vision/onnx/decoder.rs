// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language decoder
//!
//! Generates text from visual features with greedy autoregressive decoding.

use anyhow::{Context, Result};
use ndarray::{s, Array2, Array3, Axis, Ix2, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use super::session::{build_session, SessionOptions};

#[derive(Clone)]
pub struct TextDecoder {
    /// Decoder session (cross-attends to the image features)
    session: Arc<Mutex<Session>>,
    /// Token embedding session (token IDs to input embeddings)
    embed_session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    bos_token_id: u32,
    eos_token_id: u32,
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("bos_token_id", &self.bos_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl TextDecoder {
    /// Load the decoder, its token embedding model and the tokenizer
    pub fn new(
        decoder_path: &Path,
        embed_tokens_path: &Path,
        tokenizer_path: &Path,
        options: &SessionOptions,
    ) -> Result<Self> {
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer not found: {}", tokenizer_path.display());
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        info!(
            "Loaded tokenizer with {} tokens",
            tokenizer.get_vocab_size(true)
        );

        let embed_session = build_session(embed_tokens_path, options, "Token embedding")?;
        let session = build_session(decoder_path, options, "Text decoder")?;

        let bos_token_id = tokenizer
            .token_to_id("<s>")
            .or_else(|| tokenizer.token_to_id("[CLS]"))
            .unwrap_or(0);
        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("[SEP]"))
            .unwrap_or(2);
        debug!("Special tokens - BOS: {}, EOS: {}", bos_token_id, eos_token_id);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            embed_session: Arc::new(Mutex::new(embed_session)),
            tokenizer: Arc::new(tokenizer),
            bos_token_id,
            eos_token_id,
        })
    }

    /// Generate text conditioned on image features and a prompt
    ///
    /// The sequence starts as BOS followed by the prompt tokens and grows one
    /// greedy token at a time until EOS or `max_new_tokens`. The whole
    /// sequence is decoded with special tokens skipped, so a model that adds
    /// nothing returns the prompt itself.
    pub fn generate(
        &self,
        image_features: &Array2<f32>,
        prompt: &str,
        max_new_tokens: usize,
    ) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| anyhow::anyhow!("Failed to encode prompt: {}", e))?;

        let mut tokens = vec![self.bos_token_id];
        tokens.extend(
            encoding
                .get_ids()
                .iter()
                .copied()
                .filter(|&id| id != self.bos_token_id && id != self.eos_token_id),
        );
        let prompt_len = tokens.len();
        debug!("Prompt tokenized to {} tokens", prompt_len);

        let features = image_features.clone().insert_axis(Axis(0));
        let attention_mask = Array2::<i64>::ones((1, features.shape()[1]));

        for step in 0..max_new_tokens {
            let logits = self.forward(&features, &attention_mask, &tokens)?;
            let next = greedy_next_token(&logits, &[self.bos_token_id])
                .ok_or_else(|| anyhow::anyhow!("Decoder returned empty logits"))?;

            if next == self.eos_token_id {
                debug!("EOS after {} generated tokens", step);
                break;
            }
            tokens.push(next);
        }

        if tokens.len() - prompt_len >= max_new_tokens {
            warn!("Generation hit the {} token limit", max_new_tokens);
        }

        let text = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        Ok(text.trim().to_string())
    }

    fn embed_tokens(&self, input_ids: &[u32]) -> Result<Array3<f32>> {
        let ids = Array2::from_shape_vec(
            (1, input_ids.len()),
            input_ids.iter().map(|&id| id as i64).collect(),
        )
        .context("Failed to shape input IDs")?;

        let mut session = self
            .embed_session
            .lock()
            .map_err(|_| anyhow::anyhow!("Token embedding session lock poisoned"))?;

        let ids_value = Value::from_array(ids).context("Failed to create input IDs tensor")?;
        let outputs = session
            .run(ort::inputs!["input_ids" => ids_value])
            .context("Token embedding inference failed")?;

        let embeddings = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract token embeddings")?
            .into_dimensionality::<Ix3>()
            .context("Token embeddings are not 3-dimensional")?
            .to_owned();

        Ok(embeddings)
    }

    /// One decoder pass; returns logits for the last position
    fn forward(
        &self,
        features: &Array3<f32>,
        attention_mask: &Array2<i64>,
        input_ids: &[u32],
    ) -> Result<Vec<f32>> {
        let inputs_embeds = self.embed_tokens(input_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Text decoder session lock poisoned"))?;

        let features_value = Value::from_array(features.to_owned())
            .context("Failed to create encoder hidden states tensor")?;
        let mask_value = Value::from_array(attention_mask.to_owned())
            .context("Failed to create encoder attention mask tensor")?;
        let embeds_value =
            Value::from_array(inputs_embeds).context("Failed to create inputs_embeds tensor")?;

        let outputs = session
            .run(ort::inputs![
                "encoder_hidden_states" => features_value,
                "encoder_attention_mask" => mask_value,
                "inputs_embeds" => embeds_value
            ])
            .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract decoder logits")?;

        match logits.ndim() {
            3 => {
                let logits = logits
                    .into_dimensionality::<Ix3>()
                    .context("Decoder logits are not 3-dimensional")?;
                let last = logits.shape()[1].saturating_sub(1);
                Ok(logits.slice(s![0, last, ..]).to_vec())
            }
            2 => {
                let logits = logits
                    .into_dimensionality::<Ix2>()
                    .context("Decoder logits are not 2-dimensional")?;
                let last = logits.shape()[0].saturating_sub(1);
                Ok(logits.slice(s![last, ..]).to_vec())
            }
            _ => anyhow::bail!("Unexpected decoder output shape: {:?}", logits.shape()),
        }
    }
}

/// Index of the highest logit, skipping `banned` token IDs and NaNs
pub(crate) fn greedy_next_token(logits: &[f32], banned: &[u32]) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .filter(|(idx, value)| !value.is_nan() && !banned.contains(&(*idx as u32)))
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx as u32)
}
