// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze response types

use serde::{Deserialize, Serialize};

use crate::severity::Classification;

/// Successful analysis result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzeResponse {
    /// Generated caption, or the failure sentinel
    pub caption: String,
    /// Formatted classification summary
    pub summary: String,
}

impl AnalyzeResponse {
    pub fn new(caption: String, classification: &Classification) -> Self {
        Self {
            caption,
            summary: classification.summary(),
        }
    }
}
