// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Keyword-based severity classification of road damage captions
//!
//! Maps a free-text caption to a (damage type, severity, priority) triple
//! through an ordered decision table. The first matching rule wins:
//!
//! 1. "pothole"  - severity High if "deep", priority Urgent if "center"
//! 2. "crack"    - severity Medium if "long", priority Moderate
//! 3. "debris"   - Low / Moderate
//! 4. "blocked" or "collapsed" - High / Critical
//! 5. the failed-caption sentinel (exact match) - Unknown / Unknown
//! 6. anything else - Medium / Moderate
//!
//! Label strings are part of the response contract and must not change.

use std::fmt;

use crate::vision::caption::FAILED_CAPTION;

/// Kind of damage reported for a caption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageType {
    Pothole,
    Crack,
    Debris,
    Roadblock,
    Unknown,
    General,
}

impl DamageType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pothole => "Pothole detected",
            Self::Crack => "Crack detected",
            Self::Debris => "Debris detected",
            Self::Roadblock => "Roadblock detected",
            Self::Unknown => "Unknown detected",
            Self::General => "General damage detected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Moderate,
    Urgent,
    Critical,
    Unknown,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Urgent => "Urgent",
            Self::Critical => "Critical",
            Self::Unknown => "Unknown",
        }
    }
}

macro_rules! label_impls {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

label_impls!(DamageType, Severity, Priority);

/// Result of classifying a caption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub damage_type: DamageType,
    pub severity: Severity,
    pub priority: Priority,
}

impl Classification {
    pub fn new(damage_type: DamageType, severity: Severity, priority: Priority) -> Self {
        Self {
            damage_type,
            severity,
            priority,
        }
    }

    /// Human-readable one-line summary, e.g.
    /// "Pothole detected. Severity: High. Priority: Urgent."
    pub fn summary(&self) -> String {
        format!(
            "{}. Severity: {}. Priority: {}.",
            self.damage_type, self.severity, self.priority
        )
    }

    /// The triple as its label strings
    pub fn as_labels(&self) -> (&'static str, &'static str, &'static str) {
        (
            self.damage_type.label(),
            self.severity.label(),
            self.priority.label(),
        )
    }
}

/// Classify a caption. Total and deterministic: every input yields a triple.
pub fn classify(caption: &str) -> Classification {
    let lower = caption.to_lowercase();

    if lower.contains("pothole") {
        let severity = if lower.contains("deep") {
            Severity::High
        } else {
            Severity::Low
        };
        let priority = if lower.contains("center") {
            Priority::Urgent
        } else {
            Priority::Low
        };
        Classification::new(DamageType::Pothole, severity, priority)
    } else if lower.contains("crack") {
        let severity = if lower.contains("long") {
            Severity::Medium
        } else {
            Severity::Low
        };
        Classification::new(DamageType::Crack, severity, Priority::Moderate)
    } else if lower.contains("debris") {
        Classification::new(DamageType::Debris, Severity::Low, Priority::Moderate)
    } else if lower.contains("blocked") || lower.contains("collapsed") {
        Classification::new(DamageType::Roadblock, Severity::High, Priority::Critical)
    } else if caption == FAILED_CAPTION {
        Classification::new(DamageType::Unknown, Severity::Unknown, Priority::Unknown)
    } else {
        Classification::new(DamageType::General, Severity::Medium, Priority::Moderate)
    }
}
