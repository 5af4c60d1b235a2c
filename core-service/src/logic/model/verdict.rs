//! Verdict Types
//!
//! Output of a single classification. Data structures only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logic::features::FEATURE_LAYOUT;
use super::forest::{argmax, N_CLASSES};

/// Probability reported when no model answer is available
pub const FAIL_SAFE_PROBABILITY: f64 = 0.8;

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Legitimate,
    Malicious,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Legitimate => "Legitimate",
            Classification::Malicious => "Malicious",
        }
    }

    pub fn from_prediction(prediction: u8) -> Self {
        if prediction == 1 {
            Classification::Malicious
        } else {
            Classification::Legitimate
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// 1 malicious, 0 legitimate
    pub prediction: u8,
    /// P(malicious)
    pub probability: f64,
    /// Probability of the predicted class
    pub confidence: f64,
    pub classification: Classification,
    /// Feature name -> global importance; empty in the fail-safe verdict
    pub feature_importance: BTreeMap<String, f64>,
}

impl Verdict {
    /// Verdict returned when the model is unavailable or inference fails
    pub fn fail_safe() -> Self {
        Self {
            prediction: 1,
            probability: FAIL_SAFE_PROBABILITY,
            confidence: FAIL_SAFE_PROBABILITY,
            classification: Classification::Malicious,
            feature_importance: BTreeMap::new(),
        }
    }

    /// Build from class probabilities and per-feature importances
    pub fn from_probabilities(p: [f64; N_CLASSES], importances: &[f64]) -> Self {
        let prediction = argmax(&p) as u8;
        let feature_importance = FEATURE_LAYOUT
            .iter()
            .zip(importances.iter())
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect();

        Self {
            prediction,
            probability: p[1],
            confidence: p[0].max(p[1]),
            classification: Classification::from_prediction(prediction),
            feature_importance,
        }
    }
}
