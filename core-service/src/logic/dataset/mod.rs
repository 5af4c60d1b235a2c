//! Dataset Module - Synthetic Training Data
//!
//! Generates the labeled training set the classifier learns from. Output is
//! a pure function of `(samples, seed)`: same inputs, same bytes, on every
//! platform.

pub mod priors;
pub mod writer;

#[cfg(test)]
mod tests;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAMPLES, DEFAULT_SEED};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

pub use writer::{write_csv, write_csv_to, DatasetWriteError};

/// Ground-truth class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Legitimate = 0,
    Malicious = 1,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_class(class: usize) -> Self {
        if class == 0 {
            Label::Legitimate
        } else {
            Label::Malicious
        }
    }
}

/// One labeled row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub label: Label,
}

/// Generated rows, legitimate first then malicious
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingDataset {
    pub rows: Vec<TrainingRow>,
    pub seed: u64,
}

impl TrainingDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, label: Label) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    /// Feature matrix in layout order
    pub fn matrix(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.rows.iter().map(|r| r.features.to_model_input()).collect()
    }

    /// Class indices (0 legitimate, 1 malicious)
    pub fn labels(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.label as usize).collect()
    }
}

/// Generate `samples` rows from a ChaCha20 stream seeded with `seed`
///
/// The first `samples / 2` rows are legitimate, the rest malicious. Each
/// row draws its features in layout order, one uniform per feature.
pub fn generate(samples: usize, seed: u64) -> TrainingDataset {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let legitimate = samples / 2;

    let rows = (0..samples)
        .map(|i| {
            let label = if i < legitimate { Label::Legitimate } else { Label::Malicious };
            let table = priors::table(label);
            let mut values = [0u8; FEATURE_COUNT];
            for (slot, distribution) in values.iter_mut().zip(table.iter()) {
                *slot = priors::draw(&mut rng, distribution);
            }
            TrainingRow {
                features: FeatureVector::from_values((i + 1) as u32, values),
                label,
            }
        })
        .collect();

    log::debug!(
        "Generated {} rows ({} legitimate, {} malicious), seed {}",
        samples,
        legitimate,
        samples - legitimate,
        seed
    );

    TrainingDataset { rows, seed }
}

/// The standard training set
pub fn generate_default() -> TrainingDataset {
    generate(DEFAULT_SAMPLES, DEFAULT_SEED)
}
