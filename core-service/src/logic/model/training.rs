//! Training Pipeline
//!
//! Synthetic dataset -> shuffled 80/20 split -> forest fit -> held-out
//! evaluation.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAMPLES, DEFAULT_SEED};
use crate::logic::dataset::{self, Label, TrainingDataset};
use crate::logic::features::FEATURE_COUNT;
use super::forest::{ForestConfig, ModelError, RandomForest};

/// Share of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub samples: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            forest: ForestConfig::default(),
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation of a freshly trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub legitimate: ClassMetrics,
    pub malicious: ClassMetrics,
    pub train_size: usize,
    pub test_size: usize,
    pub trained_at: DateTime<Utc>,
}

impl std::fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1", "support")?;
        for (name, m) in [("legitimate", &self.legitimate), ("malicious", &self.malicious)] {
            writeln!(
                f,
                "{:>12} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(
            f,
            "accuracy {:.4} (train {}, test {})",
            self.accuracy, self.train_size, self.test_size
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Shuffle row indices and split into (train, test)
///
/// The test partition is the first `ceil(n * test_fraction)` shuffled rows.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((n as f64) * test_fraction).ceil() as usize;
    let test_size = test_size.min(n);
    let train = indices.split_off(test_size);
    (train, indices)
}

fn metrics(tp: usize, fp: usize, fn_: usize, support: usize) -> ClassMetrics {
    let ratio = |a: usize, b: usize| if b == 0 { 0.0 } else { a as f64 / b as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics { precision, recall, f1, support }
}

/// Score `forest` on the given rows
pub fn evaluate(
    forest: &RandomForest,
    x: &[[f64; FEATURE_COUNT]],
    y: &[usize],
) -> Result<(f64, ClassMetrics, ClassMetrics), ModelError> {
    let mut confusion = [[0usize; 2]; 2];
    for (row, truth) in x.iter().zip(y) {
        let predicted = forest.predict(row)?;
        confusion[*truth][predicted] += 1;
    }

    let total = y.len();
    let correct = confusion[0][0] + confusion[1][1];
    let accuracy = if total == 0 { 0.0 } else { correct as f64 / total as f64 };

    let legitimate = metrics(
        confusion[0][0],
        confusion[1][0],
        confusion[0][1],
        confusion[0][0] + confusion[0][1],
    );
    let malicious = metrics(
        confusion[1][1],
        confusion[0][1],
        confusion[1][0],
        confusion[1][0] + confusion[1][1],
    );
    Ok((accuracy, legitimate, malicious))
}

/// Fit on the training partition of `data`, evaluate on the rest
pub fn train_on(
    data: &TrainingDataset,
    config: &TrainingConfig,
) -> Result<(RandomForest, TrainingReport), ModelError> {
    let matrix = data.matrix();
    let labels = data.labels();
    let (train_idx, test_idx) = split_indices(data.len(), config.test_fraction, config.seed);

    let pick = |idx: &[usize]| -> (Vec<[f64; FEATURE_COUNT]>, Vec<usize>) {
        (
            idx.iter().map(|i| matrix[*i]).collect(),
            idx.iter().map(|i| labels[*i]).collect(),
        )
    };
    let (x_train, y_train) = pick(&train_idx);
    let (x_test, y_test) = pick(&test_idx);

    let forest = RandomForest::fit(&x_train, &y_train, &config.forest)?;
    let (accuracy, legitimate, malicious) = evaluate(&forest, &x_test, &y_test)?;

    let report = TrainingReport {
        accuracy,
        legitimate,
        malicious,
        train_size: x_train.len(),
        test_size: x_test.len(),
        trained_at: Utc::now(),
    };

    log::info!("Model trained with accuracy: {:.3}", report.accuracy);
    log::debug!("Classification report:\n{}", report);

    Ok((forest, report))
}

/// Generate the synthetic dataset and train on it
pub fn train(config: &TrainingConfig) -> Result<(RandomForest, TrainingReport), ModelError> {
    let data = dataset::generate(config.samples, config.seed);
    log::info!(
        "Training on {} synthetic rows ({} legitimate, {} malicious)",
        data.len(),
        data.count(Label::Legitimate),
        data.count(Label::Malicious)
    );
    train_on(&data, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let (train, test) = split_indices(10_000, 0.2, 42);
        assert_eq!(test.len(), 2000);
        assert_eq!(train.len(), 8000);

        let (train, test) = split_indices(11, 0.2, 42);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_a_partition() {
        let (mut train, test) = split_indices(100, 0.2, 1);
        train.extend(test);
        train.sort_unstable();
        assert_eq!(train, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        assert_eq!(split_indices(50, 0.2, 42), split_indices(50, 0.2, 42));
        assert_ne!(split_indices(50, 0.2, 42), split_indices(50, 0.2, 43));
    }

    #[test]
    fn test_metrics() {
        let m = metrics(8, 2, 2, 10);
        assert!((m.precision - 0.8).abs() < 1e-12);
        assert!((m.recall - 0.8).abs() < 1e-12);
        assert!((m.f1 - 0.8).abs() < 1e-12);
        assert_eq!(metrics(0, 0, 0, 0), ClassMetrics::default());
    }

    #[test]
    fn test_train_quality() {
        let config = TrainingConfig {
            samples: 2000,
            forest: ForestConfig { n_trees: 20, ..ForestConfig::default() },
            ..TrainingConfig::default()
        };
        let (forest, report) = train(&config).unwrap();

        assert_eq!(report.train_size, 1600);
        assert_eq!(report.test_size, 400);
        assert_eq!(report.legitimate.support + report.malicious.support, 400);
        assert!(report.accuracy > 0.9, "accuracy {}", report.accuracy);

        let imp: f64 = forest.feature_importances().iter().sum();
        assert!((imp - 1.0).abs() < 1e-9);
        assert_eq!(forest.feature_importances().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_report_display() {
        let report = TrainingReport {
            accuracy: 0.95,
            legitimate: metrics(5, 0, 0, 5),
            malicious: metrics(5, 0, 0, 5),
            train_size: 40,
            test_size: 10,
            trained_at: Utc::now(),
        };
        let text = report.to_string();
        assert!(text.contains("malicious"));
        assert!(text.contains("accuracy 0.9500"));
    }
}
