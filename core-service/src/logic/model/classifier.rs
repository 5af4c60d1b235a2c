//! Classifier - model lifecycle and inference
//!
//! `Uninitialized -> Initializing -> Ready`. The first caller runs
//! load-or-train behind a `OnceCell`; concurrent callers block on that one
//! run. Inference never fails: without a usable model the fail-safe verdict
//! is returned.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureVector;
use super::forest::RandomForest;
use super::store::{ModelStore, StoredModel};
use super::training::{self, TrainingConfig, TrainingReport};
use super::verdict::Verdict;

// ============================================================================
// STATUS TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelOrigin {
    /// Read from the model store
    Loaded,
    /// Trained by this process
    Trained,
}

/// Classifier status for operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierStatus {
    pub state: ModelState,
    pub model_loaded: bool,
    pub origin: Option<ModelOrigin>,
    pub model_path: String,
    /// SHA-256 of the persisted blob
    pub fingerprint: Option<String>,
    pub trees: usize,
    pub ready_at: Option<DateTime<Utc>>,
    pub report: Option<TrainingReport>,
    pub inference_count: u64,
    pub fail_safe_count: u64,
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug)]
struct ActiveModel {
    forest: RandomForest,
    origin: ModelOrigin,
    report: Option<TrainingReport>,
    fingerprint: Option<String>,
    ready_at: DateTime<Utc>,
}

pub struct Classifier {
    store: ModelStore,
    config: TrainingConfig,
    model: OnceCell<Option<ActiveModel>>,
    state: RwLock<ModelState>,
    inference_count: AtomicU64,
    fail_safe_count: AtomicU64,
}

impl Classifier {
    pub fn new(store: ModelStore, config: TrainingConfig) -> Self {
        Self {
            store,
            config,
            model: OnceCell::new(),
            state: RwLock::new(ModelState::Uninitialized),
            inference_count: AtomicU64::new(0),
            fail_safe_count: AtomicU64::new(0),
        }
    }

    /// Default training setup, store path from the environment
    pub fn from_env() -> Self {
        Self::new(ModelStore::from_env(), TrainingConfig::default())
    }

    /// Already-ready classifier around an in-memory forest
    pub fn with_forest(store: ModelStore, forest: RandomForest) -> Self {
        let classifier = Self::new(store, TrainingConfig::default());
        let _ = classifier.model.set(Some(ActiveModel {
            forest,
            origin: ModelOrigin::Loaded,
            report: None,
            fingerprint: None,
            ready_at: Utc::now(),
        }));
        *classifier.state.write() = ModelState::Ready;
        classifier
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Run load-or-train once; later calls return immediately
    pub fn ensure_ready(&self) -> bool {
        self.active().is_some()
    }

    fn active(&self) -> Option<&ActiveModel> {
        self.model.get_or_init(|| self.initialize()).as_ref()
    }

    fn initialize(&self) -> Option<ActiveModel> {
        *self.state.write() = ModelState::Initializing;

        let loaded = match self.store.load() {
            Ok(Some(stored)) => Some(stored),
            Ok(None) => {
                log::info!("No model at {}, training a new one", self.store.path().display());
                None
            }
            Err(e) => {
                log::warn!("Could not load model ({}), retraining", e);
                None
            }
        };

        let model = match loaded {
            Some(stored) => Some(ActiveModel {
                forest: stored.forest,
                origin: ModelOrigin::Loaded,
                report: stored.report,
                fingerprint: self.fingerprint(),
                ready_at: Utc::now(),
            }),
            None => self.train_and_persist(),
        };

        *self.state.write() = ModelState::Ready;
        model
    }

    fn train_and_persist(&self) -> Option<ActiveModel> {
        let (forest, report) = match training::train(&self.config) {
            Ok(trained) => trained,
            Err(e) => {
                log::error!("Model training failed: {}", e);
                return None;
            }
        };

        let stored = StoredModel::new(forest, Some(report));
        let fingerprint = match self.store.save(&stored) {
            Ok(()) => self.fingerprint(),
            Err(e) => {
                log::warn!("Could not save model ({}), serving in-memory model", e);
                None
            }
        };

        Some(ActiveModel {
            forest: stored.forest,
            origin: ModelOrigin::Trained,
            report: stored.report,
            fingerprint,
            ready_at: Utc::now(),
        })
    }

    fn fingerprint(&self) -> Option<String> {
        match self.store.fingerprint() {
            Ok(fp) => fp,
            Err(e) => {
                log::debug!("Could not fingerprint model: {}", e);
                None
            }
        }
    }

    /// Classify one vector
    pub fn predict(&self, vector: &FeatureVector) -> Verdict {
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        let Some(model) = self.active() else {
            log::error!("Model unavailable, returning fail-safe verdict");
            self.fail_safe_count.fetch_add(1, Ordering::Relaxed);
            return Verdict::fail_safe();
        };

        match model.forest.predict_proba(&vector.to_model_input()) {
            Ok(p) => Verdict::from_probabilities(p, model.forest.feature_importances()),
            Err(e) => {
                log::error!("Inference failed ({}), returning fail-safe verdict", e);
                self.fail_safe_count.fetch_add(1, Ordering::Relaxed);
                Verdict::fail_safe()
            }
        }
    }

    /// Snapshot of lifecycle state and counters; never triggers initialization
    pub fn status(&self) -> ClassifierStatus {
        let model = self.model.get().and_then(|m| m.as_ref());
        ClassifierStatus {
            state: *self.state.read(),
            model_loaded: model.is_some(),
            origin: model.map(|m| m.origin),
            model_path: self.store.path().display().to_string(),
            fingerprint: model.and_then(|m| m.fingerprint.clone()),
            trees: model.map_or(0, |m| m.forest.trees.len()),
            ready_at: model.map(|m| m.ready_at),
            report: model.and_then(|m| m.report.clone()),
            inference_count: self.inference_count.load(Ordering::Relaxed),
            fail_safe_count: self.fail_safe_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::Feature;
    use crate::logic::model::forest::{DecisionNode, DecisionTree, ForestConfig};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            samples: 600,
            forest: ForestConfig { n_trees: 8, ..ForestConfig::default() },
            ..TrainingConfig::default()
        }
    }

    /// One split on a feature index the schema does not have
    fn out_of_schema_forest() -> RandomForest {
        let leaf = |p: f64| DecisionNode {
            feature_index: 0,
            threshold: 0.0,
            left_child: None,
            right_child: None,
            distribution: Some([1.0 - p, p]),
            samples: 1,
            impurity: 0.0,
        };
        let root = DecisionNode {
            feature_index: 45,
            threshold: 0.5,
            left_child: Some(1),
            right_child: Some(2),
            distribution: None,
            samples: 2,
            impurity: 0.5,
        };
        RandomForest {
            config: ForestConfig::default(),
            n_features: 46,
            trees: vec![DecisionTree { nodes: vec![root, leaf(0.0), leaf(1.0)] }],
            importances: vec![1.0 / 46.0; 46],
        }
    }

    #[test]
    fn test_trains_and_persists_when_missing() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));
        let classifier = Classifier::new(store.clone(), quick_config());

        assert_eq!(classifier.status().state, ModelState::Uninitialized);
        assert!(classifier.ensure_ready());

        let status = classifier.status();
        assert_eq!(status.state, ModelState::Ready);
        assert_eq!(status.origin, Some(ModelOrigin::Trained));
        assert_eq!(status.trees, 8);
        assert!(status.report.is_some());
        assert!(status.fingerprint.is_some());
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_loads_persisted_model_with_same_predictions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let first = Classifier::new(ModelStore::new(&path), quick_config());
        let vector = FeatureVector::suspicious();
        let before = first.predict(&vector);

        let second = Classifier::new(ModelStore::new(&path), quick_config());
        let after = second.predict(&vector);

        assert_eq!(second.status().origin, Some(ModelOrigin::Loaded));
        assert_eq!(before, after);
        assert_eq!(first.status().fingerprint, second.status().fingerprint);
    }

    #[test]
    fn test_corrupt_store_retrains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "garbage").unwrap();

        let classifier = Classifier::new(ModelStore::new(&path), quick_config());
        assert!(classifier.ensure_ready());
        assert_eq!(classifier.status().origin, Some(ModelOrigin::Trained));
    }

    #[test]
    fn test_unwritable_store_still_serves() {
        let dir = tempdir().unwrap();
        // parent is a regular file, so the save fails
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let classifier = Classifier::new(ModelStore::new(blocker.join("model.json")), quick_config());

        let verdict = classifier.predict(&FeatureVector::suspicious());
        assert_eq!(verdict.feature_importance.len(), 30);
        assert!(classifier.status().fingerprint.is_none());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let dir = tempdir().unwrap();
        let classifier = Classifier::new(ModelStore::new(dir.path().join("m.json")), quick_config());

        let mut vector = FeatureVector::suspicious();
        vector.set(Feature::Https, 0);
        let a = classifier.predict(&vector);
        let b = classifier.predict(&vector);
        assert_eq!(a, b);

        let sum: f64 = a.feature_importance.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(classifier.status().inference_count, 2);
    }

    #[test]
    fn test_fail_safe_on_out_of_schema_model() {
        let dir = tempdir().unwrap();
        let classifier = Classifier::with_forest(
            ModelStore::new(dir.path().join("unused.json")),
            out_of_schema_forest(),
        );

        let verdict = classifier.predict(&FeatureVector::suspicious());
        assert_eq!(verdict, Verdict::fail_safe());
        assert_eq!(classifier.status().fail_safe_count, 1);
    }

    #[test]
    fn test_concurrent_first_use_initializes_once() {
        let dir = tempdir().unwrap();
        let classifier = Arc::new(Classifier::new(
            ModelStore::new(dir.path().join("model.json")),
            quick_config(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&classifier);
                std::thread::spawn(move || c.predict(&FeatureVector::suspicious()))
            })
            .collect();
        let verdicts: Vec<Verdict> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(verdicts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(classifier.status().inference_count, 4);
        assert_eq!(classifier.status().origin, Some(ModelOrigin::Trained));
    }
}
