//! Model Module - training, persistence and inference
//!
//! `forest` is the learner, `training` the pipeline around it, `store` the
//! on-disk blob and `classifier` the lifecycle that ties them together.

pub mod forest;
pub mod training;
pub mod store;
pub mod verdict;
pub mod classifier;

// Re-export common types
pub use forest::{ForestConfig, ModelError, RandomForest};
pub use training::{TrainingConfig, TrainingReport};
pub use store::{ModelStore, StoreError, StoredModel};
pub use verdict::{Classification, Verdict};
pub use classifier::{Classifier, ClassifierStatus, ModelOrigin, ModelState};
