//! urlscan core
//!
//! Scores a URL's maliciousness risk from structural, page-content and
//! reputation heuristics, classified by a random forest trained on a
//! deterministic synthetic dataset.

pub mod constants;
pub mod logic;

pub use logic::analysis::{AnalysisReport, AnalyzeError, UrlAnalyzer};
pub use logic::features::{Feature, FeatureVector, UrlFeatureExtractor};
pub use logic::model::{Classifier, ClassifierStatus, Verdict};
pub use logic::risk::{bucket, RiskLevel};
