//! URL Analysis - normalize, extract, classify, bucket
//!
//! The single entry point both front ends call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::{FeatureVector, FetchError, UrlFeatureExtractor};
use crate::logic::model::{Classifier, Verdict};
use crate::logic::risk::{self, RiskLevel};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("URL is required")]
    EmptyUrl,
}

/// Everything reported for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// URL as analyzed, after normalization
    pub url: String,
    pub features: FeatureVector,
    pub prediction: Verdict,
    pub risk_level: RiskLevel,
}

/// Trim and default the scheme to `http://`
pub fn normalize_url(raw: &str) -> Result<String, AnalyzeError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(AnalyzeError::EmptyUrl);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("http://{}", url))
    }
}

pub struct UrlAnalyzer {
    extractor: UrlFeatureExtractor,
    classifier: Arc<Classifier>,
}

impl UrlAnalyzer {
    pub fn new(extractor: UrlFeatureExtractor, classifier: Arc<Classifier>) -> Self {
        Self { extractor, classifier }
    }

    /// Live network access, model store and timeouts from the environment
    pub fn from_env() -> Result<Self, FetchError> {
        Ok(Self::new(
            UrlFeatureExtractor::from_env()?,
            Arc::new(Classifier::from_env()),
        ))
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn analyze(&self, raw: &str) -> Result<AnalysisReport, AnalyzeError> {
        let url = normalize_url(raw)?;
        log::info!("Analyzing URL: {}", url);

        let features = self.extractor.extract(&url);
        log::debug!("Features: {}", features.to_log_entry());

        let prediction = self.classifier.predict(&features);
        let risk_level = risk::bucket(prediction.probability);

        log::info!(
            "{} -> {} (p = {:.3}, {})",
            url,
            prediction.classification,
            prediction.probability,
            risk_level.level
        );

        Ok(AnalysisReport {
            url,
            features,
            prediction,
            risk_level,
        })
    }
}
