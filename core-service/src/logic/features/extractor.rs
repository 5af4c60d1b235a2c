//! URL Feature Extractor
//!
//! Runs every feature group against a URL and resolves the result into a
//! complete vector. Never fails: an unparseable URL yields the fully
//! suspicious vector, an unreachable page leaves content slots to the
//! default table.

use std::sync::Arc;

use super::content::ContentFeatures;
use super::network::{
    DnsResolver, FetchConfig, FetchError, HttpFetcher, NetworkFeatures, OfflineFetcher,
    OfflineResolver, PageFetcher, SystemResolver,
};
use super::reputation::{HeuristicReputation, ReputationFeatures, ReputationProvider};
use super::structure::{StructuralFeatures, UrlTarget};
use super::vector::{FeatureExtractor, FeatureVector, PartialVector};

/// Extractor with injectable network and reputation capabilities
#[derive(Clone)]
pub struct UrlFeatureExtractor {
    fetcher: Arc<dyn PageFetcher>,
    resolver: Arc<dyn DnsResolver>,
    reputation: Arc<dyn ReputationProvider>,
}

impl UrlFeatureExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<dyn DnsResolver>,
        reputation: Arc<dyn ReputationProvider>,
    ) -> Self {
        Self { fetcher, resolver, reputation }
    }

    /// Live HTTP and system DNS, configured from the environment
    pub fn from_env() -> Result<Self, FetchError> {
        let config = FetchConfig::from_env();
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(SystemResolver::new(config.dns_timeout)),
            Arc::new(HeuristicReputation),
        ))
    }

    /// No network access at all; content and DNS features take defaults
    pub fn offline() -> Self {
        Self::new(
            Arc::new(OfflineFetcher),
            Arc::new(OfflineResolver),
            Arc::new(HeuristicReputation),
        )
    }

    pub fn extract(&self, url: &str) -> FeatureVector {
        let target = match UrlTarget::parse(url) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("Could not parse {:?} ({}), using suspicious defaults", url, e);
                return FeatureVector::suspicious();
            }
        };

        let mut partial = PartialVector::new();
        StructuralFeatures.extract(&target, &mut partial);
        ReputationFeatures::new(self.reputation.as_ref()).extract(&target, &mut partial);

        match self.fetcher.fetch(target.url()) {
            Ok(page) => ContentFeatures::new(&target).extract(&page, &mut partial),
            Err(e) => log::warn!("Could not fetch webpage content for {}: {}", url, e),
        }

        NetworkFeatures::new(self.resolver.as_ref(), self.fetcher.as_ref())
            .extract(&target, &mut partial);

        let missing = partial.missing();
        if !missing.is_empty() {
            log::debug!("{} features defaulted for {}: {:?}", missing.len(), url, missing);
        }

        partial.fill_defaults()
    }
}
