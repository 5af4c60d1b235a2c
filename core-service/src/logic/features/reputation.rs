//! Domain Reputation Stand-ins
//!
//! Registration length, domain age, traffic, page rank, index presence and
//! backlinks are approximated from the host's shape. The provider is a
//! trait so a real intelligence source can be swapped in.

use super::layout::Feature;
use super::structure::UrlTarget;
use super::vector::{FeatureExtractor, PartialVector};

/// Popular site names; any host containing one is treated as reputable
pub const WELL_KNOWN_SITES: &[&str] = &[
    "google", "facebook", "amazon", "microsoft", "apple", "youtube",
    "twitter", "instagram", "linkedin", "github", "stackoverflow",
    "reddit", "wikipedia", "replit", "codepen", "netlify", "vercel",
];

const REGISTRATION_TLDS: &[&str] = &["com", "org", "net", "edu", "gov", "mil"];
const INSTITUTIONAL: &[&str] = &["edu", "gov", "mil"];
const AGED_TLDS: &[&str] = &["com", "org", "net"];
const INDEXED_TLDS: &[&str] = &["com", "org", "net", "edu", "gov"];
const BACKLINK_MARKERS: &[&str] = &["edu", "gov", "org"];

/// Substring match against [`WELL_KNOWN_SITES`]
pub fn is_well_known(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    WELL_KNOWN_SITES.iter().any(|site| host.contains(site))
}

/// Source of domain reputation signals
///
/// Each method returns 0 for reputable, 1 for suspicious, `None` when the
/// signal cannot be computed for this host.
pub trait ReputationProvider: Send + Sync {
    fn domain_registration_length(&self, host: &str) -> Option<u8>;
    fn age_of_domain(&self, host: &str) -> Option<u8>;
    fn website_traffic(&self, host: &str) -> Option<u8>;
    fn page_rank(&self, host: &str) -> Option<u8>;
    fn google_index(&self, host: &str) -> Option<u8>;
    fn links_pointing_to_page(&self, host: &str) -> Option<u8>;
}

/// Shape-based reputation, no network access
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicReputation;

fn reputable_if(condition: bool) -> Option<u8> {
    Some(if condition { 0 } else { 1 })
}

impl ReputationProvider for HeuristicReputation {
    fn domain_registration_length(&self, host: &str) -> Option<u8> {
        let labels: Vec<&str> = host.split('.').collect();
        reputable_if(
            is_well_known(host)
                || (labels.len() == 2
                    && REGISTRATION_TLDS.contains(&labels[1])
                    && labels[0].len() > 3),
        )
    }

    fn age_of_domain(&self, host: &str) -> Option<u8> {
        if is_well_known(host) {
            return Some(0);
        }
        let labels: Vec<&str> = host.split('.').collect();
        // single-label hosts have no second label to judge
        let second = labels.get(1)?;
        reputable_if(
            INSTITUTIONAL.contains(second)
                || (labels.len() == 2
                    && labels[0].len() > 4
                    && AGED_TLDS.contains(second)
                    && !host.contains('-')),
        )
    }

    fn website_traffic(&self, host: &str) -> Option<u8> {
        let labels: Vec<&str> = host.split('.').collect();
        reputable_if(
            is_well_known(host)
                || (labels.len() == 2 && labels[0].len() > 3 && !host.contains('-')),
        )
    }

    fn page_rank(&self, host: &str) -> Option<u8> {
        let labels: Vec<&str> = host.split('.').collect();
        reputable_if(
            is_well_known(host)
                || (labels.len() <= 2 && !host.contains('-') && labels[0].len() > 3),
        )
    }

    fn google_index(&self, host: &str) -> Option<u8> {
        let labels: Vec<&str> = host.split('.').collect();
        reputable_if(
            is_well_known(host)
                || (labels.len() == 2
                    && labels[0].len() > 2
                    && INDEXED_TLDS.contains(&labels[1])),
        )
    }

    fn links_pointing_to_page(&self, host: &str) -> Option<u8> {
        reputable_if(BACKLINK_MARKERS.iter().any(|m| host.contains(m)))
    }
}

/// Reputation feature group backed by a provider
pub struct ReputationFeatures<'a> {
    provider: &'a dyn ReputationProvider,
}

impl<'a> ReputationFeatures<'a> {
    pub fn new(provider: &'a dyn ReputationProvider) -> Self {
        Self { provider }
    }
}

impl FeatureExtractor<UrlTarget> for ReputationFeatures<'_> {
    fn extract(&self, target: &UrlTarget, partial: &mut PartialVector) {
        let host = target.host();
        let p = self.provider;

        partial.set(Feature::DomainRegLen, p.domain_registration_length(host));
        partial.set(Feature::AgeOfDomain, p.age_of_domain(host));
        partial.set(Feature::WebsiteTraffic, p.website_traffic(host));
        partial.set(Feature::PageRank, p.page_rank(host));
        partial.set(Feature::GoogleIndex, p.google_index(host));
        partial.set(Feature::LinksPointingToPage, p.links_pointing_to_page(host));
    }
}
