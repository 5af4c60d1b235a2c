//! URL Structure Features
//!
//! Features computed from the URL text and its parsed form alone:
//! UsingIP, LongURL, ShortURL, Symbol@, Redirecting//, PrefixSuffix-,
//! SubDomains, HTTPS, NonStdPort.

use thiserror::Error;
use url::{Host, Url};

use super::layout::Feature;
use super::vector::{FeatureExtractor, PartialVector};

// ============================================================================
// CONSTANTS
// ============================================================================

/// URLs longer than this are flagged
pub const LONG_URL_THRESHOLD: usize = 75;

/// Known URL shortening services, matched exactly or as a parent domain
pub const SHORTENING_SERVICES: &[&str] = &[
    "bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly", "is.gd",
    "buff.ly", "adf.ly", "short.link", "tiny.cc", "lnkd.in",
    "youtu.be", "amzn.to", "fb.me", "po.st", "tinycc.com",
    "shorte.st", "linktr.ee",
];

/// Explicit ports that are not flagged
const STANDARD_PORTS: [u16; 2] = [80, 443];

// ============================================================================
// PARSED TARGET
// ============================================================================

/// Why a URL could not be turned into a target
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid URL: {0}")]
    Invalid(#[from] url::ParseError),

    #[error("URL has no host")]
    MissingHost,
}

/// A parsed URL plus the exact text it came from
#[derive(Debug, Clone)]
pub struct UrlTarget {
    raw: String,
    url: Url,
    host: String,
}

impl UrlTarget {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let url = Url::parse(raw)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(TargetError::MissingHost)?
            .to_ascii_lowercase();

        Ok(Self {
            raw: raw.to_string(),
            url,
            host,
        })
    }

    /// URL text as submitted
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Lowercased host, without userinfo or port
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host plus the explicit port, if any
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Host split on dots
    pub fn labels(&self) -> Vec<&str> {
        self.host.split('.').collect()
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_)))
    }
}

// ============================================================================
// HEURISTICS
// ============================================================================

/// Host equals a shortener or is a subdomain of one
pub fn is_shortener(host: &str) -> bool {
    SHORTENING_SERVICES.iter().any(|service| {
        host == *service
            || host
                .strip_suffix(service)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// 0 for at most two labels, 1 for three, 2 beyond
pub fn subdomain_level(host: &str) -> u8 {
    match host.split('.').count() {
        0..=2 => 0,
        3 => 1,
        _ => 2,
    }
}

fn flag(condition: bool) -> Option<u8> {
    Some(u8::from(condition))
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Structural feature group
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralFeatures;

impl FeatureExtractor<UrlTarget> for StructuralFeatures {
    fn extract(&self, target: &UrlTarget, partial: &mut PartialVector) {
        let raw = target.raw();
        let host = target.host();

        partial.set(Feature::UsingIp, flag(target.is_ipv4()));
        partial.set(Feature::LongUrl, flag(raw.chars().count() > LONG_URL_THRESHOLD));
        partial.set(Feature::ShortUrl, flag(is_shortener(host)));
        partial.set(Feature::SymbolAt, flag(raw.contains('@')));
        partial.set(Feature::Redirecting, flag(raw.matches("//").count() > 1));
        partial.set(Feature::PrefixSuffix, flag(host.contains('-')));
        partial.set(Feature::SubDomains, Some(subdomain_level(host)));
        partial.set(Feature::Https, flag(target.url().scheme() != "https"));
        partial.set(
            Feature::NonStdPort,
            flag(target.url().port().is_some_and(|p| !STANDARD_PORTS.contains(&p))),
        );
    }
}
