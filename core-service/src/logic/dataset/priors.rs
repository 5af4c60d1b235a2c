//! Per-class feature distributions
//!
//! Row `i` of each table is the categorical distribution of feature `i`
//! (layout order). Entries are kept exactly as tuned; changing any of them
//! changes every generated dataset and every trained model.

use rand::Rng;

use crate::logic::features::FEATURE_COUNT;
use super::Label;

/// Distribution of one feature: weight per value, starting at 0
pub type Distribution = &'static [f64];

pub const LEGITIMATE: [Distribution; FEATURE_COUNT] = [
    &[0.98, 0.02],      // UsingIP
    &[0.7, 0.3],        // LongURL
    &[0.99, 0.01],      // ShortURL
    &[0.995, 0.005],    // Symbol@
    &[0.98, 0.02],      // Redirecting//
    &[0.6, 0.4],        // PrefixSuffix-
    &[0.5, 0.4, 0.1],   // SubDomains
    &[0.85, 0.15],      // HTTPS
    &[0.9, 0.1],        // DomainRegLen
    &[0.95, 0.05],      // Favicon
    &[0.98, 0.02],      // NonStdPort
    &[0.9, 0.1],        // HTTPSDomainURL
    &[0.9, 0.1],        // RequestURL
    &[0.85, 0.15],      // AnchorURL
    &[0.9, 0.1],        // LinksInScriptTags
    &[0.98, 0.02],      // ServerFormHandler
    &[0.4, 0.6],        // InfoEmail
    &[0.95, 0.05],      // AbnormalURL
    &[0.98, 0.02],      // WebsiteForwarding
    &[0.99, 0.01],      // StatusBarCust
    &[0.99, 0.01],      // DisableRightClick
    &[0.98, 0.02],      // UsingPopupWindow
    &[0.95, 0.05],      // IframeRedirection
    &[0.9, 0.1],        // AgeofDomain
    &[0.98, 0.02],      // DNSRecording
    &[0.8, 0.2],        // WebsiteTraffic
    &[0.8, 0.2],        // PageRank
    &[0.9, 0.1],        // GoogleIndex
    &[0.75, 0.25],      // LinksPointingToPage
    &[0.7, 0.3],        // StatsReport
];

pub const MALICIOUS: [Distribution; FEATURE_COUNT] = [
    &[0.3, 0.7],        // UsingIP
    &[0.4, 0.6],        // LongURL
    &[0.6, 0.4],        // ShortURL
    &[0.8, 0.2],        // Symbol@
    &[0.7, 0.3],        // Redirecting//
    &[0.4, 0.6],        // PrefixSuffix-
    &[0.2, 0.3, 0.5],   // SubDomains
    &[0.3, 0.7],        // HTTPS
    &[0.2, 0.8],        // DomainRegLen
    &[0.3, 0.7],        // Favicon
    &[0.7, 0.3],        // NonStdPort
    &[0.3, 0.7],        // HTTPSDomainURL
    &[0.2, 0.8],        // RequestURL
    &[0.3, 0.7],        // AnchorURL
    &[0.4, 0.6],        // LinksInScriptTags
    &[0.6, 0.4],        // ServerFormHandler
    &[0.3, 0.7],        // InfoEmail
    &[0.2, 0.8],        // AbnormalURL
    &[0.6, 0.4],        // WebsiteForwarding
    &[0.7, 0.3],        // StatusBarCust
    &[0.7, 0.3],        // DisableRightClick
    &[0.6, 0.4],        // UsingPopupWindow
    &[0.5, 0.5],        // IframeRedirection
    &[0.1, 0.9],        // AgeofDomain
    &[0.6, 0.4],        // DNSRecording
    &[0.2, 0.8],        // WebsiteTraffic
    &[0.2, 0.8],        // PageRank
    &[0.3, 0.7],        // GoogleIndex
    &[0.2, 0.8],        // LinksPointingToPage
    &[0.1, 0.9],        // StatsReport
];

/// Distribution table for a class
pub fn table(label: Label) -> &'static [Distribution; FEATURE_COUNT] {
    match label {
        Label::Legitimate => &LEGITIMATE,
        Label::Malicious => &MALICIOUS,
    }
}

/// Draw one value: first index whose running weight exceeds a uniform draw
pub fn draw<R: Rng + ?Sized>(rng: &mut R, distribution: Distribution) -> u8 {
    let u: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (value, weight) in distribution.iter().enumerate() {
        cumulative += weight;
        if u < cumulative {
            return value as u8;
        }
    }
    // rounding left the total just under 1.0
    distribution.len().saturating_sub(1) as u8
}
