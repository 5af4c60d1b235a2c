//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema.**
//!
//! The order of [`Feature`] is the order of every vector handed to the
//! classifier, every generated training row and every persisted model.
//! Reordering or inserting a variant silently invalidates stored models.

use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Total number of features
pub const FEATURE_COUNT: usize = 30;

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    // === URL structure (0-7) ===
    "UsingIP",              // 0: host is a literal IPv4 address
    "LongURL",              // 1: URL longer than 75 chars
    "ShortURL",             // 2: known shortening service
    "Symbol@",              // 3: '@' anywhere in the URL
    "Redirecting//",        // 4: more than one '//'
    "PrefixSuffix-",        // 5: dash in host
    "SubDomains",           // 6: 0 / 1 / 2+ subdomains
    "HTTPS",                // 7: 1 = NOT https

    // === Registration stand-in (8) ===
    "DomainRegLen",         // 8

    // === Page content (9-22, except 10) ===
    "Favicon",              // 9: favicon served from another host
    "NonStdPort",           // 10: explicit port outside 80/443
    "HTTPSDomainURL",       // 11: https share of absolute links <= 0.5
    "RequestURL",           // 12: cross-host resources > 25%
    "AnchorURL",            // 13: cross-host anchors > 31%
    "LinksInScriptTags",    // 14: cross-host scripts > 17%
    "ServerFormHandler",    // 15: form posts to another host
    "InfoEmail",            // 16: 1 = NO email address on page
    "AbnormalURL",          // 17: anomalous host shape
    "WebsiteForwarding",    // 18: final host differs after redirects
    "StatusBarCust",        // 19
    "DisableRightClick",    // 20
    "UsingPopupWindow",     // 21
    "IframeRedirection",    // 22

    // === Domain reputation (23-29) ===
    "AgeofDomain",          // 23
    "DNSRecording",         // 24: no A record
    "WebsiteTraffic",       // 25
    "PageRank",             // 26
    "GoogleIndex",          // 27
    "LinksPointingToPage",  // 28
    "StatsReport",          // 29: no public stats page
];

/// Name of the record index column carried next to the features
pub const INDEX_KEY: &str = "Index";

/// Closed set of feature identifiers, discriminant == position in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    UsingIp = 0,
    LongUrl,
    ShortUrl,
    SymbolAt,
    Redirecting,
    PrefixSuffix,
    SubDomains,
    Https,
    DomainRegLen,
    Favicon,
    NonStdPort,
    HttpsDomainUrl,
    RequestUrl,
    AnchorUrl,
    LinksInScriptTags,
    ServerFormHandler,
    InfoEmail,
    AbnormalUrl,
    WebsiteForwarding,
    StatusBarCust,
    DisableRightClick,
    UsingPopupWindow,
    IframeRedirection,
    AgeOfDomain,
    DnsRecording,
    WebsiteTraffic,
    PageRank,
    GoogleIndex,
    LinksPointingToPage,
    StatsReport,
}

impl Feature {
    /// Every feature, in layout order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::UsingIp,
        Feature::LongUrl,
        Feature::ShortUrl,
        Feature::SymbolAt,
        Feature::Redirecting,
        Feature::PrefixSuffix,
        Feature::SubDomains,
        Feature::Https,
        Feature::DomainRegLen,
        Feature::Favicon,
        Feature::NonStdPort,
        Feature::HttpsDomainUrl,
        Feature::RequestUrl,
        Feature::AnchorUrl,
        Feature::LinksInScriptTags,
        Feature::ServerFormHandler,
        Feature::InfoEmail,
        Feature::AbnormalUrl,
        Feature::WebsiteForwarding,
        Feature::StatusBarCust,
        Feature::DisableRightClick,
        Feature::UsingPopupWindow,
        Feature::IframeRedirection,
        Feature::AgeOfDomain,
        Feature::DnsRecording,
        Feature::WebsiteTraffic,
        Feature::PageRank,
        Feature::GoogleIndex,
        Feature::LinksPointingToPage,
        Feature::StatsReport,
    ];

    /// Features that can only be computed from fetched page content
    pub const CONTENT: [Feature; 13] = [
        Feature::Favicon,
        Feature::HttpsDomainUrl,
        Feature::RequestUrl,
        Feature::AnchorUrl,
        Feature::LinksInScriptTags,
        Feature::ServerFormHandler,
        Feature::InfoEmail,
        Feature::AbnormalUrl,
        Feature::WebsiteForwarding,
        Feature::StatusBarCust,
        Feature::DisableRightClick,
        Feature::UsingPopupWindow,
        Feature::IframeRedirection,
    ];

    /// Position in the vector
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in JSON, CSV and importance maps
    pub const fn name(self) -> &'static str {
        FEATURE_LAYOUT[self as usize]
    }

    /// Largest legal value; every domain starts at 0
    pub const fn max_value(self) -> u8 {
        match self {
            Feature::SubDomains => 2,
            _ => 1,
        }
    }

    /// Value used when the whole extraction is abandoned
    pub const fn suspicious_default(self) -> u8 {
        self.max_value()
    }

    /// Value used when this single heuristic could not be computed
    ///
    /// Same as [`Feature::suspicious_default`] except `WebsiteForwarding`:
    /// without a response there was no observed forwarding.
    pub const fn unavailable_default(self) -> u8 {
        match self {
            Feature::WebsiteForwarding => 0,
            _ => self.suspicious_default(),
        }
    }

    /// Look up a feature by its column name
    pub fn from_name(name: &str) -> Option<Feature> {
        feature_index(name).map(|i| Feature::ALL[i])
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
