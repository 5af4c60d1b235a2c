//! Features Module - Feature Extraction Engine
//!
//! Splits extraction into feature groups (structure, reputation, page
//! content, network) that each fill a partial vector.

pub mod layout;
pub mod vector;
pub mod structure;
pub mod reputation;
pub mod network;
pub mod content;
pub mod extractor;


// Re-export common types
pub use layout::{Feature, FEATURE_COUNT, FEATURE_LAYOUT};
pub use vector::{FeatureExtractor, FeatureVector, PartialVector};
pub use extractor::UrlFeatureExtractor;
pub use network::{
    DnsResolver, FetchConfig, FetchError, FetchedPage, HttpFetcher, OfflineFetcher,
    OfflineResolver, PageFetcher, SystemResolver,
};
pub use reputation::{HeuristicReputation, ReputationProvider};
