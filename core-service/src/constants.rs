//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden from the environment.

use std::time::Duration;

/// Default location of the persisted model blob
pub const DEFAULT_MODEL_PATH: &str = "url_classifier_model.json";

/// Page fetch timeout (seconds)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Stats path probe timeout (seconds), per probe
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// DNS lookup timeout (seconds)
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

/// Largest page body read before HTML parsing (bytes)
pub const MAX_PAGE_BYTES: u64 = 4 * 1024 * 1024;

/// Maximum redirects followed by the page fetch
pub const MAX_REDIRECTS: usize = 10;

/// Desktop browser user agent sent with every fetch
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Seed shared by dataset generation, the split shuffle and the forest
pub const DEFAULT_SEED: u64 = 42;

/// Synthetic training rows
pub const DEFAULT_SAMPLES: usize = 10_000;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "urlscan";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("URLSCAN_MODEL_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
}

/// Get page fetch timeout from environment or use default
pub fn get_fetch_timeout() -> Duration {
    let secs = std::env::var("URLSCAN_FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Get probe timeout from environment or use default
pub fn get_probe_timeout() -> Duration {
    let secs = std::env::var("URLSCAN_PROBE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Get DNS lookup timeout from environment or use default
pub fn get_dns_timeout() -> Duration {
    let secs = std::env::var("URLSCAN_DNS_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DNS_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Get user agent from environment or use default
pub fn get_user_agent() -> String {
    std::env::var("URLSCAN_USER_AGENT")
        .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_FETCH_TIMEOUT_SECS, 10);
        assert_eq!(DEFAULT_PROBE_TIMEOUT_SECS, 5);
        assert_eq!(MAX_REDIRECTS, 10);
        assert!(DEFAULT_USER_AGENT.starts_with("Mozilla/5.0"));
    }
}
