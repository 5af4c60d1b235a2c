//! Risk Module
//!
//! Maps the malicious probability of a verdict onto five human-readable
//! tiers. Pure function, nothing is persisted.
//!
//! ## Structure
//! - `types`: RiskTier, RiskLevel
//! - `rules`: tier thresholds

pub mod types;
pub mod rules;

pub use types::{RiskLevel, RiskTier};
use rules::{HIGH_THRESHOLD, LOW_MEDIUM_THRESHOLD, MEDIUM_HIGH_THRESHOLD, MEDIUM_THRESHOLD};

/// Tier for a probability, thresholds tested top-down with `>=`
///
/// NaN compares false everywhere and lands in `Low`.
pub fn tier(probability: f64) -> RiskTier {
    if probability >= HIGH_THRESHOLD {
        RiskTier::High
    } else if probability >= MEDIUM_HIGH_THRESHOLD {
        RiskTier::MediumHigh
    } else if probability >= MEDIUM_THRESHOLD {
        RiskTier::Medium
    } else if probability >= LOW_MEDIUM_THRESHOLD {
        RiskTier::LowMedium
    } else {
        RiskTier::Low
    }
}

/// Presentation record for a probability
pub fn bucket(probability: f64) -> RiskLevel {
    tier(probability).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let cases = [
            (1.0, "High"),
            (0.8, "High"),
            (0.79, "Medium-High"),
            (0.6, "Medium-High"),
            (0.59, "Medium"),
            (0.4, "Medium"),
            (0.39, "Low-Medium"),
            (0.2, "Low-Medium"),
            (0.19, "Low"),
            (0.0, "Low"),
        ];
        for (p, level) in cases {
            assert_eq!(bucket(p).level, level, "p = {}", p);
        }
    }

    #[test]
    fn test_bucket_fields() {
        let high = bucket(0.95);
        assert_eq!(high.class, "danger");
        assert_eq!(high.description, "Very likely to be malicious");

        let low = bucket(0.05);
        assert_eq!(low.class, "success");
        assert_eq!(low.description, "Likely to be legitimate");

        assert_eq!(bucket(0.5).class, "info");
        assert_eq!(bucket(0.7).class, "warning");
        assert_eq!(bucket(0.3).class, "secondary");
    }

    #[test]
    fn test_nan_is_low() {
        assert_eq!(tier(f64::NAN), RiskTier::Low);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(tier(0.9) > tier(0.7));
        assert!(tier(0.1) < tier(0.3));
    }
}
