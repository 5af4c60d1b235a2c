//! Risk Types
//!
//! Data structures only.

use serde::{Deserialize, Serialize};

/// Five ordered risk tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::LowMedium => "Low-Medium",
            RiskTier::Medium => "Medium",
            RiskTier::MediumHigh => "Medium-High",
            RiskTier::High => "High",
        }
    }

    /// UI severity class
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskTier::Low => "success",
            RiskTier::LowMedium => "secondary",
            RiskTier::Medium => "info",
            RiskTier::MediumHigh => "warning",
            RiskTier::High => "danger",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Low => "Likely to be legitimate",
            RiskTier::LowMedium => "Slightly suspicious",
            RiskTier::Medium => "Potentially suspicious",
            RiskTier::MediumHigh => "Likely to be suspicious",
            RiskTier::High => "Very likely to be malicious",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation record: `{level, class, description}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevel {
    pub level: String,
    pub class: String,
    pub description: String,
}

impl From<RiskTier> for RiskLevel {
    fn from(tier: RiskTier) -> Self {
        Self {
            level: tier.as_str().to_string(),
            class: tier.css_class().to_string(),
            description: tier.description().to_string(),
        }
    }
}
