//! Feature Vector - Core data structure for classifier input
//!
//! **Fixed-width, enum-indexed vector**
//!
//! Uses the centralized layout from `layout.rs` for:
//! - Consistent feature ordering
//! - Per-feature value domains
//! - Default values when a heuristic is unavailable

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::layout::{Feature, FEATURE_COUNT, FEATURE_LAYOUT, INDEX_KEY};

/// Value taken by a feature key absent from (or unusable in) a serialized vector
pub const MISSING_KEY_DEFAULT: u8 = 1;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Complete feature vector: every feature always has a value in its domain
///
/// Serialized as a flat object `{"Index": 1, "UsingIP": 0, ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureVector {
    /// Record index (1 for extracted URLs, 1-based row number in datasets)
    pub index: u32,
    values: [u8; FEATURE_COUNT],
}

impl FeatureVector {
    /// The fully suspicious vector used when a URL cannot be parsed
    pub fn suspicious() -> Self {
        let mut values = [0u8; FEATURE_COUNT];
        for feature in Feature::ALL {
            values[feature.index()] = feature.suspicious_default();
        }
        Self { index: 1, values }
    }

    /// Build from raw values, clamping each into its feature's domain
    pub fn from_values(index: u32, values: [u8; FEATURE_COUNT]) -> Self {
        let mut vector = Self { index, values };
        for feature in Feature::ALL {
            let v = vector.values[feature.index()];
            vector.values[feature.index()] = v.min(feature.max_value());
        }
        vector
    }

    /// Get feature value
    pub fn get(&self, feature: Feature) -> u8 {
        self.values[feature.index()]
    }

    /// Get feature by column name
    pub fn get_by_name(&self, name: &str) -> Option<u8> {
        Feature::from_name(name).map(|f| self.get(f))
    }

    /// Set feature value, clamped into the feature's domain
    pub fn set(&mut self, feature: Feature, value: u8) {
        self.values[feature.index()] = value.min(feature.max_value());
    }

    /// Values as array reference, in layout order
    pub fn as_array(&self) -> &[u8; FEATURE_COUNT] {
        &self.values
    }

    /// Ordered numeric input for the classifier
    pub fn to_model_input(&self) -> [f64; FEATURE_COUNT] {
        let mut input = [0.0; FEATURE_COUNT];
        for (slot, v) in input.iter_mut().zip(self.values.iter()) {
            *slot = f64::from(*v);
        }
        input
    }

    /// (name, value) pairs in layout order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, u8)> + '_ {
        FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied())
    }

    /// Convert to JSON for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        let suspicious = Feature::ALL
            .iter()
            .filter(|f| self.get(**f) > 0)
            .map(|f| f.name())
            .collect::<Vec<_>>();
        serde_json::json!({
            "index": self.index,
            "values": self.values,
            "flagged": suspicious,
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::suspicious()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 1))?;
        map.serialize_entry(INDEX_KEY, &self.index)?;
        for (name, value) in self.named_values() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FeatureVectorVisitor)
    }
}

struct FeatureVectorVisitor;

impl<'de> Visitor<'de> for FeatureVectorVisitor {
    type Value = FeatureVector;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of feature names to integer values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FeatureVector, A::Error> {
        let mut vector = FeatureVector {
            index: 1,
            values: [MISSING_KEY_DEFAULT; FEATURE_COUNT],
        };
        while let Some(key) = access.next_key::<String>()? {
            let value: serde_json::Value = access.next_value()?;
            if key == INDEX_KEY {
                vector.index = value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| de::Error::custom("Index must be a non-negative integer"))?;
                continue;
            }
            let Some(feature) = Feature::from_name(&key) else {
                continue;
            };
            if let Some(v) = value.as_u64().filter(|v| *v <= u64::from(feature.max_value())) {
                vector.values[feature.index()] = v as u8;
            }
        }
        Ok(vector)
    }
}

// ============================================================================
// PARTIAL VECTOR
// ============================================================================

/// Per-heuristic results before defaults are applied
///
/// `None` means the heuristic could not be computed.
#[derive(Debug, Clone, Default)]
pub struct PartialVector {
    slots: [Option<u8>; FEATURE_COUNT],
}

impl PartialVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heuristic result
    pub fn set(&mut self, feature: Feature, value: Option<u8>) {
        self.slots[feature.index()] = value.map(|v| v.min(feature.max_value()));
    }

    pub fn get(&self, feature: Feature) -> Option<u8> {
        self.slots[feature.index()]
    }

    /// Features still unavailable
    pub fn missing(&self) -> Vec<Feature> {
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| self.slots[f.index()].is_none())
            .collect()
    }

    /// Resolve every unavailable slot from the per-feature default table
    pub fn fill_defaults(&self) -> FeatureVector {
        let mut values = [0u8; FEATURE_COUNT];
        for feature in Feature::ALL {
            values[feature.index()] = self.slots[feature.index()]
                .unwrap_or_else(|| feature.unavailable_default());
        }
        FeatureVector { index: 1, values }
    }
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// A group of heuristics that contributes slots to a partial vector
pub trait FeatureExtractor<T: ?Sized> {
    /// Extract features from `input` and record them
    fn extract(&self, input: &T, partial: &mut PartialVector);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspicious_vector() {
        let vector = FeatureVector::suspicious();
        assert_eq!(vector.index, 1);
        assert_eq!(vector.get(Feature::SubDomains), 2);
        assert_eq!(vector.get(Feature::WebsiteForwarding), 1);
        assert_eq!(vector.get(Feature::UsingIp), 1);
    }

    #[test]
    fn test_set_clamps_to_domain() {
        let mut vector = FeatureVector::suspicious();
        vector.set(Feature::Https, 7);
        assert_eq!(vector.get(Feature::Https), 1);
        vector.set(Feature::SubDomains, 9);
        assert_eq!(vector.get(Feature::SubDomains), 2);
    }

    #[test]
    fn test_fill_defaults() {
        let mut partial = PartialVector::new();
        partial.set(Feature::UsingIp, Some(0));
        partial.set(Feature::Https, Some(0));

        let vector = partial.fill_defaults();
        assert_eq!(vector.get(Feature::UsingIp), 0);
        assert_eq!(vector.get(Feature::Https), 0);
        assert_eq!(vector.get(Feature::SubDomains), 2);
        assert_eq!(vector.get(Feature::WebsiteForwarding), 0);
        assert_eq!(vector.get(Feature::Favicon), 1);
        assert_eq!(partial.missing().len(), FEATURE_COUNT - 2);
    }

    #[test]
    fn test_serializes_flat() {
        let mut vector = FeatureVector::suspicious();
        vector.set(Feature::UsingIp, 0);
        let json = serde_json::to_value(vector).unwrap();

        assert_eq!(json["Index"], 1);
        assert_eq!(json["UsingIP"], 0);
        assert_eq!(json["SubDomains"], 2);
        assert_eq!(json.as_object().unwrap().len(), FEATURE_COUNT + 1);
    }

    #[test]
    fn test_deserialize_fills_missing_keys() {
        let vector: FeatureVector =
            serde_json::from_str(r#"{"Index": 7, "HTTPS": 0, "SubDomains": 1, "extra": "x"}"#)
                .unwrap();

        assert_eq!(vector.index, 7);
        assert_eq!(vector.get(Feature::Https), 0);
        assert_eq!(vector.get(Feature::SubDomains), 1);
        assert_eq!(vector.get(Feature::Favicon), 1);
        assert_eq!(vector.get(Feature::WebsiteForwarding), 1);
    }

    #[test]
    fn test_missing_keys_default_to_one() {
        let vector: FeatureVector = serde_json::from_str(r#"{"UsingIP": 0}"#).unwrap();

        assert_eq!(vector.index, 1);
        assert_eq!(vector.get(Feature::UsingIp), 0);
        assert_eq!(vector.get(Feature::SubDomains), 1);
        for feature in Feature::ALL.into_iter().filter(|f| *f != Feature::UsingIp) {
            assert_eq!(vector.get(feature), MISSING_KEY_DEFAULT, "{}", feature);
        }
    }

    #[test]
    fn test_deserialize_rejects_out_of_domain_value() {
        let vector: FeatureVector = serde_json::from_str(r#"{"HTTPS": 5}"#).unwrap();
        assert_eq!(vector.get(Feature::Https), 1);
    }

    #[test]
    fn test_model_input_order() {
        let mut vector = FeatureVector::suspicious();
        vector.set(Feature::StatsReport, 0);
        let input = vector.to_model_input();
        assert_eq!(input[6], 2.0);
        assert_eq!(input[29], 0.0);
    }
}
