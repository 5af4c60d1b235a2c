//! Risk Thresholds
//!
//! Lower bounds (inclusive) of each tier, checked from the top down.
//! Constants only, no logic.

/// At or above = High
pub const HIGH_THRESHOLD: f64 = 0.8;

/// At or above = Medium-High
pub const MEDIUM_HIGH_THRESHOLD: f64 = 0.6;

/// At or above = Medium
pub const MEDIUM_THRESHOLD: f64 = 0.4;

/// At or above = Low-Medium, below = Low
pub const LOW_MEDIUM_THRESHOLD: f64 = 0.2;
