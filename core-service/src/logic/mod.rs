//! Logic Module - Business Logic & Engines
//!
//! ## Architecture
//! - `features/` - URL feature extraction (structure, reputation, content, network)
//! - `dataset/` - Seeded synthetic training data
//! - `model/` - Random forest training, persistence and inference
//! - `risk/` - Probability to risk tier
//! - `analysis` - End-to-end URL analysis

pub mod features;
pub mod dataset;
pub mod model;
pub mod risk;
pub mod analysis;
