//! Fallback Estimates
//!
//! Provides a flood probability when the trained models are unavailable.

mod rules;

pub use rules::{FallbackEngine, FallbackPolicy, NEUTRAL_PROBABILITY};
