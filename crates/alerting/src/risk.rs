//! Risk Levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of SEVERE
pub const SEVERE_THRESHOLD: f64 = 0.8;
/// Lower bound of HIGH
pub const HIGH_THRESHOLD: f64 = 0.6;
/// Lower bound of MODERATE
pub const MODERATE_THRESHOLD: f64 = 0.4;

/// Discrete flood risk level, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Moderate, Self::High, Self::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Severe => "SEVERE",
        }
    }

    /// Map color for the level
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Moderate => "yellow",
            RiskLevel::High => "orange",
            RiskLevel::Severe => "red",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level for a probability. Bands include their lower bound; NaN is LOW.
pub fn classify(probability: f64) -> RiskLevel {
    if probability >= SEVERE_THRESHOLD {
        RiskLevel::Severe
    } else if probability >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if probability >= MODERATE_THRESHOLD {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(0.8), RiskLevel::Severe);
        assert_eq!(classify(0.7999), RiskLevel::High);
        assert_eq!(classify(0.6), RiskLevel::High);
        assert_eq!(classify(0.5999), RiskLevel::Moderate);
        assert_eq!(classify(0.4), RiskLevel::Moderate);
        assert_eq!(classify(0.39), RiskLevel::Low);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(0.0), RiskLevel::Low);
        assert_eq!(classify(1.0), RiskLevel::Severe);
        assert_eq!(classify(f64::NAN), RiskLevel::Low);
    }

    #[test]
    fn test_colors() {
        let colors: Vec<&str> = RiskLevel::ALL.iter().map(RiskLevel::color).collect();
        assert_eq!(colors, vec!["green", "yellow", "orange", "red"]);
    }

    proptest! {
        #[test]
        fn prop_classify_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo) <= classify(hi));
        }
    }
}
