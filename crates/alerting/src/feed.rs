//! Alert Feed
//!
//! The feed is a JSON array read by the dashboard, so [`AlertRecord`] field
//! names must not change.

use crate::risk::{classify, RiskLevel, HIGH_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One entry of the alert feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestep: u32,
    pub city: String,
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub rainfall: f64,
    pub river_level: f64,
}

/// Feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFeedConfig {
    /// Minimum probability for a prediction to enter the feed
    pub min_probability: f64,
}

impl Default for AlertFeedConfig {
    fn default() -> Self {
        Self {
            min_probability: HIGH_THRESHOLD,
        }
    }
}

/// Collects alert records for predictions above the feed threshold
#[derive(Debug, Clone, Default)]
pub struct AlertFeed {
    config: AlertFeedConfig,
    records: Vec<AlertRecord>,
}

impl AlertFeed {
    pub fn new(config: AlertFeedConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    /// Record a prediction; returns the record if it entered the feed
    pub fn observe(
        &mut self,
        timestep: u32,
        city: &str,
        probability: f64,
        rainfall: f64,
        river_level: f64,
    ) -> Option<&AlertRecord> {
        if probability.is_nan() || probability < self.config.min_probability {
            return None;
        }

        self.records.push(AlertRecord {
            timestep,
            city: city.to_string(),
            risk_level: classify(probability),
            probability,
            rainfall,
            river_level,
        });
        self.records.last()
    }

    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records at a given level
    pub fn count_at(&self, level: RiskLevel) -> usize {
        self.records.iter().filter(|r| r.risk_level == level).count()
    }

    /// Most recent record per city, ordered by city
    pub fn latest_per_city(&self) -> Vec<&AlertRecord> {
        let mut latest: BTreeMap<&str, &AlertRecord> = BTreeMap::new();
        for record in &self.records {
            latest
                .entry(record.city.as_str())
                .and_modify(|current| {
                    if record.timestep >= current.timestep {
                        *current = record;
                    }
                })
                .or_insert(record);
        }
        latest.into_values().collect()
    }

    pub fn into_records(self) -> Vec<AlertRecord> {
        info!(
            "Alert feed: {} records ({} severe, {} high)",
            self.records.len(),
            self.count_at(RiskLevel::Severe),
            self.count_at(RiskLevel::High)
        );
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_feed_keeps_high_and_severe() {
        let mut feed = AlertFeed::default();
        assert!(feed.observe(0, "Mumbai", 0.59, 10.0, 2.0).is_none());
        assert!(feed.observe(0, "Delhi", 0.6, 40.0, 4.0).is_some());
        assert!(feed.observe(1, "Delhi", 0.95, 90.0, 8.5).is_some());
        assert!(feed.observe(1, "Pune", f64::NAN, 0.0, 0.0).is_none());

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.count_at(RiskLevel::High), 1);
        assert_eq!(feed.count_at(RiskLevel::Severe), 1);
    }

    #[test]
    fn test_record_field_names() {
        let mut feed = AlertFeed::default();
        feed.observe(12, "Kolkata", 0.8125, 95.3, 8.12);

        let json = serde_json::to_value(feed.records()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "timestep": 12,
                "city": "Kolkata",
                "risk_level": "SEVERE",
                "probability": 0.8125,
                "rainfall": 95.3,
                "river_level": 8.12
            }])
        );
    }

    #[test]
    fn test_custom_threshold() {
        let mut feed = AlertFeed::new(AlertFeedConfig { min_probability: 0.0 });
        let record = feed.observe(3, "Agra", 0.1, 1.0, 1.0).unwrap();
        assert_eq!(record.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_latest_per_city() {
        let mut feed = AlertFeed::default();
        feed.observe(1, "Surat", 0.7, 1.0, 1.0);
        feed.observe(4, "Surat", 0.9, 2.0, 2.0);
        feed.observe(2, "Agra", 0.65, 3.0, 3.0);

        let latest = feed.latest_per_city();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].city, "Agra");
        assert_eq!(latest[1].timestep, 4);
    }
}
