//! Alerting System
//!
//! Maps flood probabilities to risk levels, renders alert messages in
//! English and Hindi, and builds the alert feed consumed by the dashboard.

mod feed;
mod messages;
mod risk;

pub use feed::{AlertFeed, AlertFeedConfig, AlertRecord};
pub use messages::{generate_alert, template, Alert, Language};
pub use risk::{classify, RiskLevel, HIGH_THRESHOLD, MODERATE_THRESHOLD, SEVERE_THRESHOLD};

use thiserror::Error;

/// Alerting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("Unsupported language: '{0}' (expected 'en' or 'hi')")]
    UnsupportedLanguage(String),
}
