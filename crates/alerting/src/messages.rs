//! Bilingual Alert Messages

use crate::feed::AlertRecord;
use crate::risk::{classify, RiskLevel};
use crate::AlertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Alert message language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = AlertError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "en" => Ok(Language::English),
            "hi" => Ok(Language::Hindi),
            other => Err(AlertError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Message template for a (language, level) pair.
///
/// `{city}` is replaced by the city name and `{risk}` by the probability as
/// a percentage with one decimal.
pub fn template(language: Language, level: RiskLevel) -> &'static str {
    match (language, level) {
        (Language::English, RiskLevel::Severe) => {
            "⚠️ SEVERE FLOOD ALERT for {city}! Immediate evacuation recommended. Risk: {risk}%"
        }
        (Language::English, RiskLevel::High) => "🔴 HIGH flood risk in {city}. Prepare for evacuation. Risk: {risk}%",
        (Language::English, RiskLevel::Moderate) => "🟡 MODERATE flood risk in {city}. Stay alert. Risk: {risk}%",
        (Language::English, RiskLevel::Low) => "🟢 LOW flood risk in {city}. Situation normal. Risk: {risk}%",
        (Language::Hindi, RiskLevel::Severe) => {
            "⚠️ {city} में गंभीर बाढ़ चेतावनी! तुरंत निकासी की सिफारिश। जोखिम: {risk}%"
        }
        (Language::Hindi, RiskLevel::High) => "🔴 {city} में उच्च बाढ़ जोखिम। निकासी के लिए तैयार रहें। जोखिम: {risk}%",
        (Language::Hindi, RiskLevel::Moderate) => "🟡 {city} में मध्यम बाढ़ जोखिम। सतर्क रहें। जोखिम: {risk}%",
        (Language::Hindi, RiskLevel::Low) => "🟢 {city} में कम बाढ़ जोखिम। स्थिति सामान्य। जोखिम: {risk}%",
    }
}

/// Rendered alert for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub city: String,
    /// Simulation timestep that raised the alert, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestep: Option<u32>,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub color: String,
    pub language: Language,
    pub message: String,
}

impl Alert {
    /// Render an alert in a known language
    pub fn new(city: &str, probability: f64, language: Language) -> Self {
        let risk_level = classify(probability);
        // City goes in last so text inside the name is never substituted
        let message = template(language, risk_level)
            .replace("{risk}", &format!("{:.1}", probability * 100.0))
            .replace("{city}", city);

        Self {
            city: city.to_string(),
            timestep: None,
            probability,
            risk_level,
            color: risk_level.color().to_string(),
            language,
            message,
        }
    }

    /// Render the message for a feed record, keeping its timestep
    pub fn from_record(record: &AlertRecord, language: Language) -> Self {
        Self::new(&record.city, record.probability, language).at_timestep(record.timestep)
    }

    pub fn at_timestep(mut self, timestep: u32) -> Self {
        self.timestep = Some(timestep);
        self
    }
}

/// Render an alert for a language code (`en` or `hi`)
pub fn generate_alert(city: &str, probability: f64, language_code: &str) -> Result<Alert, AlertError> {
    let language = language_code.parse::<Language>()?;
    let alert = Alert::new(city, probability, language);
    debug!("Generated {} alert for {} ({})", alert.risk_level, city, language);
    Ok(alert)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_severe() {
        let alert = generate_alert("Mumbai", 0.856, "en").unwrap();
        assert_eq!(alert.risk_level, RiskLevel::Severe);
        assert_eq!(alert.color, "red");
        assert_eq!(
            alert.message,
            "⚠️ SEVERE FLOOD ALERT for Mumbai! Immediate evacuation recommended. Risk: 85.6%"
        );
    }

    #[test]
    fn test_hindi_moderate() {
        let alert = generate_alert("Patna", 0.45, "hi").unwrap();
        assert_eq!(alert.risk_level, RiskLevel::Moderate);
        assert!(alert.message.starts_with("🟡 Patna में"));
        assert!(alert.message.ends_with("जोखिम: 45.0%"));
    }

    #[test]
    fn test_percentage_has_one_decimal() {
        let alert = generate_alert("Delhi", 0.1234, "en").unwrap();
        assert!(alert.message.ends_with("Risk: 12.3%"));
        let alert = generate_alert("Delhi", 0.0, "en").unwrap();
        assert!(alert.message.ends_with("Risk: 0.0%"));
    }

    #[test]
    fn test_unsupported_language() {
        let err = generate_alert("Chennai", 0.9, "ta").unwrap_err();
        assert_eq!(err, AlertError::UnsupportedLanguage("ta".to_string()));
        assert!(generate_alert("Chennai", 0.9, "EN").is_err());
    }

    #[test]
    fn test_every_template_has_placeholders() {
        for language in [Language::English, Language::Hindi] {
            for level in RiskLevel::ALL {
                let t = template(language, level);
                assert!(t.contains("{city}") && t.contains("{risk}"), "{language} {level}");
            }
        }
    }

    #[test]
    fn test_placeholder_text_in_city_name_is_kept() {
        let alert = generate_alert("Port {risk} Blair", 0.9, "en").unwrap();
        assert_eq!(
            alert.message,
            "⚠️ SEVERE FLOOD ALERT for Port {risk} Blair! Immediate evacuation recommended. Risk: 90.0%"
        );
    }

    #[test]
    fn test_alert_from_feed_record_keeps_timestep() {
        let record = AlertRecord {
            timestep: 57,
            city: "Guwahati".to_string(),
            risk_level: RiskLevel::High,
            probability: 0.72,
            rainfall: 96.4,
            river_level: 8.1,
        };
        let alert = Alert::from_record(&record, Language::Hindi);
        assert_eq!(alert.timestep, Some(57));
        assert_eq!(alert.risk_level, RiskLevel::High);
        assert!(alert.message.starts_with("🔴 Guwahati में"));

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["timestep"], 57);
        assert!(serde_json::to_value(generate_alert("Pune", 0.1, "en").unwrap())
            .unwrap()
            .get("timestep")
            .is_none());
    }

    #[test]
    fn test_language_serde_codes() {
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"hi\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::English);
    }
}
