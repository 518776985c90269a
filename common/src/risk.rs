use crate::sample::{Reading, Sample};
use serde::{Deserialize, Serialize};

/// Temperature above which the site counts as overheating, in °C.
pub const HIGH_TEMPERATURE_CELSIUS: f64 = 35.0;

/// Contribution of each triggered factor to the risk score.
const FACTOR_WEIGHT: u8 = 25;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    NoData,
    /// A reading had a shape the scoring cannot work with.
    Error,
    Safe,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn from_percent(percent: u8) -> Self {
        match percent {
            75.. => RiskLevel::High,
            50..=74 => RiskLevel::Medium,
            1..=49 => RiskLevel::Low,
            0 => RiskLevel::Safe,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RiskLevel::NoData => "No Data",
            RiskLevel::Error => "Error",
            RiskLevel::Safe => "Safe",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        })
    }
}

/// Site risk derived from a single sample.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RiskAssessment {
    pub percent: u8,
    pub level: RiskLevel,
    pub main_factor: String,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            percent: 0,
            level: RiskLevel::NoData,
            main_factor: "N/A".into(),
        }
    }
}

/// Temperature in °C; a missing key counts as 0, `null` or non-numeric text is unusable.
fn temperature(field: &Option<Reading>) -> Option<f64> {
    match field {
        None => Some(0.0),
        Some(Reading::Flag(flag)) => Some(f64::from(u8::from(*flag))),
        Some(reading) => reading.as_f64(),
    }
}

/// Lower-cased condition text; a missing key is blank, anything but text is unusable.
fn condition(field: &Option<Reading>) -> Option<String> {
    match field {
        None => Some(String::new()),
        Some(reading) => reading.as_lowercase(),
    }
}

impl RiskAssessment {
    /// Scores temperature, soil, rain and vibration; each triggered factor adds 25%.
    pub fn assess(sample: &Sample) -> Self {
        if sample.is_empty() {
            return Self::default();
        }

        Self::score(sample).unwrap_or_else(|| {
            log::warn!("Cannot assess risk of {sample:?}");
            Self {
                percent: 0,
                level: RiskLevel::Error,
                main_factor: "N/A".into(),
            }
        })
    }

    fn score(sample: &Sample) -> Option<Self> {
        let celsius = temperature(&sample.temperature)?;
        let soil = condition(&sample.soil)?;
        let rain = condition(&sample.rain)?;
        let vibration = condition(&sample.vibration)?;

        let factors: Vec<&str> = [
            (celsius > HIGH_TEMPERATURE_CELSIUS, "Temperature"),
            (soil.contains("dry"), "Soil"),
            (rain.contains("rain") && !rain.contains("no"), "Rain"),
            (vibration.contains("strong") || vibration.contains("high"), "Vibration"),
        ]
        .into_iter()
        .filter_map(|(triggered, name)| triggered.then_some(name))
        .collect();

        let percent = factors.len() as u8 * FACTOR_WEIGHT;

        Some(Self {
            percent,
            level: RiskLevel::from_percent(percent),
            main_factor: factors.first().copied().unwrap_or("None").to_string(),
        })
    }
}

#[test]
fn test_empty_sample_has_no_data() {
    let risk = RiskAssessment::assess(&Sample::default());
    assert_eq!(risk.level, RiskLevel::NoData);
    assert_eq!(risk.main_factor, "N/A");
    assert_eq!(risk.level.to_string(), "No Data");
}

#[test]
fn test_calm_sample_is_safe() {
    let sample = Sample::from_json(r#"{"temperature": 24, "soil": "wet", "rain": "no rain"}"#).unwrap();
    let risk = RiskAssessment::assess(&sample);

    assert_eq!(risk.percent, 0);
    assert_eq!(risk.level, RiskLevel::Safe);
    assert_eq!(risk.main_factor, "None");
}

#[test]
fn test_factors_accumulate() {
    let sample = Sample::from_json(
        r#"{"temperature": "36.5", "soil": "Very DRY", "rain": "light rain", "vibration": "low"}"#,
    )
    .unwrap();
    let risk = RiskAssessment::assess(&sample);

    assert_eq!(risk.percent, 75);
    assert_eq!(risk.level, RiskLevel::High);
    assert_eq!(risk.main_factor, "Temperature");

    let sample = Sample::from_json(r#"{"humidity": 40, "vibration": "strong"}"#).unwrap();
    let risk = RiskAssessment::assess(&sample);
    assert_eq!(risk.percent, 25);
    assert_eq!(risk.level, RiskLevel::Low);
    assert_eq!(risk.main_factor, "Vibration");
}

#[test]
fn test_unusable_readings_are_an_error() {
    for body in [
        r#"{"temperature": "warm", "humidity": 40}"#,
        r#"{"temperature": 20, "soil": 12}"#,
        r#"{"temperature": null, "soil": "wet"}"#,
        r#"{"temperature": 20, "rain": false}"#,
        r#"{"temperature": 20, "vibration": null}"#,
    ] {
        let risk = RiskAssessment::assess(&Sample::from_json(body).unwrap());

        assert_eq!(risk.level, RiskLevel::Error, "{body}");
        assert_eq!(risk.percent, 0);
        assert_eq!(risk.main_factor, "N/A");
        assert_eq!(risk.level.to_string(), "Error");
    }
}

#[test]
fn test_missing_temperature_counts_as_zero() {
    let sample = Sample::from_json(r#"{"soil": "dry", "rain": "heavy rain"}"#).unwrap();
    let risk = RiskAssessment::assess(&sample);

    assert_eq!(risk.percent, 50);
    assert_eq!(risk.level, RiskLevel::Medium);
    assert_eq!(risk.main_factor, "Soil");
}
