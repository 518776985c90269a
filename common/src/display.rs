use crate::sample::{PresencePolicy, Reading, Sample};

/// Shown in place of a reading that carries no data.
pub const PLACEHOLDER: &str = "--";

/// The text of the five reading fields on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFields {
    pub temperature: String,
    pub humidity: String,
    pub rain: String,
    pub soil: String,
    pub gps: String,
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self {
            temperature: PLACEHOLDER.into(),
            humidity: PLACEHOLDER.into(),
            rain: PLACEHOLDER.into(),
            soil: PLACEHOLDER.into(),
            gps: format!("{PLACEHOLDER}, {PLACEHOLDER}"),
        }
    }
}

impl DisplayFields {
    pub fn from_sample(sample: &Sample, policy: PresencePolicy) -> Self {
        let text = |field: &Option<Reading>| {
            policy
                .present(field)
                .map(Reading::to_string)
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };

        Self {
            temperature: text(&sample.temperature),
            humidity: text(&sample.humidity),
            rain: text(&sample.rain),
            soil: text(&sample.soil),
            // Each coordinate falls back on its own
            gps: format!("{}, {}", text(&sample.gps_lat), text(&sample.gps_lon)),
        }
    }
}

#[test]
fn test_partial_sample_shows_placeholders() {
    let sample = Sample {
        temperature: Some(Reading::Number(21.5)),
        humidity: Some(Reading::Number(60.0)),
        ..Default::default()
    };

    let fields = DisplayFields::from_sample(&sample, PresencePolicy::Legacy);
    assert_eq!(fields.temperature, "21.5");
    assert_eq!(fields.humidity, "60");
    assert_eq!(fields.rain, "--");
    assert_eq!(fields.soil, "--");
    assert_eq!(fields.gps, "--, --");
}

#[test]
fn test_falsy_values_are_placeholders_in_legacy_mode() {
    let sample = Sample::from_json(
        r#"{"temperature": 0, "humidity": "", "rain": false, "soil": null, "gps_lat": 0, "gps_lon": 3.5}"#,
    )
    .unwrap();

    let fields = DisplayFields::from_sample(&sample, PresencePolicy::Legacy);
    assert_eq!(fields.temperature, PLACEHOLDER);
    assert_eq!(fields.humidity, PLACEHOLDER);
    assert_eq!(fields.rain, PLACEHOLDER);
    assert_eq!(fields.soil, PLACEHOLDER);
    assert_eq!(fields.gps, "--, 3.5");
}

#[test]
fn test_zero_is_shown_in_explicit_mode() {
    let sample = Sample::from_json(r#"{"temperature": 0, "humidity": 55, "gps_lat": 0}"#).unwrap();

    let fields = DisplayFields::from_sample(&sample, PresencePolicy::Explicit);
    assert_eq!(fields.temperature, "0");
    assert_eq!(fields.humidity, "55");
    assert_eq!(fields.gps, "0, --");
}

#[test]
fn test_blank_and_false_are_placeholders_in_explicit_mode() {
    let sample = Sample::from_json(
        r#"{"temperature": "", "humidity": 50, "rain": "", "soil": false, "gps_lat": null, "gps_lon": -0.0}"#,
    )
    .unwrap();

    let fields = DisplayFields::from_sample(&sample, PresencePolicy::Explicit);
    assert_eq!(fields.temperature, PLACEHOLDER);
    assert_eq!(fields.humidity, "50");
    assert_eq!(fields.rain, PLACEHOLDER);
    assert_eq!(fields.soil, PLACEHOLDER);
    assert_eq!(fields.gps, "--, 0");
}

#[test]
fn test_text_readings_are_shown_verbatim() {
    let sample = Sample::from_json(r#"{"rain": "No Rain", "soil": "Wet"}"#).unwrap();

    let fields = DisplayFields::from_sample(&sample, PresencePolicy::Legacy);
    assert_eq!(fields.rain, "No Rain");
    assert_eq!(fields.soil, "Wet");
    assert_eq!(DisplayFields::default().gps, "--, --");
}
