use serde::{Deserialize, Deserializer, Serialize};

/// A single sensor value as sent by the backend.
///
/// The backend does not enforce a schema: temperature and humidity usually arrive as numbers,
/// while rain, soil and vibration are free-form strings such as `"dry"` or `"no rain"`.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    Flag(bool),
    /// The key was sent with an explicit `null`.
    Null,
}

impl Reading {
    /// JavaScript truthiness: `0`, `NaN`, `""` and `false` count as "no data".
    pub fn is_truthy(&self) -> bool {
        match self {
            Reading::Number(value) => *value != 0.0 && !value.is_nan(),
            Reading::Text(text) => !text.is_empty(),
            Reading::Flag(flag) => *flag,
            Reading::Null => false,
        }
    }

    /// True for a numeric zero, the one falsy value that is still a real reading.
    pub fn is_zero(&self) -> bool {
        matches!(self, Reading::Number(value) if *value == 0.0)
    }

    /// Numeric value of the reading, parsing numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(value) => Some(*value),
            Reading::Text(text) => text.trim().parse().ok(),
            Reading::Flag(_) | Reading::Null => None,
        }
    }

    /// Lower-cased text of the reading, if it is text.
    pub fn as_lowercase(&self) -> Option<String> {
        match self {
            Reading::Text(text) => Some(text.to_lowercase()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // f64's Display already prints `60` for 60.0 and `21.5` for 21.5
            Reading::Number(value) if *value == 0.0 => f.write_str("0"),
            Reading::Number(value) => write!(f, "{value}"),
            Reading::Text(text) => f.write_str(text),
            Reading::Flag(flag) => write!(f, "{flag}"),
            Reading::Null => f.write_str("null"),
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

impl From<&str> for Reading {
    fn from(text: &str) -> Self {
        Reading::Text(text.to_string())
    }
}

/// Accepts any JSON value; containers keep their JSON text. A missing key stays `None`.
fn any_reading<'de, D>(deserializer: D) -> Result<Option<Reading>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let reading = match Value::deserialize(deserializer)? {
        Value::Null => Some(Reading::Null),
        Value::Bool(flag) => Some(Reading::Flag(flag)),
        Value::Number(number) => number.as_f64().map(Reading::Number),
        Value::String(text) => Some(Reading::Text(text)),
        other => Some(Reading::Text(other.to_string())),
    };

    Ok(reading)
}

/// One snapshot of the sensor readings as returned by `GET /data`.
///
/// Every field is optional and unknown keys are ignored, so the `{"message": "no data yet"}`
/// reply of a freshly started backend decodes into an empty sample.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Sample {
    #[serde(default, deserialize_with = "any_reading")]
    pub temperature: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub humidity: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub rain: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub soil: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub gps_lat: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub gps_lon: Option<Reading>,
    #[serde(default, deserialize_with = "any_reading")]
    pub vibration: Option<Reading>,
}

impl Sample {
    /// Decodes a response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// True if the backend sent none of the known keys, not even as `null`.
    pub fn is_empty(&self) -> bool {
        [
            &self.temperature,
            &self.humidity,
            &self.rain,
            &self.soil,
            &self.gps_lat,
            &self.gps_lon,
            &self.vibration,
        ]
        .iter()
        .all(|field| field.is_none())
    }
}

/// How a decoded field is judged to carry data.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresencePolicy {
    /// Any falsy value counts as missing, so a real `0` reading shows as the placeholder.
    Legacy,
    /// Like `Legacy`, except that a numeric zero counts as a reading.
    #[default]
    Explicit,
}

impl PresencePolicy {
    /// Returns the field if it counts as present under this policy.
    pub fn present<'a>(&self, field: &'a Option<Reading>) -> Option<&'a Reading> {
        match self {
            PresencePolicy::Legacy => field.as_ref().filter(|reading| reading.is_truthy()),
            PresencePolicy::Explicit => field
                .as_ref()
                .filter(|reading| reading.is_truthy() || reading.is_zero()),
        }
    }
}

impl std::str::FromStr for PresencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(PresencePolicy::Legacy),
            "explicit" => Ok(PresencePolicy::Explicit),
            other => Err(format!("unknown presence policy `{other}`")),
        }
    }
}

#[test]
fn test_decode_full_sample() {
    let sample = Sample::from_json(
        r#"{"temperature": 21.5, "humidity": 60, "rain": "no rain", "soil": "dry",
            "gps_lat": 6.5244, "gps_lon": 3.3792, "vibration": "low"}"#,
    )
    .unwrap();

    assert_eq!(sample.temperature, Some(Reading::Number(21.5)));
    assert_eq!(sample.humidity, Some(Reading::Number(60.0)));
    assert_eq!(sample.rain, Some(Reading::from("no rain")));
    assert_eq!(sample.soil, Some(Reading::from("dry")));
    assert_eq!(sample.gps_lon, Some(Reading::Number(3.3792)));
    assert!(!sample.is_empty());
}

#[test]
fn test_decode_tolerates_missing_and_unknown_fields() {
    let sample = Sample::from_json(r#"{"message": "no data yet"}"#).unwrap();
    assert_eq!(sample, Sample::default());
    assert!(sample.is_empty());

    let sample = Sample::from_json(r#"{"temperature": null, "humidity": true, "soil": [1, 2]}"#).unwrap();
    assert_eq!(sample.temperature, Some(Reading::Null));
    assert!(!sample.is_empty());
    assert_eq!(sample.humidity, Some(Reading::Flag(true)));
    assert_eq!(sample.soil, Some(Reading::from("[1,2]")));
}

#[test]
fn test_decode_rejects_non_json() {
    assert!(Sample::from_json("<html>502 Bad Gateway</html>").is_err());
}

#[test]
fn test_reading_display_and_truthiness() {
    assert_eq!(Reading::Number(60.0).to_string(), "60");
    assert_eq!(Reading::Number(21.5).to_string(), "21.5");
    assert_eq!(Reading::Number(-3.25).to_string(), "-3.25");
    assert_eq!(Reading::Number(-0.0).to_string(), "0");

    assert!(!Reading::Number(0.0).is_truthy());
    assert!(!Reading::from("").is_truthy());
    assert!(!Reading::Flag(false).is_truthy());
    assert!(Reading::from("0").is_truthy());
    assert!(Reading::Number(-1.0).is_truthy());
}

#[test]
fn test_presence_policies() {
    let zero = Some(Reading::Number(0.0));

    assert_eq!(PresencePolicy::Legacy.present(&zero), None);
    assert_eq!(PresencePolicy::Explicit.present(&zero), Some(&Reading::Number(0.0)));
    assert_eq!(PresencePolicy::Explicit.present(&Some(Reading::Number(-0.0))), Some(&Reading::Number(-0.0)));
    assert_eq!(PresencePolicy::Explicit.present(&None), None);
    assert_eq!(PresencePolicy::Explicit.present(&Some(Reading::Null)), None);
    assert_eq!(PresencePolicy::Explicit.present(&Some(Reading::from(""))), None);
    assert_eq!(PresencePolicy::Explicit.present(&Some(Reading::Flag(false))), None);

    assert_eq!("LEGACY".parse::<PresencePolicy>(), Ok(PresencePolicy::Legacy));
    assert!("strict".parse::<PresencePolicy>().is_err());
}
