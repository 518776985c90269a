use crate::chart::ChartFrame;
use crate::display::DisplayFields;
use crate::risk::RiskAssessment;
use crate::sample::{PresencePolicy, Sample};
use crate::series::RollingSeries;

/// The UI update produced by one successful poll.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub fields: DisplayFields,
    pub risk: RiskAssessment,
    /// Only set when the series gained an entry; the charts stay as they are otherwise.
    pub chart: Option<ChartFrame>,
    pub received_at: String,
}

/// Dashboard state: the rolling series plus the rules that turn a sample into a frame.
#[derive(Debug, Default)]
pub struct Dashboard {
    series: RollingSeries,
    policy: PresencePolicy,
}

impl Dashboard {
    pub fn new(policy: PresencePolicy) -> Self {
        Self {
            series: RollingSeries::new(),
            policy,
        }
    }

    pub fn series(&self) -> &RollingSeries {
        &self.series
    }

    /// Applies a sample received at the wall-clock time `label`.
    pub fn apply(&mut self, sample: &Sample, label: String) -> Frame {
        let fields = DisplayFields::from_sample(sample, self.policy);
        let risk = RiskAssessment::assess(sample);

        let temperature = self.policy.present(&sample.temperature);
        let humidity = self.policy.present(&sample.humidity);

        let chart = match (temperature, humidity) {
            (Some(t), Some(h)) => match (t.as_f64(), h.as_f64()) {
                (Some(t), Some(h)) => {
                    self.series.push(label.clone(), t, h);
                    Some(ChartFrame::from(&self.series))
                }
                _ => {
                    log::warn!("Not charting non-numeric reading: temperature={t}, humidity={h}");
                    None
                }
            },
            _ => None,
        };

        Frame {
            fields,
            risk,
            chart,
            received_at: label,
        }
    }

    /// Like [`Dashboard::apply`], stamped with the current local time.
    pub fn apply_now(&mut self, sample: &Sample) -> Frame {
        self.apply(sample, timestamp_label())
    }
}

/// Local wall-clock time with seconds precision, e.g. `14:03:27`.
pub fn timestamp_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
fn sample(json: &str) -> Sample {
    Sample::from_json(json).unwrap()
}

#[test]
fn test_both_present_appends_and_redraws() {
    let mut dashboard = Dashboard::new(PresencePolicy::Legacy);
    let frame = dashboard.apply(&sample(r#"{"temperature": 21.5, "humidity": 60}"#), "12:00:00".into());

    assert_eq!(frame.fields.temperature, "21.5");
    assert_eq!(frame.fields.humidity, "60");
    assert_eq!(frame.fields.rain, "--");
    assert_eq!(frame.fields.soil, "--");
    assert_eq!(frame.fields.gps, "--, --");

    let chart = frame.chart.expect("charts should redraw");
    assert_eq!(chart.labels, vec!["12:00:00"]);
    assert_eq!(chart.temperature.latest, Some(21.5));
    assert_eq!(chart.humidity.latest, Some(60.0));
    assert_eq!(dashboard.series().len(), 1);
}

#[test]
fn test_one_metric_missing_updates_text_only() {
    let mut dashboard = Dashboard::new(PresencePolicy::Legacy);

    let frame = dashboard.apply(&sample(r#"{"temperature": 22, "soil": "dry"}"#), "12:00:00".into());
    assert_eq!(frame.fields.temperature, "22");
    assert_eq!(frame.fields.soil, "dry");
    assert!(frame.chart.is_none());

    let frame = dashboard.apply(&sample(r#"{"humidity": 40}"#), "12:00:03".into());
    assert_eq!(frame.fields.humidity, "40");
    assert!(frame.chart.is_none());
    assert!(dashboard.series().is_empty());
}

#[test]
fn test_zero_temperature_depends_on_policy() {
    let zero = sample(r#"{"temperature": 0, "humidity": 55}"#);

    let mut legacy = Dashboard::new(PresencePolicy::Legacy);
    let frame = legacy.apply(&zero, "12:00:00".into());
    assert_eq!(frame.fields.temperature, "--");
    assert!(frame.chart.is_none());
    assert!(legacy.series().is_empty());

    let mut explicit = Dashboard::new(PresencePolicy::Explicit);
    let frame = explicit.apply(&zero, "12:00:00".into());
    assert_eq!(frame.fields.temperature, "0");
    assert_eq!(frame.chart.unwrap().temperature.latest, Some(0.0));
}

#[test]
fn test_eleven_polls_keep_the_last_ten() {
    let mut dashboard = Dashboard::default();
    let mut last = None;

    for i in 0..11 {
        let body = format!(r#"{{"temperature": {}, "humidity": 50}}"#, 20 + i);
        last = dashboard.apply(&sample(&body), format!("12:00:{i:02}")).chart;
    }

    let chart = last.unwrap();
    assert_eq!(chart.labels.len(), 10);
    assert_eq!(chart.labels.first().map(String::as_str), Some("12:00:01"));
    assert_eq!(chart.temperature.min, Some(21.0));
    assert_eq!(chart.temperature.latest, Some(30.0));
    assert!(!dashboard.series().labels().any(|label| label == "12:00:00"));
}

#[test]
fn test_blank_temperature_is_not_charted_by_default() {
    let mut dashboard = Dashboard::default();
    let frame = dashboard.apply(
        &sample(r#"{"temperature": "", "humidity": 50, "rain": "", "soil": false}"#),
        "12:00:00".into(),
    );

    assert_eq!(frame.fields.temperature, "--");
    assert_eq!(frame.fields.humidity, "50");
    assert_eq!(frame.fields.rain, "--");
    assert_eq!(frame.fields.soil, "--");
    assert!(frame.chart.is_none());
    assert!(dashboard.series().is_empty());
}

#[test]
fn test_non_numeric_metric_is_not_charted() {
    let mut dashboard = Dashboard::new(PresencePolicy::Explicit);
    let frame = dashboard.apply(&sample(r#"{"temperature": "warm", "humidity": 50}"#), "12:00:00".into());

    assert_eq!(frame.fields.temperature, "warm");
    assert!(frame.chart.is_none());
}

#[test]
fn test_risk_is_part_of_the_frame() {
    let mut dashboard = Dashboard::default();
    let frame = dashboard.apply_now(&sample(r#"{"temperature": 40, "humidity": 20}"#));

    assert_eq!(frame.risk.main_factor, "Temperature");
    assert_eq!(frame.received_at.len(), "00:00:00".len());
}
