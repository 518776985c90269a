use crate::display::PLACEHOLDER;
use crate::series::RollingSeries;
use std::fmt::Write;

/// Width and height of the viewbox the path commands are expressed in.
pub const VIEWBOX: f64 = 100.0;

/// Vertical space kept free above the maximum and below the minimum.
const MARGIN: f64 = 5.0;

/// One line of a chart, ready to be bound to a `Path` element.
#[derive(Clone, Debug, PartialEq)]
pub struct Plot {
    /// SVG path commands in a `VIEWBOX` x `VIEWBOX` coordinate system.
    pub commands: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub latest: Option<f64>,
}

impl Plot {
    pub fn from_values(values: &[f64]) -> Self {
        let Some(&latest) = values.last() else {
            return Self {
                commands: String::new(),
                min: None,
                max: None,
                latest: None,
            };
        };

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        let x = |i: usize| {
            if values.len() == 1 {
                VIEWBOX / 2.0
            } else {
                i as f64 * VIEWBOX / (values.len() - 1) as f64
            }
        };

        // SVG y grows downwards
        let y = |value: f64| {
            if span <= f64::EPSILON {
                VIEWBOX / 2.0
            } else {
                let usable = VIEWBOX - 2.0 * MARGIN;
                VIEWBOX - MARGIN - (value - min) / span * usable
            }
        };

        let mut commands = String::new();
        for (i, value) in values.iter().enumerate() {
            let op = if i == 0 { 'M' } else { 'L' };
            let _ = write!(commands, "{op} {:.2} {:.2} ", x(i), y(*value));
        }
        if values.len() == 1 {
            // A lone move draws nothing, so close it into a dot
            let _ = write!(commands, "L {:.2} {:.2}", x(0), y(latest));
        }

        Self {
            commands: commands.trim_end().to_string(),
            min: Some(min),
            max: Some(max),
            latest: Some(latest),
        }
    }

    /// Axis label text for a bound, or the placeholder for an empty plot.
    pub fn label(value: Option<f64>) -> String {
        value
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }
}

/// Everything both chart widgets need to redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartFrame {
    pub labels: Vec<String>,
    pub temperature: Plot,
    pub humidity: Plot,
}

impl From<&RollingSeries> for ChartFrame {
    fn from(series: &RollingSeries) -> Self {
        Self {
            labels: series.labels().map(str::to_string).collect(),
            temperature: Plot::from_values(&series.temperature().collect::<Vec<_>>()),
            humidity: Plot::from_values(&series.humidity().collect::<Vec<_>>()),
        }
    }
}

#[test]
fn test_empty_plot() {
    let plot = Plot::from_values(&[]);
    assert!(plot.commands.is_empty());
    assert_eq!(plot.latest, None);
    assert_eq!(Plot::label(plot.max), "--");
}

#[test]
fn test_plot_spans_the_viewbox() {
    let plot = Plot::from_values(&[10.0, 30.0, 20.0]);

    assert_eq!(plot.commands, "M 0.00 95.00 L 50.00 5.00 L 100.00 50.00");
    assert_eq!(plot.min, Some(10.0));
    assert_eq!(plot.max, Some(30.0));
    assert_eq!(plot.latest, Some(20.0));
    assert_eq!(Plot::label(plot.max), "30.0");
}

#[test]
fn test_flat_and_single_value_plots_sit_mid_height() {
    let plot = Plot::from_values(&[21.0, 21.0]);
    assert_eq!(plot.commands, "M 0.00 50.00 L 100.00 50.00");

    let plot = Plot::from_values(&[42.0]);
    assert_eq!(plot.commands, "M 50.00 50.00 L 50.00 50.00");
}

#[test]
fn test_chart_frame_from_series() {
    let mut series = RollingSeries::new();
    series.push("12:00:00".into(), 21.5, 60.0);
    series.push("12:00:03".into(), 22.0, 58.0);

    let frame = ChartFrame::from(&series);
    assert_eq!(frame.labels, vec!["12:00:00", "12:00:03"]);
    assert_eq!(frame.temperature.latest, Some(22.0));
    assert_eq!(frame.humidity.min, Some(58.0));
}
