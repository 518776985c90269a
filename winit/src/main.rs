// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use sensor_dashboard_common::chart::{ChartFrame, Plot};
use sensor_dashboard_common::display::DisplayFields;
use sensor_dashboard_common::risk::RiskAssessment;
use sensor_dashboard_common::source::{DummySource, HttpSource};
use sensor_dashboard_common::{Config, Frame, Poller};

/// Our App struct that holds the UI and the poller feeding it.
///
/// The poller fetches a sensor sample from the backend every few seconds on its own thread.
/// Every successful poll produces a Frame, which is handed over to the UI thread and written
/// into the ViewModel global. The charts are only touched when the frame carries new chart data.
struct App {
    ui: AppWindow,
    config: Config,
    poller: Option<Poller>,
}

impl App {
    /// Create a new App struct.
    ///
    /// Failing to create the window is fatal: there is nothing to show the readings on.
    fn new(config: Config) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        Ok(Self {
            ui,
            config,
            poller: None,
        })
    }

    /// Run the App: start polling, run the UI until the window is closed, then stop polling.
    fn run(&mut self) -> anyhow::Result<()> {
        // Get the handle to the UI as a weak reference, the poller thread can't own the window.
        let ui_handle = self.ui.as_weak();

        let on_frame = move |frame: Frame| {
            // Frames arrive on the poller thread, the UI may only be touched from the event loop.
            if let Err(e) = ui_handle.upgrade_in_event_loop(move |ui| show_frame(&ui, frame)) {
                log::warn!("Dropping frame, event loop is gone: {e}");
            }
        };

        let settings = self.config.poll_settings();
        let poller = if self.config.demo {
            log::info!("Demo mode, replaying canned samples");
            Poller::start(settings, DummySource::new()?, on_frame)?
        } else {
            let source = HttpSource::new(&self.config.base_url, settings.request_timeout)?;
            log::info!("Polling {}", source.url());
            Poller::start(settings, source, on_frame)?
        };
        self.poller = Some(poller);

        // Run the UI (and map an error to an anyhow::Error).
        let result: anyhow::Result<()> = self.ui.run().map_err(|e| e.into());

        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }

        result
    }
}

/// Write a frame into the view model.
fn show_frame(ui: &AppWindow, frame: Frame) {
    let model = ui.global::<ViewModel>();

    model.set_readings(frame.fields.into());
    model.set_risk(frame.risk.into());
    model.set_last_update(frame.received_at.into());

    // Redraw the charts only when the series changed
    if let Some(chart) = frame.chart {
        show_chart(&model, chart);
    }
}

fn show_chart(model: &ViewModel, chart: ChartFrame) {
    let labels: Vec<slint::SharedString> = chart.labels.into_iter().map(Into::into).collect();

    model.set_labels(slint::ModelRc::new(slint::VecModel::from(labels)));
    model.set_temperature(chart.temperature.into());
    model.set_humidity(chart.humidity.into());
}

/// Convert the display fields into the readings shown in the tiles.
impl From<DisplayFields> for Readings {
    fn from(fields: DisplayFields) -> Self {
        Self {
            temperature: fields.temperature.into(),
            humidity: fields.humidity.into(),
            rain: fields.rain.into(),
            soil: fields.soil.into(),
            gps: fields.gps.into(),
        }
    }
}

/// Convert a plot into the data bound to a chart widget.
impl From<Plot> for PlotData {
    fn from(plot: Plot) -> Self {
        Self {
            latest: Plot::label(plot.latest).into(),
            min: Plot::label(plot.min).into(),
            max: Plot::label(plot.max).into(),
            commands: plot.commands.into(),
        }
    }
}

impl From<RiskAssessment> for RiskReport {
    fn from(risk: RiskAssessment) -> Self {
        Self {
            percent: risk.percent.into(),
            level: risk.level.to_string().into(),
            main_factor: risk.main_factor.into(),
        }
    }
}

/// A minimal main function that loads the config, initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load()?;
    log::debug!("Config: {config:?}");

    let mut app = App::new(config)?;

    app.run()
}

#[test]
fn test_empty_plot_shows_placeholders() {
    let data: PlotData = Plot::from_values(&[]).into();

    assert_eq!(data.commands, "");
    assert_eq!(data.latest, "--");
    assert_eq!(data.max, "--");
}

#[test]
fn test_risk_report_conversion() {
    let report: RiskReport = RiskAssessment::default().into();

    assert_eq!(report.percent, 0);
    assert_eq!(report.level, "No Data");
    assert_eq!(report.main_factor, "N/A");
}
