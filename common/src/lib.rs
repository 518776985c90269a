//! Platform independent core of the sensor dashboard: decoding backend samples, turning them
//! into display text and chart geometry, and polling the backend on a background thread.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod poller;
pub mod risk;
pub mod sample;
pub mod series;
pub mod source;

pub use config::{Config, ConfigError};
pub use dashboard::{Dashboard, Frame};
pub use poller::{PollSettings, Poller};
pub use sample::{PresencePolicy, Reading, Sample};
