// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod dummysource;
pub use dummysource::DummySource;

#[cfg(feature = "http")]
mod httpsource;

#[cfg(feature = "http")]
pub use httpsource::HttpSource;

use crate::sample::Sample;

/// Path of the sensor snapshot on the backend.
pub const DATA_PATH: &str = "/data";

/// Why a single fetch produced no sample.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),
}

/// Something that can be polled for the latest sensor sample.
#[allow(async_fn_in_trait)]
pub trait SampleSource {
    /// Fetches the current sample.
    async fn fetch(&self) -> Result<Sample, FetchError>;
}
