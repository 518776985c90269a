// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::sample::Sample;
use crate::source::{FetchError, SampleSource};

/// Replays a canned list of samples, one per fetch, wrapping around at the end.
pub struct DummySource {
    samples: Vec<Sample>,
    next: AtomicUsize,
}

impl DummySource {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummysamples.json");

        Ok(Self::from_samples(serde_json::from_str(json_data)?))
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            next: AtomicUsize::new(0),
        }
    }
}

impl SampleSource for DummySource {
    async fn fetch(&self) -> Result<Sample, FetchError> {
        if self.samples.is_empty() {
            return Ok(Sample::default());
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.samples.len();
        Ok(self.samples[index].clone())
    }
}

#[tokio::test]
async fn test_dummy_source_cycles() {
    let source = DummySource::new().unwrap();
    let count = source.samples.len();
    assert!(count > 1);

    let first = source.fetch().await.unwrap();
    for _ in 1..count {
        source.fetch().await.unwrap();
    }

    assert_eq!(source.fetch().await.unwrap(), first);
    assert!(first.temperature.is_some());
}

#[tokio::test]
async fn test_empty_dummy_source_yields_empty_samples() {
    let source = DummySource::from_samples(Vec::new());
    assert!(source.fetch().await.unwrap().is_empty());
}
