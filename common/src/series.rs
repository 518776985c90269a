use std::collections::VecDeque;

/// Rolling history of the charted metrics.
///
/// Labels, temperatures and humidities are kept in three parallel buffers that always have the
/// same length and never hold more than [`RollingSeries::CAPACITY`] entries. The oldest entry is
/// evicted first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RollingSeries {
    labels: VecDeque<String>,
    temperature: VecDeque<f64>,
    humidity: VecDeque<f64>,
}

impl RollingSeries {
    pub const CAPACITY: usize = 10;

    pub fn new() -> Self {
        Self {
            labels: VecDeque::with_capacity(Self::CAPACITY + 1),
            temperature: VecDeque::with_capacity(Self::CAPACITY + 1),
            humidity: VecDeque::with_capacity(Self::CAPACITY + 1),
        }
    }

    /// Appends one sample, dropping the oldest one once the buffers grow past capacity.
    pub fn push(&mut self, label: String, temperature: f64, humidity: f64) {
        self.labels.push_back(label);
        self.temperature.push_back(temperature);
        self.humidity.push_back(humidity);

        if self.labels.len() > Self::CAPACITY {
            self.labels.pop_front();
            self.temperature.pop_front();
            self.humidity.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }

    pub fn temperature(&self) -> impl Iterator<Item = f64> + '_ {
        self.temperature.iter().copied()
    }

    pub fn humidity(&self) -> impl Iterator<Item = f64> + '_ {
        self.humidity.iter().copied()
    }
}

#[cfg(test)]
fn assert_aligned(series: &RollingSeries) {
    assert_eq!(series.labels.len(), series.temperature.len());
    assert_eq!(series.labels.len(), series.humidity.len());
    assert!(series.len() <= RollingSeries::CAPACITY);
}

#[test]
fn test_push_keeps_buffers_aligned() {
    let mut series = RollingSeries::new();
    assert!(series.is_empty());

    for i in 0..25 {
        series.push(format!("t{i}"), i as f64, 50.0 + i as f64);
        assert_aligned(&series);
        assert_eq!(series.len(), (i + 1).min(RollingSeries::CAPACITY));
    }
}

#[test]
fn test_eleventh_push_evicts_the_oldest() {
    let mut series = RollingSeries::new();

    for i in 0..11 {
        series.push(format!("t{i}"), i as f64, 100.0 - i as f64);
    }

    assert_eq!(series.len(), 10);
    assert_eq!(series.labels().next(), Some("t1"));
    assert_eq!(series.labels().last(), Some("t10"));
    assert_eq!(series.temperature().collect::<Vec<_>>(), (1..11).map(f64::from).collect::<Vec<_>>());
    assert_eq!(series.humidity().next(), Some(99.0));
}
