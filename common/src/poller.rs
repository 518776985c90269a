use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::dashboard::{Dashboard, Frame};
use crate::sample::PresencePolicy;
use crate::source::{FetchError, SampleSource};

/// Timing and presence rules of the polling loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub request_timeout: Duration,
    pub presence: PresencePolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(10),
            presence: PresencePolicy::default(),
        }
    }
}

/// Polls a [`SampleSource`] on a background thread and hands every frame to a callback.
///
/// Polls never overlap: each fetch is awaited before the next tick is taken, so the dashboard
/// state has a single writer. A failed poll is logged and the schedule carries on.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    /// Starts polling; the first poll runs right away.
    pub fn start<S, F>(settings: PollSettings, source: S, on_frame: F) -> std::io::Result<Self>
    where
        S: SampleSource + Send + 'static,
        F: FnMut(Frame) + Send + 'static,
    {
        let (shutdown, stop) = watch::channel(false);

        let worker = std::thread::Builder::new()
            .name("sensor-poller".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        log::error!("Failed to start the poller runtime: {e}");
                        return;
                    }
                };

                runtime.block_on(poll_loop(settings, source, on_frame, stop));
            })?;

        Ok(Self {
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Stops polling, aborting a request that is still in flight, and waits for the worker.
    pub fn stop(&mut self) {
        let _ = self.shutdown.send(true);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<S, F>(settings: PollSettings, source: S, mut on_frame: F, mut stop: watch::Receiver<bool>)
where
    S: SampleSource,
    F: FnMut(Frame),
{
    let mut dashboard = Dashboard::new(settings.presence);

    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!("Polling every {:?} ({:?} presence)", settings.interval, settings.presence);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }

        let fetched = tokio::select! {
            result = tokio::time::timeout(settings.request_timeout, source.fetch()) => result,
            _ = stop.changed() => break,
        };

        match fetched {
            Ok(Ok(sample)) => {
                log::debug!("Sample received: {sample:?}");
                on_frame(dashboard.apply_now(&sample));
            }
            Ok(Err(e)) => log::warn!("Poll failed: {e}"),
            Err(_) => log::warn!("Poll failed: {}", FetchError::Timeout(settings.request_timeout)),
        }
    }

    log::info!("Poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use std::collections::VecDeque;
    use std::sync::{mpsc, Mutex};
    use std::time::Instant;

    /// Plays back a fixed script of results, then keeps returning empty samples.
    struct ScriptedSource(Mutex<VecDeque<Result<Sample, FetchError>>>);

    impl ScriptedSource {
        fn new(script: Vec<Result<Sample, FetchError>>) -> Self {
            Self(Mutex::new(script.into()))
        }
    }

    impl SampleSource for ScriptedSource {
        async fn fetch(&self) -> Result<Sample, FetchError> {
            self.0.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Sample::default()))
        }
    }

    struct HangingSource;

    impl SampleSource for HangingSource {
        async fn fetch(&self) -> Result<Sample, FetchError> {
            std::future::pending().await
        }
    }

    fn fast() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(20),
            request_timeout: Duration::from_secs(1),
            presence: PresencePolicy::Legacy,
        }
    }

    fn reading(temperature: f64, humidity: f64) -> Result<Sample, FetchError> {
        Ok(Sample::from_json(&format!(r#"{{"temperature": {temperature}, "humidity": {humidity}}}"#)).unwrap())
    }

    #[test]
    fn test_failed_poll_does_not_stop_the_schedule() {
        let bad_body = serde_json::from_str::<Sample>("not json").unwrap_err();
        let source = ScriptedSource::new(vec![reading(21.5, 60.0), Err(FetchError::Decode(bad_body)), reading(22.0, 58.0)]);

        let (tx, rx) = mpsc::channel();
        let mut poller = Poller::start(fast(), source, move |frame| {
            let _ = tx.send(frame);
        })
        .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        poller.stop();

        assert_eq!(first.fields.temperature, "21.5");
        assert_eq!(second.fields.temperature, "22");
        assert_eq!(second.chart.unwrap().labels.len(), 2);
    }

    #[test]
    fn test_first_poll_is_immediate() {
        let settings = PollSettings {
            interval: Duration::from_secs(3600),
            ..fast()
        };

        let (tx, rx) = mpsc::channel();
        let _poller = Poller::start(settings, ScriptedSource::new(vec![reading(20.0, 50.0)]), move |frame| {
            let _ = tx.send(frame);
        })
        .unwrap();

        let frame = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(frame.chart.is_some());
    }

    #[test]
    fn test_stop_aborts_a_hanging_request() {
        let settings = PollSettings {
            request_timeout: Duration::from_secs(3600),
            ..fast()
        };

        let mut poller = Poller::start(settings, HangingSource, |_| {}).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(poller.is_running());

        let started = Instant::now();
        poller.stop();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!poller.is_running());
    }

    #[test]
    fn test_request_timeout_keeps_polling() {
        struct SlowThenFast(Mutex<bool>);

        impl SampleSource for SlowThenFast {
            async fn fetch(&self) -> Result<Sample, FetchError> {
                let slow = std::mem::replace(&mut *self.0.lock().unwrap(), false);
                if slow {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                reading(19.0, 45.0)
            }
        }

        let settings = PollSettings {
            request_timeout: Duration::from_millis(50),
            ..fast()
        };

        let (tx, rx) = mpsc::channel();
        let _poller = Poller::start(settings, SlowThenFast(Mutex::new(true)), move |frame| {
            let _ = tx.send(frame);
        })
        .unwrap();

        let frame = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.fields.humidity, "45");
    }
}
