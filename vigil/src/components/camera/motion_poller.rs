use crate::{devices::hardware::camera::MotionSource, messages::api::motion::MotionState};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use strum_macros::Display;
use tokio::{
    sync::{mpsc::UnboundedSender, Mutex},
    task::JoinHandle,
    time::{sleep, Instant},
};

/// Lifecycle of a motion poller. `Expired` and `Cancelled` are final, a
/// poller is consumed by running it so it can never be restarted.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    /// The polling window elapsed.
    Expired,
    /// A stop was requested through the [`StopSignal`].
    Cancelled,
}

impl PollerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerState::Expired | PollerState::Cancelled)
    }
}

/// Cancellation token shared between the control path and one poller.
/// Holds `true` while polling should go on. Once stopped it stays
/// stopped.
#[derive(Clone, Debug)]
pub struct StopSignal {
    keep_polling: Arc<Mutex<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            keep_polling: Arc::new(Mutex::new(true)),
        }
    }

    /// Ask the poller to stop at its next check.
    pub async fn stop(&self) {
        *self.keep_polling.lock().await = false;
    }

    /// Same as [`StopSignal::stop`] for callers outside the runtime.
    /// Panics when called from within an async context.
    pub fn blocking_stop(&self) {
        *self.keep_polling.blocking_lock() = false;
    }

    pub async fn keep_polling(&self) -> bool {
        *self.keep_polling.lock().await
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Reading taken during one tick, published to the readings channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionReading {
    /// One based tick number.
    pub tick: u64,
    pub state: MotionState,
    /// When the reading came back.
    pub at: DateTime<Utc>,
}

/// Summary of a finished polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Terminal state the poller ended in.
    pub outcome: PollerState,
    pub ticks: u64,
    pub no_motion: u64,
    pub motion: u64,
    pub unknown: u64,
    /// Time from start to the terminal state.
    pub elapsed: Duration,
}

impl PollReport {
    fn record(&mut self, state: MotionState) {
        self.ticks += 1;
        match state {
            MotionState::NoMotion => self.no_motion += 1,
            MotionState::Motion(_) => self.motion += 1,
            MotionState::Unknown => self.unknown += 1,
        }
    }
}

/// Polls a motion source at a fixed interval until the polling window
/// has elapsed or a stop is requested.
///
/// The window is only checked between ticks, so a run lasts until the
/// first check at or after the deadline, up to one interval (plus the
/// service time of the last call) past it. The interval sleep is not cut
/// short by a stop request, which is therefore honoured within one
/// interval.
pub struct MotionPoller {
    state: PollerState,
    duration: Duration,
    interval: Duration,
    stop_signal: StopSignal,
    readings: Option<UnboundedSender<MotionReading>>,
}

impl MotionPoller {
    /// Create an idle poller. A zero interval is raised to one second so
    /// a failing device is not hammered.
    ///
    /// * `duration`: length of the polling window.
    /// * `interval`: sleep between two checks.
    pub fn new(duration: Duration, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!("Motion check interval of zero raised to one second");
            Duration::from_secs(1)
        } else {
            interval
        };

        Self {
            state: PollerState::Idle,
            duration,
            interval,
            stop_signal: StopSignal::new(),
            readings: None,
        }
    }

    /// Observe this poller with an externally owned stop signal.
    pub fn with_stop_signal(mut self, stop_signal: StopSignal) -> Self {
        self.stop_signal = stop_signal;
        self
    }

    /// Publish every reading on a channel.
    pub fn with_readings(mut self, readings: UnboundedSender<MotionReading>) -> Self {
        self.readings = Some(readings);
        self
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Handle that stops this poller.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop_signal.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn transition(&mut self, next: PollerState) {
        tracing::info!(from = %self.state, to = %next, "Motion poller state change");
        self.state = next;
    }

    /// Run the poller to completion against `source`.
    ///
    /// * `source`: where the motion state is read from.
    pub async fn run<S: MotionSource>(mut self, source: &S) -> PollReport {
        let started = Instant::now();
        // Too far out to represent means the window never closes.
        let deadline = started.checked_add(self.duration);
        let mut report = PollReport {
            outcome: PollerState::Running,
            ticks: 0,
            no_motion: 0,
            motion: 0,
            unknown: 0,
            elapsed: Duration::ZERO,
        };

        tracing::info!(
            duration_seconds = self.duration.as_secs(),
            interval_seconds = self.interval.as_secs(),
            "Checking motion detection for {} minutes at {}-second intervals...",
            self.duration.as_secs() / 60,
            self.interval.as_secs()
        );
        self.transition(PollerState::Running);

        loop {
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                self.transition(PollerState::Expired);
                tracing::info!("Motion detection check complete.");
                break;
            }

            if !self.stop_signal.keep_polling().await {
                self.transition(PollerState::Cancelled);
                tracing::info!("Motion detection checking stopped.");
                break;
            }

            let state = source.motion_state().await;
            report.record(state);
            match state {
                MotionState::NoMotion => tracing::info!(tick = report.ticks, "{}", state.message()),
                MotionState::Motion(raw) => {
                    tracing::info!(tick = report.ticks, state = raw, "{}", state.message())
                }
                MotionState::Unknown => tracing::warn!(tick = report.ticks, "{}", state.message()),
            }

            if let Some(readings) = &self.readings {
                let reading = MotionReading {
                    tick: report.ticks,
                    state,
                    at: Utc::now(),
                };
                // The receiver going away only ends publishing, not polling.
                if readings.send(reading).is_err() {
                    self.readings = None;
                }
            }

            sleep(self.interval).await;
        }

        report.outcome = self.state;
        report.elapsed = started.elapsed();
        report
    }
}

/// Unit struct to link poller behaviour to the runtime, detached from
/// owned state like the other controllers.
pub struct MotionPollerController;

impl MotionPollerController {
    /// Spawn the poller as its own task. Returns the task handle, which
    /// resolves to the run's report, and the signal that stops it.
    ///
    /// * `poller`: idle poller to run.
    /// * `source`: motion source shared with the task.
    pub fn start<S>(poller: MotionPoller, source: Arc<S>) -> (JoinHandle<PollReport>, StopSignal)
    where
        S: MotionSource + 'static,
    {
        let stop_signal = poller.stop_signal();
        let handle = tokio::spawn(async move { poller.run(source.as_ref()).await });
        (handle, stop_signal)
    }
}
