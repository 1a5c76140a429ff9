//! Continuous capture-and-validate scheduler.
//!
//! While the camera is active a fixed-period timer drives the loop:
//!
//! ```text
//! tick → admit? → capture delay → FrameCapture → ValidationTransport → StatusStateMachine
//!          ↓ no                         ↓ none
//!        (silent)                     (silent)
//! ```
//!
//! Everything runs on one task. Timer ticks, the capture delay, transport
//! completions and the status reset are multiplexed with `tokio::select!`,
//! so [`SchedulerState`] is only ever touched from that task and needs no
//! locking. At most one transport call is outstanding at a time; the
//! `in_flight` flag is the gate.

mod config;
mod state;

pub use config::{SchedulerConfig, SchedulerConfigError};
pub use state::{Admission, AttemptId, SchedulerState};

use crate::camera::{lock_source, CameraState, SharedSource};
use crate::capture::FrameCapture;
use crate::metrics::MetricsRegistry;
use crate::status::{StatusStateMachine, ValidationStatus};
use crate::transport::{TransportError, ValidationOutcome, ValidationTransport};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

type Completion = (AttemptId, Result<ValidationOutcome, TransportError>);

/// Drives capture and validation while the camera is active.
pub struct ValidationScheduler {
    config: SchedulerConfig,
    source: SharedSource,
    transport: Arc<dyn ValidationTransport>,
    capture: FrameCapture,
    status: StatusStateMachine,
    state: SchedulerState,
    published: watch::Sender<SchedulerState>,
    metrics: MetricsRegistry,
    camera_session: u64,
}

impl ValidationScheduler {
    /// Creates a scheduler reading from `source` and validating through
    /// `transport`. Fails if the timing configuration is unusable.
    pub fn new(
        config: SchedulerConfig,
        source: SharedSource,
        transport: Arc<dyn ValidationTransport>,
        metrics: MetricsRegistry,
    ) -> Result<Self, SchedulerConfigError> {
        config.validate()?;
        let status = StatusStateMachine::new(config.success_reset());
        let (published, _) = watch::channel(SchedulerState::default());
        Ok(Self {
            config,
            source,
            transport,
            capture: FrameCapture::new(),
            status,
            state: SchedulerState::new(),
            published,
            metrics,
            camera_session: 0,
        })
    }

    /// Subscribes to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<ValidationStatus> {
        self.status.subscribe()
    }

    /// Subscribes to scheduler state changes (activation, dispatch, release).
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.published.subscribe()
    }

    /// Current throttle and in-flight state.
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Runs the loop until `shutdown` resolves or the camera lifecycle is dropped.
    ///
    /// Deactivating the camera stops the timer and drops a pending capture,
    /// but a request already dispatched is not cancelled: its result is
    /// still applied to the status when it arrives. A camera restart that
    /// lands between two polls is treated as a deactivation followed by an
    /// activation.
    pub async fn run<F>(mut self, mut camera: watch::Receiver<CameraState>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker: Option<Interval> = None;
        // Capture deadline and the tick that admitted it
        let mut capture_at: Option<(Instant, Instant)> = None;
        let mut pending: FuturesUnordered<BoxFuture<'static, Completion>> =
            FuturesUnordered::new();

        let initial = camera.borrow_and_update().clone();
        if initial.active {
            self.camera_session = initial.session;
            ticker = Some(self.activate());
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = camera.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Camera lifecycle dropped, stopping scheduler");
                        break;
                    }
                    let (active, session) = {
                        let current = camera.borrow_and_update();
                        (current.active, current.session)
                    };
                    let restarted = active && session != self.camera_session;
                    if self.state.is_active() && (!active || restarted) {
                        ticker = None;
                        capture_at = None;
                        self.deactivate();
                    }
                    if active && !self.state.is_active() {
                        self.camera_session = session;
                        ticker = Some(self.activate());
                    }
                }
                _ = next_tick(&mut ticker) => {
                    let now = Instant::now();
                    if self.on_tick(now) {
                        capture_at = Some((now + self.config.capture_delay(), now));
                    }
                }
                _ = sleep_until(capture_at.map(|(deadline, _)| deadline)) => {
                    if let Some((_, tick_at)) = capture_at.take() {
                        if let Some(request) = self.dispatch(tick_at) {
                            pending.push(request);
                        }
                    }
                }
                Some((id, outcome)) = pending.next(), if !pending.is_empty() => {
                    self.complete(id, outcome, Instant::now());
                }
                _ = sleep_until(self.status.reset_deadline()) => {
                    self.status.expire(Instant::now());
                }
            }
        }

        tracing::info!(
            attempts = self.state.attempts(),
            "Validation scheduler stopped"
        );
    }

    fn activate(&mut self) -> Interval {
        self.state.activate();
        self.publish();

        let period = self.config.tick_period();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            period_ms = period.as_millis() as u64,
            min_gap_ms = self.config.min_gap_ms,
            "Continuous validation started"
        );
        ticker
    }

    fn deactivate(&mut self) {
        self.state.deactivate();
        self.metrics.set_in_flight(false);
        self.publish();
        tracing::info!("Continuous validation stopped");
    }

    /// Returns `true` when the tick should go on to capture.
    ///
    /// Skips are expected and silent.
    fn on_tick(&mut self, now: Instant) -> bool {
        let admission = self.state.admit(now, self.config.min_gap());
        self.metrics.record_tick(admission);
        match admission {
            Admission::Proceed => true,
            Admission::InFlight | Admission::Throttled | Admission::Inactive => {
                tracing::trace!(?admission, "Tick skipped");
                false
            }
        }
    }

    /// Captures and sends the frame for the tick at `tick_at`.
    ///
    /// The throttle is measured from the tick, not from the end of the
    /// capture delay.
    fn dispatch(&mut self, tick_at: Instant) -> Option<BoxFuture<'static, Completion>> {
        if self.state.admit(tick_at, self.config.min_gap()) != Admission::Proceed {
            return None;
        }

        let frame = {
            let mut source = lock_source(&self.source);
            self.capture.capture(&mut *source)
        };
        let Some(frame) = frame else {
            self.metrics.record_capture_not_ready();
            return None;
        };

        let id = self.state.begin_attempt(tick_at);
        self.metrics.record_attempt();
        self.metrics.set_in_flight(true);
        self.publish();
        if self.config.show_processing {
            self.status.mark_processing();
        }
        tracing::debug!(attempt = ?id, jpeg_bytes = frame.jpeg().len(), "Starting validation");

        let transport = Arc::clone(&self.transport);
        Some(Box::pin(async move { (id, transport.validate(frame).await) }))
    }

    fn complete(
        &mut self,
        id: AttemptId,
        outcome: Result<ValidationOutcome, TransportError>,
        now: Instant,
    ) {
        self.metrics.record_outcome(&outcome);
        self.status.apply(outcome, now);
        if self.state.complete(id) {
            self.metrics.set_in_flight(false);
            self.publish();
        } else {
            tracing::debug!(attempt = ?id, "Late result applied after deactivation");
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, MockVideoSource, VideoSource};
    use crate::transport::ValidationResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct AlwaysGranted;

    #[async_trait]
    impl ValidationTransport for AlwaysGranted {
        async fn validate(
            &self,
            _frame: crate::capture::CaptureFrame,
        ) -> Result<ValidationOutcome, TransportError> {
            Ok(ValidationOutcome::Completed(ValidationResult {
                granted: true,
                liveness_passed: true,
                confidence: 0.9,
                user_id: None,
                user_name: None,
                passage_count: None,
                message: None,
            }))
        }
    }

    fn scheduler(source: SharedSource, config: SchedulerConfig) -> ValidationScheduler {
        ValidationScheduler::new(
            config,
            source,
            Arc::new(AlwaysGranted),
            MetricsRegistry::new().unwrap(),
        )
        .unwrap()
    }

    fn open_source() -> SharedSource {
        let mut mock = MockVideoSource::new();
        mock.open(&CaptureConfig::with_dimensions(64, 48)).unwrap();
        Arc::new(Mutex::new(mock))
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_skips_while_in_flight() {
        let mut scheduler = scheduler(open_source(), SchedulerConfig::default());
        scheduler.state.activate();

        let now = Instant::now();
        assert!(scheduler.on_tick(now));
        assert!(scheduler.dispatch(now).is_some());
        assert!(scheduler.state().in_flight());

        let later = now + std::time::Duration::from_secs(60);
        assert!(!scheduler.on_tick(later));
        assert!(scheduler.dispatch(later).is_none());
        assert_eq!(scheduler.metrics.snapshot().skipped_in_flight, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unready_capture_leaves_state_untouched() {
        let source: SharedSource = Arc::new(Mutex::new(MockVideoSource::new()));
        let mut scheduler = scheduler(source, SchedulerConfig::default());
        scheduler.state.activate();

        assert!(scheduler.dispatch(Instant::now()).is_none());
        assert!(!scheduler.state().in_flight());
        assert!(scheduler.state().last_attempt_at().is_none());
        assert_eq!(scheduler.metrics.snapshot().capture_not_ready, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_releases_and_updates_status() {
        let mut scheduler = scheduler(open_source(), SchedulerConfig::default());
        scheduler.state.activate();
        let now = Instant::now();

        let request = scheduler.dispatch(now).unwrap();
        let (id, outcome) = request.await;
        scheduler.complete(id, outcome, now);

        assert!(!scheduler.state().in_flight());
        assert!(matches!(
            scheduler.status.current(),
            ValidationStatus::Success(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_processing() {
        let config = SchedulerConfig {
            show_processing: true,
            ..Default::default()
        };
        let mut scheduler = scheduler(open_source(), config);
        scheduler.state.activate();

        let _request = scheduler.dispatch(Instant::now()).unwrap();
        assert_eq!(scheduler.status.current(), ValidationStatus::Processing);
    }

    #[test]
    fn test_zero_tick_period_is_rejected() {
        let config = SchedulerConfig {
            tick_period_ms: 0,
            ..Default::default()
        };
        let result = ValidationScheduler::new(
            config,
            open_source(),
            Arc::new(AlwaysGranted),
            MetricsRegistry::new().unwrap(),
        );
        assert!(matches!(result, Err(SchedulerConfigError::ZeroTickPeriod)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_counts_from_tick_time() {
        let mut scheduler = scheduler(open_source(), SchedulerConfig::default());
        scheduler.state.activate();
        let tick_at = Instant::now();

        let request = scheduler.dispatch(tick_at).unwrap();
        assert_eq!(scheduler.state().last_attempt_at(), Some(tick_at));
        let (id, outcome) = request.await;
        scheduler.complete(id, outcome, tick_at);

        let gap = scheduler.config.min_gap();
        assert!(!scheduler.on_tick(tick_at + gap - std::time::Duration::from_millis(1)));
        assert!(scheduler.on_tick(tick_at + gap));
    }
}
