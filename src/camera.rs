//! Camera lifecycle.
//!
//! Starts and stops the media stream and publishes its active/error state
//! on a watch channel. The validation scheduler subscribes to that channel;
//! it never touches the device itself.

use crate::capture::{CameraError, CaptureConfig, VideoSource};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// A video source shared between the lifecycle and the capture loop.
pub type SharedSource = Arc<Mutex<dyn VideoSource + Send>>;

/// Locks a shared source. A poisoned lock still guards a usable source,
/// so the guard is recovered instead of propagating the panic.
pub fn lock_source(source: &SharedSource) -> MutexGuard<'_, dyn VideoSource + Send + 'static> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observable camera state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraState {
    /// Whether the media stream is running.
    pub active: bool,
    /// Increments on every successful start, so a stop immediately
    /// followed by a start is still visible as a new session.
    pub session: u64,
    /// Last start failure, cleared by the next successful start.
    pub error: Option<String>,
}

/// Handle to a running media stream.
#[derive(Clone)]
pub struct MediaHandle {
    session: u64,
    source: SharedSource,
}

impl MediaHandle {
    /// Increments on every successful start.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// The source this session reads from.
    pub fn source(&self) -> &SharedSource {
        &self.source
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("session", &self.session)
            .finish()
    }
}

/// Starts and stops the camera and publishes [`CameraState`].
pub struct CameraLifecycle {
    source: SharedSource,
    config: CaptureConfig,
    state: watch::Sender<CameraState>,
    session: u64,
}

impl CameraLifecycle {
    /// Creates a stopped lifecycle for `source`, opened with `config` on start.
    pub fn new(source: SharedSource, config: CaptureConfig) -> Self {
        let (state, _) = watch::channel(CameraState::default());
        Self {
            source,
            config,
            state,
            session: 0,
        }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CameraState> {
        self.state.subscribe()
    }

    /// Opens the device and marks the camera active.
    ///
    /// Starting an already active camera returns a handle to the running
    /// session. On failure the error is published and the camera stays
    /// inactive.
    pub fn start(&mut self) -> Result<MediaHandle, CameraError> {
        if self.is_active() {
            return Ok(self.handle());
        }

        let opened = lock_source(&self.source).open(&self.config);
        if let Err(e) = opened {
            tracing::warn!(error = %e, "Camera failed to start");
            self.state.send_replace(CameraState {
                active: false,
                session: self.session,
                error: Some(e.to_string()),
            });
            return Err(e);
        }

        self.session += 1;
        self.state.send_replace(CameraState {
            active: true,
            session: self.session,
            error: None,
        });
        tracing::info!(session = self.session, "Camera started");
        Ok(self.handle())
    }

    /// Closes the device and marks the camera inactive.
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        lock_source(&self.source).close();
        self.state.send_modify(|state| state.active = false);
        tracing::info!(session = self.session, "Camera stopped");
    }

    /// Whether the stream is running.
    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// Last start failure, if any.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    fn handle(&self) -> MediaHandle {
        MediaHandle {
            session: self.session,
            source: Arc::clone(&self.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockVideoSource;

    fn lifecycle(config: CaptureConfig) -> CameraLifecycle {
        let source: SharedSource = Arc::new(Mutex::new(MockVideoSource::new()));
        CameraLifecycle::new(source, config)
    }

    #[test]
    fn test_start_stop_publishes_state() {
        let mut camera = lifecycle(CaptureConfig::with_dimensions(64, 48));
        let rx = camera.subscribe();
        assert!(!rx.borrow().active);

        let handle = camera.start().unwrap();
        assert_eq!(handle.session(), 1);
        assert!(rx.borrow().active);
        assert!(lock_source(handle.source()).is_open());

        camera.stop();
        assert!(!rx.borrow().active);
        assert!(!lock_source(handle.source()).is_open());
    }

    #[test]
    fn test_start_twice_keeps_session() {
        let mut camera = lifecycle(CaptureConfig::with_dimensions(64, 48));
        let first = camera.start().unwrap();
        let second = camera.start().unwrap();
        assert_eq!(first.session(), second.session());

        camera.stop();
        let third = camera.start().unwrap();
        assert_eq!(third.session(), 2);
    }

    #[test]
    fn test_restart_publishes_new_session() {
        let mut camera = lifecycle(CaptureConfig::with_dimensions(64, 48));
        let mut rx = camera.subscribe();
        camera.start().unwrap();
        assert_eq!(rx.borrow_and_update().session, 1);

        // Both updates land before the receiver looks again
        camera.stop();
        camera.start().unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(state.active);
        assert_eq!(state.session, 2);
    }

    #[test]
    fn test_failed_start_records_error() {
        let mut camera = lifecycle(CaptureConfig::with_dimensions(0, 0));

        assert!(matches!(camera.start(), Err(CameraError::InvalidConfig(_))));
        assert!(!camera.is_active());
        assert!(camera.error().is_some());
    }

    #[test]
    fn test_refused_device_is_published() {
        let mut mock = MockVideoSource::new();
        mock.refuse_access("permission denied");
        let source: SharedSource = Arc::new(Mutex::new(mock));
        let mut camera = CameraLifecycle::new(source, CaptureConfig::default());
        let states = camera.subscribe();

        assert!(matches!(camera.start(), Err(CameraError::Unavailable(_))));
        let state = states.borrow().clone();
        assert!(!state.active);
        assert_eq!(
            state.error.as_deref(),
            Some("camera unavailable: permission denied")
        );
    }
}
