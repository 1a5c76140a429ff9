//! Video source abstraction.
//!
//! A video source is anything that can report its native size and playback
//! state and hand out the frame currently being displayed. The live camera
//! binding is supplied by the embedding application; `MockVideoSource` is
//! used by the CLI demo and by tests.

use super::{CaptureConfig, CaptureConfigError, Frame};
use thiserror::Error;

/// Video source failures.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The device is missing, busy or access was refused.
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("invalid stream settings: {0}")]
    /// The stream settings were rejected.
    InvalidConfig(#[from] CaptureConfigError),
    #[error("camera is not open")]
    /// A frame was requested from a closed source.
    NotOpen,
}

/// Playback state of a video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Frames are advancing.
    Playing,
    /// Playback is paused; frames are stale.
    Paused,
    /// The stream has ended.
    Ended,
}

/// A live video feed the snapshot sampler can read from.
pub trait VideoSource {
    /// Opens the source and starts playback.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Stops playback and releases the device.
    fn close(&mut self);

    /// Whether the source has been opened and not closed since.
    fn is_open(&self) -> bool;

    /// Native video size. `(0, 0)` until the first frame is available.
    fn video_size(&self) -> (u32, u32);

    /// Current playback state.
    fn playback(&self) -> Playback;

    /// Returns the frame currently being displayed.
    fn current_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Synthetic video source producing a moving gradient.
#[derive(Debug)]
pub struct MockVideoSource {
    config: Option<CaptureConfig>,
    playback: Playback,
    sequence: u64,
    refusal: Option<String>,
}

impl MockVideoSource {
    /// A closed source; `open` starts playback.
    pub fn new() -> Self {
        Self {
            config: None,
            playback: Playback::Paused,
            sequence: 0,
            refusal: None,
        }
    }

    /// Makes every later `open` fail as if the device refused access.
    pub fn refuse_access(&mut self, reason: impl Into<String>) {
        self.refusal = Some(reason.into());
    }

    /// Overrides the playback state, e.g. to simulate a paused or ended stream.
    pub fn set_playback(&mut self, playback: Playback) {
        self.playback = playback;
    }

    /// Number of frames produced since the last `open`.
    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }
}

impl Default for MockVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for MockVideoSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if let Some(reason) = &self.refusal {
            return Err(CameraError::Unavailable(reason.clone()));
        }
        config.validate()?;
        self.config = Some(config.clone());
        self.playback = Playback::Playing;
        self.sequence = 0;
        tracing::debug!(?config, "Mock video source opened");
        Ok(())
    }

    fn close(&mut self) {
        self.config = None;
        self.playback = Playback::Ended;
        tracing::debug!("Mock video source closed");
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn video_size(&self) -> (u32, u32) {
        self.config
            .as_ref()
            .map(CaptureConfig::native_size)
            .unwrap_or((0, 0))
    }

    fn playback(&self) -> Playback {
        self.playback
    }

    fn current_frame(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotOpen)?;
        let (width, height) = config.native_size();
        let shift = self.sequence as u32;

        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push(((y + shift) % 256) as u8);
                pixels.push(((x ^ y) % 256) as u8);
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, self.sequence))
    }
}
