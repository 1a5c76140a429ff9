//! Camera stream settings.
//!
//! These describe the native stream requested from the device. Snapshots
//! sent for validation are always resampled to 480×360, whatever the
//! stream is configured to deliver.

use serde::{Deserialize, Serialize};

/// Largest native edge a video source is asked to deliver.
pub const MAX_NATIVE_EDGE: u32 = 4096;

/// Requested camera stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Device index.
    pub device_id: u32,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Requested frame rate.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

impl CaptureConfig {
    /// Default stream at a different native size.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Requested `(width, height)`.
    pub fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Checks the size and frame rate are within range.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        let (width, height) = self.native_size();
        if width == 0 || height == 0 || width > MAX_NATIVE_EDGE || height > MAX_NATIVE_EDGE {
            return Err(CaptureConfigError::InvalidDimensions { width, height });
        }
        if !(1..=120).contains(&self.fps) {
            return Err(CaptureConfigError::InvalidFrameRate(self.fps));
        }
        Ok(())
    }
}

/// Rejected stream settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureConfigError {
    #[error("native size {width}x{height} outside 1..={MAX_NATIVE_EDGE}")]
    /// A native edge is zero or too large.
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    #[error("frame rate {0} outside 1-120 fps")]
    /// Frame rate outside 1-120.
    InvalidFrameRate(u32),
}
