//! Camera input and snapshot capture.
//!
//! This module provides the video source abstraction and the
//! `FrameCapture` sampler that turns the current video frame into a
//! fixed-size JPEG snapshot for validation.

mod config;
mod frame;
mod snapshot;
mod source;

pub use config::{CaptureConfig, CaptureConfigError};
pub use frame::{CaptureFrame, Frame};
pub use snapshot::{FrameCapture, SNAPSHOT_HEIGHT, SNAPSHOT_QUALITY, SNAPSHOT_WIDTH};
pub use source::{CameraError, MockVideoSource, Playback, VideoSource};
