//! Snapshot sampling of the live video.
//!
//! Every snapshot is scaled to a fixed 480x360 and JPEG-encoded at a fixed
//! quality so upload size and recognition latency stay bounded regardless
//! of the camera's native resolution.

use super::{CaptureFrame, Playback, VideoSource};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Encoded snapshot width.
pub const SNAPSHOT_WIDTH: u32 = 480;
/// Encoded snapshot height.
pub const SNAPSHOT_HEIGHT: u32 = 360;
/// JPEG quality (0-100) used for every snapshot.
pub const SNAPSHOT_QUALITY: u8 = 80;

/// Samples the current video frame into an encoded snapshot.
///
/// Rendering goes to an off-screen surface owned by this struct. The
/// source's own buffers are only read, never written, so sampling has
/// no effect on whatever is displaying the stream.
pub struct FrameCapture {
    surface: RgbImage,
}

impl FrameCapture {
    /// Allocates the 480x360 off-screen surface.
    pub fn new() -> Self {
        Self {
            surface: RgbImage::new(SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT),
        }
    }

    /// Captures a snapshot, or returns `None` when the source is not ready.
    ///
    /// A source with a zero dimension, or one that is paused or ended, is
    /// transiently unready rather than broken, so this never errors.
    pub fn capture<S: VideoSource + ?Sized>(&mut self, source: &mut S) -> Option<CaptureFrame> {
        let (width, height) = source.video_size();
        if width == 0 || height == 0 || source.playback() != Playback::Playing {
            tracing::debug!(
                width,
                height,
                playback = ?source.playback(),
                "Video not ready for capture"
            );
            return None;
        }

        let frame = match source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "Frame read failed");
                return None;
            }
        };
        let sequence = frame.sequence();
        if !frame.is_valid() {
            tracing::warn!(sequence, "Frame buffer does not match its dimensions");
            return None;
        }
        let image = frame.into_image()?;

        self.render(&image);
        let jpeg = self.encode()?;

        tracing::trace!(
            sequence,
            source_width = width,
            source_height = height,
            jpeg_bytes = jpeg.len(),
            "Captured snapshot"
        );
        Some(CaptureFrame::new(jpeg, SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT))
    }

    fn render(&mut self, image: &RgbImage) {
        if image.dimensions() == (SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT) {
            self.surface.copy_from_slice(image.as_raw());
        } else {
            self.surface = imageops::resize(
                image,
                SNAPSHOT_WIDTH,
                SNAPSHOT_HEIGHT,
                FilterType::Triangle,
            );
        }
    }

    fn encode(&self) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        match JpegEncoder::new_with_quality(&mut buf, SNAPSHOT_QUALITY).encode_image(&self.surface)
        {
            Ok(()) => Some(buf),
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot encoding failed");
                None
            }
        }
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new()
    }
}
