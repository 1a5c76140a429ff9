//! Frame types: raw video frames and encoded snapshots.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::RgbImage;

/// One decoded video frame, packed RGB8 in row-major order.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl Frame {
    /// Wraps a packed RGB8 buffer.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame in the source's output since it was opened.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether the buffer holds exactly `width * height` RGB pixels.
    pub fn is_valid(&self) -> bool {
        let expected = (self.width as usize) * (self.height as usize) * 3;
        expected > 0 && self.pixels.len() == expected
    }

    /// Wraps the buffer as an image; `None` on a size mismatch.
    pub fn into_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame#{} {}x{} ({} bytes)",
            self.sequence,
            self.width,
            self.height,
            self.pixels.len()
        )
    }
}

/// An encoded snapshot ready to be submitted for validation.
///
/// Created once per scheduler tick and never mutated. It is consumed by
/// the transport and dropped when the request completes.
#[derive(Clone)]
pub struct CaptureFrame {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl CaptureFrame {
    pub(crate) fn new(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            jpeg,
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// Returns the JPEG-encoded bytes.
    #[inline]
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    /// Encoded width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Encoded height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Wall-clock capture time.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Renders the snapshot as a `data:image/jpeg;base64,...` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(&self.jpeg))
    }
}

impl std::fmt::Debug for CaptureFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_bytes", &self.jpeg.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
