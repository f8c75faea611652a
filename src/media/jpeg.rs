// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for still captures

use crate::backends::types::CameraFrame;
use crate::errors::CaptureError;
use crate::media::PhotoEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbaImage};
use tracing::trace;

/// JPEG encoder applying the display rotation before compression
pub struct JpegPhotoEncoder {
    quality: u8,
}

impl JpegPhotoEncoder {
    /// Create an encoder with the given JPEG quality (1-100)
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegPhotoEncoder {
    fn default() -> Self {
        Self::new(80)
    }
}

impl PhotoEncoder for JpegPhotoEncoder {
    fn encode(&self, frame: &CameraFrame, quarter_turns: u8) -> Result<Vec<u8>, CaptureError> {
        let start = std::time::Instant::now();

        let packed = frame.packed_rgba();
        let rgba = RgbaImage::from_raw(frame.width, frame.height, packed).ok_or_else(|| {
            CaptureError::Encoding("frame dimensions do not match pixel data".into())
        })?;

        let rotated = match quarter_turns % 4 {
            1 => imageops::rotate90(&rgba),
            2 => imageops::rotate180(&rgba),
            3 => imageops::rotate270(&rgba),
            _ => rgba,
        };

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(rotated).to_rgb8();

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(encoder)
            .map_err(|e| CaptureError::Encoding(e.to_string()))?;

        trace!(
            width = frame.width,
            height = frame.height,
            quarter_turns,
            bytes = out.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "encoded still image"
        );

        Ok(out)
    }
}
