// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! The session hands the captured frame plus its current quarter-turn count
//! to a [`PhotoEncoder`]; the encoded bytes go to every requester in the
//! capture batch.

pub mod jpeg;

pub use jpeg::JpegPhotoEncoder;

use crate::backends::types::CameraFrame;
use crate::errors::CaptureError;

/// Encodes a captured frame into an interchange format with the display
/// orientation applied
pub trait PhotoEncoder: Send + Sync {
    /// Encode `frame`, rotated by `quarter_turns`
    fn encode(&self, frame: &CameraFrame, quarter_turns: u8) -> Result<Vec<u8>, CaptureError>;
}
