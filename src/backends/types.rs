// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame source abstraction

//! Shared types for camera frame sources

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Identifier of a logical camera view, allocated by the registry.
///
/// The id doubles as the identity of the view's preview output target.
pub type ViewId = i64;

/// Physical camera unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Selfie-facing camera
    Front,
    /// World-facing camera
    Back,
}

impl Direction {
    /// Both physical directions, in wire order
    pub const ALL: [Direction; 2] = [Direction::Front, Direction::Back];

    /// Decode the wire representation used by the command channel
    /// (0 = Front, 1 = Back)
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Direction::Front),
            1 => Some(Direction::Back),
            _ => None,
        }
    }

    /// Wire representation (0 = Front, 1 = Back)
    pub fn index(self) -> i64 {
        match self {
            Direction::Front => 0,
            Direction::Back => 1,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Front => write!(f, "front"),
            Direction::Back => write!(f, "back"),
        }
    }
}

/// Display rotation quadrant derived from the device-orientation signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceRotation {
    /// Natural orientation
    #[default]
    Deg0,
    /// Rotated 90 degrees
    Deg90,
    /// Upside down
    Deg180,
    /// Rotated 270 degrees
    Deg270,
}

impl DeviceRotation {
    /// Rotation in degrees
    pub fn degrees(self) -> u32 {
        match self {
            DeviceRotation::Deg0 => 0,
            DeviceRotation::Deg90 => 90,
            DeviceRotation::Deg180 => 180,
            DeviceRotation::Deg270 => 270,
        }
    }

    /// Exact quadrant from a rotation value that is already a multiple of 90
    /// (normalised first); anything else falls back to the natural
    /// orientation.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => DeviceRotation::Deg90,
            180 => DeviceRotation::Deg180,
            270 => DeviceRotation::Deg270,
            _ => DeviceRotation::Deg0,
        }
    }

    /// Quantize a raw physical device orientation (degrees clockwise from the
    /// natural position) to the display rotation quadrant it corresponds to.
    ///
    /// A device tilted clockwise shows a display rotated counter-clockwise,
    /// so the quadrants run in reverse.
    pub fn from_orientation_degrees(degrees: i32) -> Self {
        const QUADRANTS: [DeviceRotation; 4] = [
            DeviceRotation::Deg0,
            DeviceRotation::Deg270,
            DeviceRotation::Deg180,
            DeviceRotation::Deg90,
        ];
        let index = ((degrees.rem_euclid(360) + 45) % 360) / 90;
        QUADRANTS[index as usize]
    }
}

impl std::fmt::Display for DeviceRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Exposure convergence state reported with each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExposureState {
    /// Exposure has converged or is locked
    Converged,
    /// Exposure is still adjusting
    Searching,
    /// The platform does not report exposure state
    #[default]
    Unknown,
}

impl ExposureState {
    /// Whether a still capture may be issued in this state.
    ///
    /// Platforms without an exposure signal report `Unknown`, which admits
    /// captures unconditionally.
    pub fn allows_capture(self) -> bool {
        !matches!(self, ExposureState::Searching)
    }
}

/// Frame pixel storage - refcounted so one frame can be shared across the
/// fan-out, the capture path, and recognition without copying.
#[derive(Clone)]
pub struct FrameData(Arc<[u8]>);

impl FrameData {
    /// Wrap pre-existing RGBA bytes
    pub fn from_vec(data: Vec<u8>) -> Self {
        FrameData(Arc::from(data))
    }

    /// Length of the pixel data in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the pixel data is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameData({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for FrameData {
    fn from(data: Vec<u8>) -> Self {
        FrameData::from_vec(data)
    }
}

/// A single RGBA frame from a camera source
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// RGBA pixel data, `stride` bytes per row
    pub data: FrameData,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row (>= width * 4; rows may carry padding)
    pub stride: u32,
    /// Exposure state at capture time
    pub exposure: ExposureState,
    /// Monotonic capture timestamp
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from tightly-packed RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            data: FrameData::from_vec(data),
            width,
            height,
            stride: width * 4,
            exposure: ExposureState::Unknown,
            captured_at: Instant::now(),
        }
    }

    /// Copy the pixel data into a tightly-packed RGBA buffer, dropping any
    /// per-row stride padding.
    pub fn packed_rgba(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;

        if stride == width * 4 && self.data.len() == width * height * 4 {
            return self.data.to_vec();
        }

        let mut packed = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * 4;
            if row_end <= self.data.len() {
                packed.extend_from_slice(&self.data[row_start..row_end]);
            }
        }
        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_wire_roundtrip() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_index(direction.index()), Some(direction));
        }
        assert_eq!(Direction::from_index(2), None);
    }

    #[test]
    fn orientation_quantizer_reverses_quadrants() {
        assert_eq!(
            DeviceRotation::from_orientation_degrees(0),
            DeviceRotation::Deg0
        );
        assert_eq!(
            DeviceRotation::from_orientation_degrees(85),
            DeviceRotation::Deg270
        );
        assert_eq!(
            DeviceRotation::from_orientation_degrees(180),
            DeviceRotation::Deg180
        );
        assert_eq!(
            DeviceRotation::from_orientation_degrees(265),
            DeviceRotation::Deg90
        );
        // 45° away rounds to the nearest quadrant
        assert_eq!(
            DeviceRotation::from_orientation_degrees(359),
            DeviceRotation::Deg0
        );
        assert_eq!(
            DeviceRotation::from_orientation_degrees(-10),
            DeviceRotation::Deg0
        );
    }

    #[test]
    fn searching_exposure_blocks_capture() {
        assert!(ExposureState::Converged.allows_capture());
        assert!(ExposureState::Unknown.allows_capture());
        assert!(!ExposureState::Searching.allows_capture());
    }

    #[test]
    fn packed_rgba_strips_stride_padding() {
        // 2x2 frame with 2 bytes of padding per row
        let data = vec![
            255, 0, 0, 255, 0, 255, 0, 255, 0, 0, // row 0 + padding
            0, 0, 255, 255, 255, 255, 255, 255, 0, 0, // row 1 + padding
        ];
        let frame = CameraFrame {
            data: FrameData::from_vec(data),
            width: 2,
            height: 2,
            stride: 10,
            exposure: ExposureState::Unknown,
            captured_at: Instant::now(),
        };

        let packed = frame.packed_rgba();
        assert_eq!(packed.len(), 16);
        assert_eq!(&packed[0..4], &[255, 0, 0, 255]);
        assert_eq!(&packed[12..16], &[255, 255, 255, 255]);
    }
}
