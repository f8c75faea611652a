// SPDX-License-Identifier: GPL-3.0-only

//! Core configuration

use serde::{Deserialize, Serialize};

/// Recognition pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Minimum milliseconds between admitted recognition dispatches
    pub interval_ms: u64,
    /// Downscale factor applied to frames before recognition, in (0, 1]
    pub scale: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            scale: 0.2,
        }
    }
}

/// Still capture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// JPEG quality for encoded still images (1-100)
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { jpeg_quality: 80 }
    }
}

/// Top-level configuration for the multicam core
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Recognition throttle and scaling
    pub recognition: RecognitionConfig,
    /// Still capture encoding
    pub capture: CaptureConfig,
}
