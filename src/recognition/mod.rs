// SPDX-License-Identifier: GPL-3.0-only

//! Recognition dispatch
//!
//! A throttled low-resolution frame is fanned out to the enabled detectors.
//! Detectors are opaque async functions behind the [`Detector`] trait; each
//! one settles independently, a failure degrades only its own field, and the
//! merged result completes once every enabled detector has settled.

pub mod scale;

use crate::backends::types::CameraFrame;
use crate::errors::DetectorError;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// The detector categories one dispatch must run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecognitionFlags {
    /// Run text recognition
    pub text: bool,
    /// Run barcode scanning
    pub barcodes: bool,
    /// Run face detection
    pub faces: bool,
}

impl RecognitionFlags {
    /// Whether any category is enabled
    pub fn any(self) -> bool {
        self.text || self.barcodes || self.faces
    }

    /// Category-wise union
    pub fn union(self, other: Self) -> Self {
        Self {
            text: self.text || other.text,
            barcodes: self.barcodes || other.barcodes,
            faces: self.faces || other.faces,
        }
    }
}

/// Merged output of one dispatch.
///
/// A `None` field was either not requested or its detector failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecognitionResults {
    /// Recognized text blocks
    pub text: Option<Vec<String>>,
    /// Decoded barcode payloads
    pub barcodes: Option<Vec<String>>,
    /// Whether at least one face is present
    pub face: Option<bool>,
}

impl RecognitionResults {
    /// Restrict the result to the categories in `flags`.
    ///
    /// A consumer only ever sees the categories it asked for, even when the
    /// dispatch computed more for other consumers.
    pub fn masked(&self, flags: RecognitionFlags) -> Self {
        Self {
            text: if flags.text { self.text.clone() } else { None },
            barcodes: if flags.barcodes {
                self.barcodes.clone()
            } else {
                None
            },
            face: if flags.faces { self.face } else { None },
        }
    }
}

/// One recognition category implementation
pub trait Detector: Send + Sync {
    /// What this detector produces on success
    type Output: Send + 'static;

    /// Analyze a low-resolution frame
    fn detect(&self, frame: Arc<CameraFrame>) -> BoxFuture<'static, Result<Self::Output, DetectorError>>;
}

/// Text recognizer: recognized blocks as strings
pub type TextDetector = dyn Detector<Output = Vec<String>>;
/// Barcode scanner: decoded payloads as strings
pub type BarcodeDetector = dyn Detector<Output = Vec<String>>;
/// Face detector: whether any face is present
pub type FaceDetector = dyn Detector<Output = bool>;

/// The detector implementations available to a dispatcher.
///
/// A category with no implementation always resolves to an absent field.
#[derive(Default)]
pub struct DetectorSet {
    /// Text recognizer, if available
    pub text: Option<Box<TextDetector>>,
    /// Barcode scanner, if available
    pub barcodes: Option<Box<BarcodeDetector>>,
    /// Face detector, if available
    pub faces: Option<Box<FaceDetector>>,
}

/// Runs the enabled detectors over one frame and merges their outputs
pub struct RecognitionDispatcher {
    detectors: DetectorSet,
}

impl RecognitionDispatcher {
    /// Create a dispatcher over the given detectors
    pub fn new(detectors: DetectorSet) -> Self {
        Self { detectors }
    }

    /// Run the detectors named by `flags` over `frame`.
    ///
    /// Disabled categories are skipped entirely: no detector call is made
    /// and the field stays `None`. A failing detector degrades its own field
    /// and never fails the dispatch.
    pub async fn dispatch(
        &self,
        frame: Arc<CameraFrame>,
        flags: RecognitionFlags,
    ) -> RecognitionResults {
        let text = run_category("text", flags.text, self.detectors.text.as_deref(), &frame);
        let barcodes = run_category(
            "barcodes",
            flags.barcodes,
            self.detectors.barcodes.as_deref(),
            &frame,
        );
        let face = run_category("face", flags.faces, self.detectors.faces.as_deref(), &frame);

        let (text, barcodes, face) = futures::join!(text, barcodes, face);

        RecognitionResults {
            text,
            barcodes,
            face,
        }
    }
}

async fn run_category<T: Send + 'static>(
    category: &'static str,
    enabled: bool,
    detector: Option<&dyn Detector<Output = T>>,
    frame: &Arc<CameraFrame>,
) -> Option<T> {
    if !enabled {
        return None;
    }
    let detector = detector?;
    match detector.detect(Arc::clone(frame)).await {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(category, error = %e, "detector failed");
            None
        }
    }
}

/// Admission control for recognition dispatches.
///
/// A dispatch is admitted only when none is in flight and at least the
/// configured interval has passed since the last admitted dispatch started.
/// Rejected frames are dropped; recognition always works on the freshest
/// admitted frame.
pub struct RecognitionThrottle {
    interval: Duration,
    last_admitted: Option<Instant>,
    busy: Arc<AtomicBool>,
}

impl RecognitionThrottle {
    /// Create a throttle with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Try to admit a dispatch at `now`.
    ///
    /// On success the returned guard marks a dispatch in flight until it is
    /// dropped (after delivery, or on any early abort).
    pub fn try_admit(&mut self, now: Instant) -> Option<DispatchGuard> {
        if self.busy.load(Ordering::Acquire) {
            return None;
        }
        if let Some(last) = self.last_admitted {
            if now.duration_since(last) < self.interval {
                return None;
            }
        }
        self.busy.store(true, Ordering::Release);
        self.last_admitted = Some(now);
        Some(DispatchGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

/// Marks one dispatch in flight; dropping it re-opens admission
#[derive(Debug)]
pub struct DispatchGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
