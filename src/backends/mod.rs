// SPDX-License-Identifier: GPL-3.0-only
// Frame source abstraction with trait-based seams for platform drivers

//! Frame source abstraction
//!
//! The concrete camera driver lives behind the [`FrameSource`] trait. A
//! source is opened once per physical direction; everything it reports
//! (open completion, preview frames, still frames, disconnects) arrives as
//! one tagged [`SourceEvent`] stream consumed by that direction's session
//! task, never as callback overrides.
//!
//! ```text
//! ┌─────────────────────┐
//! │      Registry       │  ← reconciliation, one entry point
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    CameraSession    │  ← per-direction state machine
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource trait  │  ← platform driver seam
//! └─────────────────────┘
//! ```

pub mod share;
pub mod types;

pub use share::SessionShare;
pub use types::*;

use crate::errors::SourceError;
use tokio::sync::mpsc;

/// Lifecycle and data events reported by an open frame source
#[derive(Debug)]
pub enum SourceEvent {
    /// The device finished opening
    Opened {
        /// Native capture size, sensor-oriented (unrotated)
        size: (u32, u32),
        /// Sensor mounting angle in degrees, clockwise
        sensor_orientation: u32,
    },
    /// A preview-rate frame
    Frame(CameraFrame),
    /// The out-of-band still frame answering
    /// [`SourceSession::request_still_frame`]
    StillFrame(CameraFrame),
    /// The pending still request failed
    StillFailed,
    /// The device was disconnected
    Disconnected,
    /// The device reported an unrecoverable error
    Error(String),
}

/// Factory for per-direction capture sessions
///
/// `open` must return promptly: acquiring the device is asynchronous, and its
/// outcome arrives as [`SourceEvent::Opened`] or [`SourceEvent::Error`] on
/// `events`. An immediate `Err` means the open could not even be started
/// (no matching device, permission denied).
pub trait FrameSource: Send + Sync {
    /// Begin opening the device for `direction`, delivering events to
    /// `events` until the session is closed.
    fn open(
        &self,
        direction: Direction,
        events: mpsc::UnboundedSender<SourceEvent>,
    ) -> Result<Box<dyn SourceSession>, SourceError>;
}

/// An open hardware capture session for one direction
pub trait SourceSession: Send {
    /// Ask the device for one still-quality frame, delivered as
    /// [`SourceEvent::StillFrame`] (or [`SourceEvent::StillFailed`]).
    fn request_still_frame(&mut self);

    /// Release the device. Idempotent; events stop after this returns.
    fn close(&mut self);
}
