// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the multicam core
//!
//! No error here is fatal to the process: source errors tear down one
//! direction's session (which may reopen on the next demand change), capture
//! errors fail one batch, and detector errors degrade one result field.

use thiserror::Error;

/// Errors opening or running a frame source
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// No device matches the requested direction, or access was denied
    #[error("no camera device available: {0}")]
    DeviceUnavailable(String),
    /// The session could not be configured; treated as transient
    #[error("session configuration failed: {0}")]
    ConfigurationFailed(String),
    /// The device went away while in use
    #[error("camera disconnected")]
    Disconnected,
    /// The device reported an error
    #[error("device error: {0}")]
    Device(String),
}

/// Errors producing a still image
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// The device aborted the capture request
    #[error("capture aborted by the device")]
    Aborted,
    /// Encoding the captured frame failed
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// Errors from a recognition detector
#[derive(Debug, Clone, Error)]
#[error("detector failed: {0}")]
pub struct DetectorError(pub String);

/// Errors from the render target provider
#[derive(Debug, Clone, Error)]
pub enum PreviewError {
    /// A render destination could not be created or is gone
    #[error("render destination unavailable: {0}")]
    Destination(String),
    /// Drawing into an existing destination failed
    #[error("draw failed: {0}")]
    Draw(String),
}
