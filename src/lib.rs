// SPDX-License-Identifier: GPL-3.0-only

//! multicam - one physical camera, many logical views
//!
//! This library multiplexes a single hardware capture stream per physical
//! camera direction across any number of independent logical views, each
//! with its own pause state and recognition feature set.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`registry`]: the single entry point (register/update/capture/
//!   unregister) plus reconciliation onto per-direction sessions
//! - [`session`]: the per-direction state machine owning the hardware
//!   session, capture batching, and recognition admission
//! - [`preview`]: fan-out of each frame to the current output targets
//! - [`recognition`]: throttled detector dispatch with merged results
//! - [`backends`]: the frame source trait the platform driver implements
//! - [`media`]: still image encoding
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::new(source, providers, encoder, detectors,
//!     CoreConfig::default(), events_tx);
//! let id = registry.register(Direction::Back, false, true, false, false);
//! let photo = registry.capture_image(id).await;
//! registry.unregister(id);
//! ```

pub mod backends;
pub mod config;
pub mod errors;
pub mod media;
pub mod preview;
pub mod recognition;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use backends::{
    CameraFrame, DeviceRotation, Direction, ExposureState, FrameData, FrameSource, SessionShare,
    SourceEvent, SourceSession, ViewId,
};
pub use config::CoreConfig;
pub use media::{JpegPhotoEncoder, PhotoEncoder};
pub use preview::{CellProvider, ProviderFactory, RenderTargetProvider};
pub use recognition::{DetectorSet, RecognitionFlags, RecognitionResults};
pub use registry::{Registry, RegistryEvent};
