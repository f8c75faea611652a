// SPDX-License-Identifier: GPL-3.0-only
#![allow(dead_code)]

//! Shared fakes for integration tests: a scriptable frame source, a
//! recording render provider, canned detectors, and a deterministic encoder.

use futures::future::BoxFuture;
use futures::FutureExt;
use multicam::backends::{
    CameraFrame, Direction, ExposureState, FrameSource, SourceEvent, SourceSession, ViewId,
};
use multicam::errors::{CaptureError, DetectorError, PreviewError, SourceError};
use multicam::media::PhotoEncoder;
use multicam::preview::transform::Mat4;
use multicam::preview::{ProviderFactory, RenderTargetProvider};
use multicam::recognition::Detector;
use multicam::registry::RegistryEvent;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// A frame for tests, tightly packed, exposure `Unknown`
pub fn test_frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::from_rgba(width, height, vec![128u8; (width * height * 4) as usize])
}

/// A frame with an explicit exposure state
pub fn frame_with_exposure(width: u32, height: u32, exposure: ExposureState) -> CameraFrame {
    let mut frame = test_frame(width, height);
    frame.exposure = exposure;
    frame
}

/// Everything a test needs to drive one opened fake device
#[derive(Clone)]
pub struct OpenHandle {
    pub direction: Direction,
    pub events: mpsc::UnboundedSender<SourceEvent>,
    pub stills: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl OpenHandle {
    pub fn still_requests(&self) -> usize {
        self.stills.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Scriptable frame source. Every `open` is recorded; events are injected
/// by the test through the recorded [`OpenHandle`].
#[derive(Default)]
pub struct FakeSource {
    pub opens: Arc<Mutex<Vec<OpenHandle>>>,
    /// Refuse to even start opening
    pub fail_open: bool,
    /// Immediately report `Opened` with this (size, sensor_orientation)
    pub auto_open: Option<((u32, u32), u32)>,
    /// Answer every still request with a frame of this size
    pub auto_still: Option<(u32, u32)>,
}

impl FakeSource {
    pub fn auto(size: (u32, u32), sensor_orientation: u32) -> Self {
        Self {
            auto_open: Some((size, sensor_orientation)),
            auto_still: Some(size),
            ..Default::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().unwrap().len()
    }

    pub fn last_open(&self) -> OpenHandle {
        self.opens
            .lock()
            .unwrap()
            .last()
            .expect("no open recorded")
            .clone()
    }
}

impl FrameSource for FakeSource {
    fn open(
        &self,
        direction: Direction,
        events: mpsc::UnboundedSender<SourceEvent>,
    ) -> Result<Box<dyn SourceSession>, SourceError> {
        if self.fail_open {
            return Err(SourceError::DeviceUnavailable("fake device refused".into()));
        }
        if let Some((size, sensor_orientation)) = self.auto_open {
            let _ = events.send(SourceEvent::Opened {
                size,
                sensor_orientation,
            });
        }
        let stills = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        self.opens.lock().unwrap().push(OpenHandle {
            direction,
            events: events.clone(),
            stills: Arc::clone(&stills),
            closed: Arc::clone(&closed),
        });
        Ok(Box::new(FakeSession {
            events,
            stills,
            closed,
            auto_still: self.auto_still,
        }))
    }
}

struct FakeSession {
    events: mpsc::UnboundedSender<SourceEvent>,
    stills: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    auto_still: Option<(u32, u32)>,
}

impl SourceSession for FakeSession {
    fn request_still_frame(&mut self) {
        self.stills.fetch_add(1, Ordering::SeqCst);
        if let Some((width, height)) = self.auto_still {
            let _ = self
                .events
                .send(SourceEvent::StillFrame(test_frame(width, height)));
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Provider operations recorded across directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOp {
    Create(Direction, ViewId),
    Destroy(Direction, ViewId),
    Draw(Direction, ViewId),
}

pub struct SharedProvider {
    direction: Direction,
    log: Arc<Mutex<Vec<ProviderOp>>>,
}

impl RenderTargetProvider for SharedProvider {
    fn create_destination(&mut self, id: ViewId) -> Result<(), PreviewError> {
        self.log
            .lock()
            .unwrap()
            .push(ProviderOp::Create(self.direction, id));
        Ok(())
    }

    fn destroy_destination(&mut self, id: ViewId) {
        self.log
            .lock()
            .unwrap()
            .push(ProviderOp::Destroy(self.direction, id));
    }

    fn draw(
        &mut self,
        id: ViewId,
        _frame: &CameraFrame,
        _transform: &Mat4,
    ) -> Result<(), PreviewError> {
        self.log
            .lock()
            .unwrap()
            .push(ProviderOp::Draw(self.direction, id));
        Ok(())
    }
}

/// Factory handing each direction a provider that records into `log`
pub fn recording_factory(log: Arc<Mutex<Vec<ProviderOp>>>) -> Arc<dyn ProviderFactory> {
    Arc::new(move |direction: Direction| {
        Box::new(SharedProvider {
            direction,
            log: Arc::clone(&log),
        }) as Box<dyn RenderTargetProvider>
    })
}

/// Detector returning a fixed value and counting its invocations
pub struct CannedDetector<T: Clone + Send + Sync + 'static> {
    value: T,
    pub calls: Arc<AtomicUsize>,
}

impl<T: Clone + Send + Sync + 'static> CannedDetector<T> {
    pub fn new(value: T) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                value,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl<T: Clone + Send + Sync + 'static> Detector for CannedDetector<T> {
    type Output = T;

    fn detect(&self, _frame: Arc<CameraFrame>) -> BoxFuture<'static, Result<T, DetectorError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = self.value.clone();
        async move { Ok(value) }.boxed()
    }
}

/// Deterministic encoder: records the rotation and echoes the frame size
pub struct StubEncoder;

impl PhotoEncoder for StubEncoder {
    fn encode(&self, frame: &CameraFrame, quarter_turns: u8) -> Result<Vec<u8>, CaptureError> {
        Ok(vec![
            quarter_turns,
            frame.width as u8,
            frame.height as u8,
        ])
    }
}

/// Poll `cond` until it holds or two seconds pass
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Receive the next registry event, failing after two seconds
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<RegistryEvent>) -> RegistryEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for registry event")
        .expect("event channel closed")
}

/// Drain every event currently queued
pub fn drain_events(events: &mut mpsc::UnboundedReceiver<RegistryEvent>) -> Vec<RegistryEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
