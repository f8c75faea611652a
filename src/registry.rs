// SPDX-License-Identifier: GPL-3.0-only

//! Logical view registry and reconciliation
//!
//! The registry is the single entry point for the four external operations
//! (register, update, capture, unregister). It owns the set of logical
//! views, groups them by physical direction, and keeps zero-or-one
//! [`CameraSession`] alive per direction. Every mutation reconciles both
//! directions, since an update may move a view from one camera to the other.
//!
//! Sessions post notices (geometry changes, recognition frames) on a channel
//! the registry pumps; recognition results and size updates flow out on the
//! caller-provided event channel.

use crate::backends::{DeviceRotation, Direction, FrameSource, ViewId};
use crate::config::CoreConfig;
use crate::media::PhotoEncoder;
use crate::preview::ProviderFactory;
use crate::recognition::{
    DetectorSet, RecognitionDispatcher, RecognitionFlags, RecognitionResults,
};
use crate::session::{CameraSession, SessionNotice};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// One consumer-facing camera registration
#[derive(Debug, Clone)]
struct LogicalView {
    direction: Direction,
    paused: bool,
    recognize_text: bool,
    scan_barcodes: bool,
    detect_faces: bool,
}

impl LogicalView {
    fn flags(&self) -> RecognitionFlags {
        RecognitionFlags {
            text: self.recognize_text,
            barcodes: self.scan_barcodes,
            faces: self.detect_faces,
        }
    }
}

/// Events emitted to the embedding command channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RegistryEvent {
    /// The reported size/orientation for a view's direction changed
    #[serde(rename_all = "camelCase")]
    CameraUpdated {
        /// The view this update is addressed to
        id: ViewId,
        /// Display width (already swapped for odd quarter-turns)
        width: u32,
        /// Display height (already swapped for odd quarter-turns)
        height: u32,
        /// Display rotation in quarter-turns
        quarter_turns: u8,
    },
    /// A recognition dispatch completed for a view's direction
    #[serde(rename_all = "camelCase")]
    RecognitionResults {
        /// The view this result is addressed to
        id: ViewId,
        /// Recognized text, if this view asked for it
        text: Option<Vec<String>>,
        /// Decoded barcodes, if this view asked for them
        barcodes: Option<Vec<String>>,
        /// Face presence, if this view asked for it
        face: Option<bool>,
    },
}

/// Top-level reconciliation over logical views and per-direction sessions
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    views: HashMap<ViewId, LogicalView>,
    sessions: HashMap<Direction, CameraSession>,
    next_id: ViewId,

    source: Arc<dyn FrameSource>,
    providers: Arc<dyn ProviderFactory>,
    encoder: Arc<dyn PhotoEncoder>,
    dispatcher: Arc<RecognitionDispatcher>,
    config: CoreConfig,
    events: mpsc::UnboundedSender<RegistryEvent>,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl Registry {
    /// Create a registry with no views.
    ///
    /// Must run inside a tokio runtime; the registry spawns a pump task for
    /// session notices that lives until every `Registry` clone is dropped.
    pub fn new(
        source: Arc<dyn FrameSource>,
        providers: Arc<dyn ProviderFactory>,
        encoder: Arc<dyn PhotoEncoder>,
        detectors: DetectorSet,
        config: CoreConfig,
        events: mpsc::UnboundedSender<RegistryEvent>,
    ) -> Self {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Mutex::new(Inner {
            views: HashMap::new(),
            sessions: HashMap::new(),
            next_id: 1,
            source,
            providers,
            encoder,
            dispatcher: Arc::new(RecognitionDispatcher::new(detectors)),
            config,
            events,
            notices: notices_tx,
        }));

        tokio::spawn(pump_notices(Arc::downgrade(&inner), notices_rx));

        Self { inner }
    }

    /// Create a logical view and return its id.
    ///
    /// The id is valid immediately; the hardware session may still be
    /// opening when this returns.
    pub fn register(
        &self,
        direction: Direction,
        paused: bool,
        recognize_text: bool,
        scan_barcodes: bool,
        detect_faces: bool,
    ) -> ViewId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.views.insert(
            id,
            LogicalView {
                direction,
                paused,
                recognize_text,
                scan_barcodes,
                detect_faces,
            },
        );
        info!(id, direction = %direction, paused, "registered camera view");
        inner.reconcile();
        id
    }

    /// Overwrite every mutable field of a view. Unknown ids are ignored.
    pub fn update(
        &self,
        id: ViewId,
        direction: Direction,
        paused: bool,
        recognize_text: bool,
        scan_barcodes: bool,
        detect_faces: bool,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let Some(view) = inner.views.get_mut(&id) else {
            debug!(id, "update for unknown view");
            return;
        };
        *view = LogicalView {
            direction,
            paused,
            recognize_text,
            scan_barcodes,
            detect_faces,
        };
        inner.reconcile();
    }

    /// Remove a view. Unknown ids are ignored.
    pub fn unregister(&self, id: ViewId) {
        let mut inner = self.inner.lock().unwrap();
        if inner.views.remove(&id).is_none() {
            debug!(id, "unregister for unknown view");
            return;
        }
        info!(id, "unregistered camera view");
        inner.reconcile();
    }

    /// Capture a still image through `id`'s direction.
    ///
    /// Resolves with `None` when the id is unknown, no session exists for
    /// the view's direction, or the capture fails. Concurrent callers on one
    /// direction share a single hardware capture and receive the same bytes.
    pub async fn capture_image(&self, id: ViewId) -> Option<Arc<[u8]>> {
        let receiver = {
            let inner = self.inner.lock().unwrap();
            let view = inner.views.get(&id)?;
            let session = inner.sessions.get(&view.direction)?;
            let (sender, receiver) = oneshot::channel();
            session.capture(sender);
            receiver
        };
        receiver.await.ok().flatten()
    }

    /// Feed the device-orientation signal; fans out to every live session
    pub fn set_device_rotation(&self, rotation: DeviceRotation) {
        let inner = self.inner.lock().unwrap();
        for session in inner.sessions.values() {
            session.set_device_rotation(rotation);
        }
    }

    /// Number of live sessions (one per direction with members)
    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }
}

impl Inner {
    /// Reconcile both directions against the current view set.
    ///
    /// Runs over every direction, not only the one that changed: an update
    /// that switched a view's direction affects two of them.
    fn reconcile(&mut self) {
        for direction in Direction::ALL {
            let has_members = self.views.values().any(|view| view.direction == direction);

            if !has_members {
                if let Some(session) = self.sessions.remove(&direction) {
                    info!(direction = %direction, "destroying camera session");
                    session.shutdown();
                }
            } else {
                if !self.sessions.contains_key(&direction) {
                    let session = CameraSession::spawn(
                        direction,
                        Arc::clone(&self.source),
                        self.providers.create(direction),
                        Arc::clone(&self.encoder),
                        self.config,
                        self.notices.clone(),
                    );
                    self.sessions.insert(direction, session);
                }

                let active = self
                    .views
                    .iter()
                    .filter(|(_, view)| view.direction == direction && !view.paused)
                    .map(|(id, _)| *id)
                    .collect();
                if let Some(session) = self.sessions.get(&direction) {
                    session.set_outputs(active);
                }
            }

            // Late-attaching consumers converge on the current geometry even
            // when this mutation changed nothing else for them
            self.emit_geometry(direction);
        }
    }

    /// Send the direction's current size/orientation to its non-paused views
    fn emit_geometry(&self, direction: Direction) {
        let Some(session) = self.sessions.get(&direction) else {
            return;
        };
        let geometry = session.geometry();

        let (mut width, mut height) = geometry.size;
        if geometry.quarter_turns % 2 == 1 {
            std::mem::swap(&mut width, &mut height);
        }

        for (id, view) in &self.views {
            if view.direction == direction && !view.paused {
                let _ = self.events.send(RegistryEvent::CameraUpdated {
                    id: *id,
                    width,
                    height,
                    quarter_turns: geometry.quarter_turns,
                });
            }
        }
    }

    /// Union of the recognition flags of the direction's non-paused views
    fn needed_flags(&self, direction: Direction) -> RecognitionFlags {
        self.views
            .values()
            .filter(|view| view.direction == direction && !view.paused)
            .fold(RecognitionFlags::default(), |acc, view| {
                acc.union(view.flags())
            })
    }

    /// Deliver a completed dispatch, re-filtering members now rather than at
    /// dispatch time, and masking each payload to what that view asked for
    fn deliver_recognition(&self, direction: Direction, results: &RecognitionResults) {
        for (id, view) in &self.views {
            if view.direction != direction || view.paused {
                continue;
            }
            let masked = results.masked(view.flags());
            let _ = self.events.send(RegistryEvent::RecognitionResults {
                id: *id,
                text: masked.text,
                barcodes: masked.barcodes,
                face: masked.face,
            });
        }
    }
}

/// Pump session notices until every registry handle is gone
async fn pump_notices(
    inner: Weak<Mutex<Inner>>,
    mut notices: mpsc::UnboundedReceiver<SessionNotice>,
) {
    while let Some(notice) = notices.recv().await {
        let Some(inner_arc) = inner.upgrade() else {
            break;
        };

        match notice {
            SessionNotice::StateChanged { direction } => {
                inner_arc.lock().unwrap().emit_geometry(direction);
            }
            SessionNotice::RecognitionFrame {
                direction,
                frame,
                guard,
            } => {
                let (flags, dispatcher) = {
                    let inner = inner_arc.lock().unwrap();
                    (inner.needed_flags(direction), Arc::clone(&inner.dispatcher))
                };
                let weak = Weak::clone(&inner);
                tokio::spawn(async move {
                    let results = dispatcher.dispatch(frame, flags).await;
                    if let Some(inner_arc) = weak.upgrade() {
                        inner_arc
                            .lock()
                            .unwrap()
                            .deliver_recognition(direction, &results);
                    }
                    // Re-open recognition admission only after delivery
                    drop(guard);
                });
            }
        }
    }
}
