// SPDX-License-Identifier: GPL-3.0-only

//! Per-direction camera session
//!
//! One task per physical direction owns the hardware session state machine,
//! the preview fan-out, the still-capture queue, and recognition admission.
//! Commands from the registry and events from the frame source are processed
//! serially on that task, so no per-direction state needs locking.
//!
//! The session opens the device when it has demand (active preview outputs
//! or a pending capture), tears it down on device loss or when demand
//! disappears, and tolerates an immediate reopen afterwards.

pub mod capture;
pub mod orientation;

use crate::backends::{
    CameraFrame, DeviceRotation, Direction, ExposureState, FrameSource, SourceEvent, SourceSession,
    ViewId,
};
use crate::config::CoreConfig;
use crate::media::PhotoEncoder;
use crate::preview::{PreviewFanOut, RenderTargetProvider};
use crate::recognition::{scale, DispatchGuard, RecognitionThrottle};
use capture::{CaptureQueue, CaptureSender};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Commands accepted by a running session task
pub enum SessionCommand {
    /// Replace the set of active (non-paused) preview outputs
    SetOutputs(HashSet<ViewId>),
    /// Queue a still capture
    Capture(CaptureSender),
    /// The device rotation reported by the orientation signal changed
    SetDeviceRotation(DeviceRotation),
    /// Tear down and exit
    Shutdown,
}

/// Notices a session posts back to the registry
pub enum SessionNotice {
    /// Reported size or orientation changed
    StateChanged {
        /// The direction whose geometry changed
        direction: Direction,
    },
    /// A throttled low-resolution frame is ready for recognition
    RecognitionFrame {
        /// The direction the frame came from
        direction: Direction,
        /// Downscaled frame for the detectors
        frame: Arc<CameraFrame>,
        /// Held until dispatch and delivery complete
        guard: DispatchGuard,
    },
}

/// Consumer-visible geometry of a direction's stream.
///
/// Authoritative while a hardware session is open; last-known otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGeometry {
    /// Native capture size, sensor-oriented (unrotated)
    pub size: (u32, u32),
    /// Display rotation in quarter-turns
    pub quarter_turns: u8,
}

impl Default for SessionGeometry {
    fn default() -> Self {
        Self {
            size: (0, 0),
            quarter_turns: 0,
        }
    }
}

/// Handle to one direction's session task
pub struct CameraSession {
    direction: Direction,
    commands: mpsc::UnboundedSender<SessionCommand>,
    geometry: Arc<Mutex<SessionGeometry>>,
}

impl CameraSession {
    /// Spawn the session task for `direction`.
    ///
    /// The task exits when [`CameraSession::shutdown`] is called or the
    /// handle is dropped; either way every pending capture resolves with
    /// `None` first.
    pub fn spawn(
        direction: Direction,
        source: Arc<dyn FrameSource>,
        provider: Box<dyn RenderTargetProvider>,
        encoder: Arc<dyn PhotoEncoder>,
        config: CoreConfig,
        notices: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let geometry = Arc::new(Mutex::new(SessionGeometry::default()));

        let actor = SessionActor {
            direction,
            source,
            encoder,
            notices,
            geometry: Arc::clone(&geometry),
            state: SessionState::Closed,
            session: None,
            source_events: None,
            desired_outputs: HashSet::new(),
            fan_out: PreviewFanOut::new(direction, provider),
            captures: CaptureQueue::default(),
            throttle: RecognitionThrottle::new(Duration::from_millis(
                config.recognition.interval_ms,
            )),
            recognition_scale: config.recognition.scale,
            size: (0, 0),
            sensor_orientation: 0,
            device_rotation: DeviceRotation::default(),
            last_exposure: ExposureState::Unknown,
        };

        info!(direction = %direction, "starting camera session");
        tokio::spawn(actor.run(commands_rx));

        Self {
            direction,
            commands: commands_tx,
            geometry,
        }
    }

    /// The direction this session serves
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last-known stream geometry
    pub fn geometry(&self) -> SessionGeometry {
        *self.geometry.lock().unwrap()
    }

    /// Replace the active preview output set
    pub fn set_outputs(&self, outputs: HashSet<ViewId>) {
        let _ = self.commands.send(SessionCommand::SetOutputs(outputs));
    }

    /// Queue a still capture; the sender resolves with the encoded bytes or
    /// `None` on failure
    pub fn capture(&self, sender: CaptureSender) {
        let _ = self.commands.send(SessionCommand::Capture(sender));
    }

    /// Feed a device rotation change
    pub fn set_device_rotation(&self, rotation: DeviceRotation) {
        let _ = self
            .commands
            .send(SessionCommand::SetDeviceRotation(rotation));
    }

    /// Tear the session down; pending captures resolve with `None`
    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Closed,
    Opening,
    Open,
}

/// Action returned by command/event handlers to control the task loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopAction {
    Continue,
    Stop,
}

enum Incoming {
    Command(Option<SessionCommand>),
    Source(Option<SourceEvent>),
}

struct SessionActor {
    direction: Direction,
    source: Arc<dyn FrameSource>,
    encoder: Arc<dyn PhotoEncoder>,
    notices: mpsc::UnboundedSender<SessionNotice>,
    geometry: Arc<Mutex<SessionGeometry>>,

    state: SessionState,
    session: Option<Box<dyn SourceSession>>,
    source_events: Option<mpsc::UnboundedReceiver<SourceEvent>>,
    desired_outputs: HashSet<ViewId>,
    fan_out: PreviewFanOut,
    captures: CaptureQueue,
    throttle: RecognitionThrottle,
    recognition_scale: f32,
    size: (u32, u32),
    sensor_orientation: u32,
    device_rotation: DeviceRotation,
    last_exposure: ExposureState,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        loop {
            let incoming = tokio::select! {
                command = commands.recv() => Incoming::Command(command),
                event = recv_source(&mut self.source_events) => Incoming::Source(event),
            };

            match incoming {
                Incoming::Command(Some(command)) => {
                    if self.handle_command(command) == LoopAction::Stop {
                        break;
                    }
                }
                // All handles dropped: same as an explicit shutdown
                Incoming::Command(None) => break,
                Incoming::Source(Some(event)) => self.handle_source_event(event).await,
                Incoming::Source(None) => {
                    // The source dropped its event sender mid-session
                    warn!(direction = %self.direction, "source event stream closed");
                    self.teardown_session();
                }
            }
        }

        self.teardown_session();

        // Anything that raced the shutdown still gets its failure result
        while let Ok(command) = commands.try_recv() {
            if let SessionCommand::Capture(sender) = command {
                let _ = sender.send(None);
            }
        }
        commands.close();

        info!(direction = %self.direction, "camera session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) -> LoopAction {
        match command {
            SessionCommand::SetOutputs(outputs) => {
                self.desired_outputs = outputs;
                if self.state == SessionState::Open {
                    self.fan_out.set_targets(&self.desired_outputs);
                }
                self.evaluate_demand();
            }
            SessionCommand::Capture(sender) => {
                self.captures.push(sender);
                self.evaluate_demand();
                self.maybe_issue_capture();
            }
            SessionCommand::SetDeviceRotation(rotation) => {
                if self.device_rotation != rotation {
                    self.device_rotation = rotation;
                    if self.state == SessionState::Open {
                        self.update_orientation();
                    }
                }
            }
            SessionCommand::Shutdown => return LoopAction::Stop,
        }
        LoopAction::Continue
    }

    async fn handle_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Opened {
                size,
                sensor_orientation,
            } => {
                info!(
                    direction = %self.direction,
                    width = size.0,
                    height = size.1,
                    sensor_orientation,
                    "camera opened"
                );
                self.state = SessionState::Open;
                self.size = size;
                self.sensor_orientation = sensor_orientation;
                self.update_orientation();
                self.fan_out.set_targets(&self.desired_outputs);
                self.maybe_issue_capture();
            }
            SourceEvent::Frame(frame) => {
                if self.state != SessionState::Open {
                    return;
                }
                self.last_exposure = frame.exposure;
                self.fan_out.draw_frame(&frame);
                self.maybe_issue_capture();
                self.throttle_recognition(&frame);
            }
            SourceEvent::StillFrame(frame) => {
                self.complete_still(frame).await;
            }
            SourceEvent::StillFailed => {
                warn!(direction = %self.direction, "still capture failed");
                self.captures.complete_batch(None);
                self.maybe_issue_capture();
            }
            SourceEvent::Disconnected => {
                info!(direction = %self.direction, "camera disconnected");
                self.teardown_session();
            }
            SourceEvent::Error(message) => {
                warn!(direction = %self.direction, error = %message, "camera device error");
                self.teardown_session();
            }
        }
    }

    /// Open or close the hardware session to match current demand
    fn evaluate_demand(&mut self) {
        let demand = !self.desired_outputs.is_empty() || self.captures.wants_session();

        match (demand, self.state) {
            (true, SessionState::Closed) => self.open_device(),
            (false, SessionState::Open) | (false, SessionState::Opening) => {
                debug!(direction = %self.direction, "no demand, closing camera");
                self.teardown_session();
            }
            _ => {}
        }
    }

    fn open_device(&mut self) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        match self.source.open(self.direction, events_tx) {
            Ok(session) => {
                debug!(direction = %self.direction, "opening camera");
                self.session = Some(session);
                self.source_events = Some(events_rx);
                self.state = SessionState::Opening;
            }
            Err(e) => {
                warn!(direction = %self.direction, error = %e, "failed to open camera");
                self.captures.fail_all();
                self.state = SessionState::Closed;
            }
        }
    }

    /// Release the device and resolve everything waiting on it.
    ///
    /// Idempotent: callable from any state, and the session may be reopened
    /// immediately afterwards by the next demand change.
    fn teardown_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.source_events = None;
        self.captures.fail_all();
        self.fan_out.clear_targets();
        self.last_exposure = ExposureState::Unknown;
        self.state = SessionState::Closed;
    }

    /// Issue a hardware still capture when one is wanted and admissible
    fn maybe_issue_capture(&mut self) {
        if self.state != SessionState::Open {
            return;
        }
        if !self.last_exposure.allows_capture() {
            return;
        }
        if self.captures.begin_batch() {
            if let Some(session) = self.session.as_mut() {
                debug!(direction = %self.direction, "issuing still capture");
                session.request_still_frame();
            }
        }
    }

    async fn complete_still(&mut self, frame: CameraFrame) {
        let encoder = Arc::clone(&self.encoder);
        let quarter_turns = self.current_quarter_turns();

        let encoded =
            tokio::task::spawn_blocking(move || encoder.encode(&frame, quarter_turns)).await;

        match encoded {
            Ok(Ok(bytes)) => {
                let bytes: Arc<[u8]> = Arc::from(bytes);
                self.captures.complete_batch(Some(bytes));
            }
            Ok(Err(e)) => {
                warn!(direction = %self.direction, error = %e, "still encoding failed");
                self.captures.complete_batch(None);
            }
            Err(e) => {
                warn!(direction = %self.direction, error = %e, "still encoding task failed");
                self.captures.complete_batch(None);
            }
        }

        // Requests that arrived during the flight form the next batch
        self.maybe_issue_capture();
    }

    fn throttle_recognition(&mut self, frame: &CameraFrame) {
        let Some(guard) = self.throttle.try_admit(Instant::now()) else {
            return;
        };
        let low = scale::downscale(frame, self.recognition_scale);
        let _ = self.notices.send(SessionNotice::RecognitionFrame {
            direction: self.direction,
            frame: Arc::new(low),
            guard,
        });
    }

    fn current_quarter_turns(&self) -> u8 {
        orientation::quarter_turns(self.sensor_orientation, self.device_rotation, self.direction)
    }

    /// Recompute rotation, push it to the fan-out, publish the geometry, and
    /// notify the registry. Runs without leaving the open state.
    fn update_orientation(&mut self) {
        let quarter_turns = self.current_quarter_turns();
        self.fan_out.set_quarter_turns(quarter_turns);
        *self.geometry.lock().unwrap() = SessionGeometry {
            size: self.size,
            quarter_turns,
        };
        let _ = self.notices.send(SessionNotice::StateChanged {
            direction: self.direction,
        });
    }
}

async fn recv_source(
    events: &mut Option<mpsc::UnboundedReceiver<SourceEvent>>,
) -> Option<SourceEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
