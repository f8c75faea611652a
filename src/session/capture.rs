// SPDX-License-Identifier: GPL-3.0-only

//! Still-capture batching
//!
//! All capture requests pending when the hardware is told to capture are
//! resolved together by that one capture. Requests arriving while a capture
//! is in flight form the next batch; they never extend the current one.

use std::sync::Arc;
use tokio::sync::oneshot;

/// Completion channel for one capture request. `None` means the capture
/// failed or the session was torn down.
pub type CaptureSender = oneshot::Sender<Option<Arc<[u8]>>>;

/// Pending and in-flight still-capture requests for one direction
#[derive(Default)]
pub struct CaptureQueue {
    pending: Vec<CaptureSender>,
    in_flight: Option<Vec<CaptureSender>>,
}

impl CaptureQueue {
    /// Queue a capture request for the next batch
    pub fn push(&mut self, sender: CaptureSender) {
        self.pending.push(sender);
    }

    /// Whether any request is waiting for the next batch
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether a hardware capture is currently in flight
    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the queue still needs a hardware session
    pub fn wants_session(&self) -> bool {
        self.has_pending() || self.in_flight()
    }

    /// Snapshot the pending requests as the in-flight batch.
    ///
    /// Returns `false` when a batch is already in flight or nothing is
    /// pending; the caller issues the hardware capture only on `true`.
    pub fn begin_batch(&mut self) -> bool {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return false;
        }
        self.in_flight = Some(std::mem::take(&mut self.pending));
        true
    }

    /// Resolve the in-flight batch. Every waiter receives the same bytes.
    pub fn complete_batch(&mut self, image: Option<Arc<[u8]>>) {
        if let Some(batch) = self.in_flight.take() {
            for sender in batch {
                let _ = sender.send(image.clone());
            }
        }
    }

    /// Resolve the in-flight batch and everything still pending with failure
    pub fn fail_all(&mut self) {
        self.complete_batch(None);
        for sender in self.pending.drain(..) {
            let _ = sender.send(None);
        }
    }
}
