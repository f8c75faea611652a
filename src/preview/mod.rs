// SPDX-License-Identifier: GPL-3.0-only

//! Preview fan-out
//!
//! One incoming frame is drawn into every registered output target with the
//! direction's rotation/mirror transform applied. The GPU side lives behind
//! [`RenderTargetProvider`]; the fan-out only reconciles the target set and
//! drives per-frame draws, so it is fully decoupled from how many consumers
//! exist at any moment.

pub mod cell;
pub mod transform;

pub use cell::{CellProvider, FrameCell};

use crate::backends::types::{CameraFrame, Direction, ViewId};
use crate::errors::PreviewError;
use std::collections::HashSet;
use tracing::{debug, warn};

use transform::Mat4;

/// GPU-side collaborator owning render destinations bound to native surfaces.
///
/// Implementations keep their own destination map keyed by [`ViewId`]; the
/// provider is only ever called from its session's task, so a GPU context
/// bound to one thread can live inside it.
pub trait RenderTargetProvider: Send {
    /// Create a render destination for the output target `id`
    fn create_destination(&mut self, id: ViewId) -> Result<(), PreviewError>;

    /// Destroy the render destination for `id`, if any
    fn destroy_destination(&mut self, id: ViewId);

    /// Draw `frame` into the destination for `id`, applying `transform` to
    /// the frame's texture coordinates
    fn draw(
        &mut self,
        id: ViewId,
        frame: &CameraFrame,
        transform: &Mat4,
    ) -> Result<(), PreviewError>;
}

/// Creates one provider per direction.
///
/// Each session owns its own provider (and therefore its own GPU context).
pub trait ProviderFactory: Send + Sync {
    /// Build the provider for `direction`
    fn create(&self, direction: Direction) -> Box<dyn RenderTargetProvider>;
}

impl<F> ProviderFactory for F
where
    F: Fn(Direction) -> Box<dyn RenderTargetProvider> + Send + Sync,
{
    fn create(&self, direction: Direction) -> Box<dyn RenderTargetProvider> {
        self(direction)
    }
}

/// Fan-out of one direction's frames to its current output targets
pub struct PreviewFanOut {
    direction: Direction,
    provider: Box<dyn RenderTargetProvider>,
    targets: HashSet<ViewId>,
    quarter_turns: u8,
}

impl PreviewFanOut {
    /// Create a fan-out with no targets
    pub fn new(direction: Direction, provider: Box<dyn RenderTargetProvider>) -> Self {
        Self {
            direction,
            provider,
            targets: HashSet::new(),
            quarter_turns: 0,
        }
    }

    /// Update the display rotation applied to subsequent frames
    pub fn set_quarter_turns(&mut self, quarter_turns: u8) {
        self.quarter_turns = quarter_turns;
    }

    /// Reconcile the target set: destroy removed targets, create missing
    /// ones, and leave survivors untouched.
    ///
    /// A target whose destination cannot be created is skipped (and retried
    /// on the next reconciliation); this never fails the others.
    pub fn set_targets(&mut self, requested: &HashSet<ViewId>) {
        let removed: Vec<ViewId> = self.targets.difference(requested).copied().collect();
        for id in removed {
            self.provider.destroy_destination(id);
            self.targets.remove(&id);
            debug!(direction = %self.direction, target = id, "removed preview target");
        }

        let added: Vec<ViewId> = requested.difference(&self.targets).copied().collect();
        for id in added {
            match self.provider.create_destination(id) {
                Ok(()) => {
                    self.targets.insert(id);
                    debug!(direction = %self.direction, target = id, "added preview target");
                }
                Err(e) => {
                    warn!(
                        direction = %self.direction,
                        target = id,
                        error = %e,
                        "skipping preview target"
                    );
                }
            }
        }
    }

    /// Remove every target
    pub fn clear_targets(&mut self) {
        for id in self.targets.drain() {
            self.provider.destroy_destination(id);
        }
    }

    /// Draw `frame` into every current target
    pub fn draw_frame(&mut self, frame: &CameraFrame) {
        let matrix = transform::preview_transform(self.direction, self.quarter_turns);
        for id in &self.targets {
            if let Err(e) = self.provider.draw(*id, frame, &matrix) {
                warn!(direction = %self.direction, target = *id, error = %e, "draw failed");
            }
        }
    }

    /// Current target set
    pub fn targets(&self) -> &HashSet<ViewId> {
        &self.targets
    }
}
