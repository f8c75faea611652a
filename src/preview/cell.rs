// SPDX-License-Identifier: GPL-3.0-only

//! Latest-frame cells for polling consumers
//!
//! A display layer on another thread polls the newest frame for its view.
//! Each view's slot sits behind its own mutex, so readers never contend
//! with other views and the session task never blocks for long.

use crate::backends::types::{CameraFrame, ViewId};
use crate::errors::PreviewError;
use crate::preview::transform::Mat4;
use crate::preview::RenderTargetProvider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The newest frame delivered to one target, with its display transform
#[derive(Debug, Clone)]
pub struct CellFrame {
    /// The frame as produced by the source
    pub frame: CameraFrame,
    /// Texture transform to apply when presenting it
    pub transform: Mat4,
}

/// Shared slot holding the newest frame for one view
#[derive(Clone, Default)]
pub struct FrameCell {
    slot: Arc<Mutex<Option<CellFrame>>>,
}

impl FrameCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// The newest frame, if any has arrived yet
    pub fn latest(&self) -> Option<CellFrame> {
        self.slot.lock().unwrap().clone()
    }

    fn store(&self, frame: CellFrame) {
        *self.slot.lock().unwrap() = Some(frame);
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

/// Render provider that writes each frame into per-view [`FrameCell`]s
/// instead of GPU surfaces. Useful for display layers that upload textures
/// themselves, and for tests.
#[derive(Default)]
pub struct CellProvider {
    cells: HashMap<ViewId, FrameCell>,
}

impl CellProvider {
    /// Create a provider with no destinations
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the cell for `id`, if that target currently exists
    pub fn cell(&self, id: ViewId) -> Option<FrameCell> {
        self.cells.get(&id).cloned()
    }
}

impl RenderTargetProvider for CellProvider {
    fn create_destination(&mut self, id: ViewId) -> Result<(), PreviewError> {
        self.cells.entry(id).or_default();
        Ok(())
    }

    fn destroy_destination(&mut self, id: ViewId) {
        if let Some(cell) = self.cells.remove(&id) {
            cell.clear();
        }
    }

    fn draw(
        &mut self,
        id: ViewId,
        frame: &CameraFrame,
        transform: &Mat4,
    ) -> Result<(), PreviewError> {
        let cell = self
            .cells
            .get(&id)
            .ok_or_else(|| PreviewError::Destination(format!("no cell for target {id}")))?;
        cell.store(CellFrame {
            frame: frame.clone(),
            transform: *transform,
        });
        Ok(())
    }
}
