// SPDX-License-Identifier: GPL-3.0-only

//! Reference counting for a platform-shared capture session
//!
//! Some platforms expose both camera directions through one multiplexed
//! hardware session object. Input add/remove on that object must be
//! serialized across directions, independently of each direction's own task,
//! and the session itself must start when the first direction attaches and
//! stop when the last one detaches. `FrameSource` implementations for such
//! platforms embed a [`SessionShare`] instead of reaching for a global.

use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Debug, Default)]
struct ShareState {
    holders: usize,
}

/// Refcounted gate around one shared hardware session
#[derive(Clone, Debug, Default)]
pub struct SessionShare {
    state: Arc<Mutex<ShareState>>,
}

impl SessionShare {
    /// Create a gate with no holders
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one direction to the shared session.
    ///
    /// Returns `true` when the caller is the first holder and must start the
    /// underlying session.
    pub fn acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.holders += 1;
        state.holders == 1
    }

    /// Detach one direction from the shared session.
    ///
    /// Returns `true` when the caller was the last holder and must stop the
    /// underlying session.
    pub fn release(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.holders == 0 {
            warn!("shared session released more times than acquired");
            return false;
        }
        state.holders -= 1;
        state.holders == 0
    }

    /// Run `f` while holding the share lock.
    ///
    /// Input add/remove on the shared session object must happen inside this
    /// scope so two directions never reconfigure it concurrently.
    pub fn with_session<T>(&self, f: impl FnOnce() -> T) -> T {
        let _state = self.state.lock().unwrap();
        f()
    }

    /// Number of directions currently attached
    pub fn holders(&self) -> usize {
        self.state.lock().unwrap().holders
    }
}
