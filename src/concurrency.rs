//! Shared workspace access
//!
//! Resolution is a whole-forest operation, so the workspace is guarded by a single
//! read-write lock rather than per-node locks. Readers share the lock; any call that
//! re-links takes it exclusively, so no reader ever observes a half-built binding table.

use crate::workspace::Workspace;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle to a workspace shared between threads
#[derive(Clone, Default)]
pub struct SharedWorkspace {
    inner: Arc<RwLock<Workspace>>,
}

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            inner: Arc::new(RwLock::new(workspace)),
        }
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&Workspace) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access
    pub fn write<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}

impl From<Workspace> for SharedWorkspace {
    fn from(workspace: Workspace) -> Self {
        Self::new(workspace)
    }
}
