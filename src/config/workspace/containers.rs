//! WorkspaceConfig and resolve_paths for containers opened on start-up.

use crate::store::OpenMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One container to open on start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container path (relative paths resolve against the workspace root)
    pub path: PathBuf,

    /// Open mode; falls back to `workspace.default_mode`
    #[serde(default)]
    pub mode: Option<OpenMode>,
}

/// Workspace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Mode used for containers without an explicit mode, including `--container` paths
    #[serde(default)]
    pub default_mode: OpenMode,

    #[serde(default)]
    pub containers: Vec<ContainerConfig>,
}

impl WorkspaceConfig {
    /// Resolve configured containers to filesystem locations and effective modes, in order.
    pub fn resolve_paths(&self, workspace_root: &Path) -> Vec<(PathBuf, OpenMode)> {
        self.containers
            .iter()
            .map(|entry| {
                let path = if entry.path.is_absolute() {
                    entry.path.clone()
                } else {
                    workspace_root.join(&entry.path)
                };
                (path, entry.mode.unwrap_or(self.default_mode))
            })
            .collect()
    }
}
