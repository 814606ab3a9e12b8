//! Shared types for workspace status, listing, and verification output.

use serde::{Deserialize, Serialize};

/// One open container in status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub index: usize,
    pub label: String,
    pub path: String,
    pub read_only: bool,
    pub nodes: usize,
}

/// Workspace status: open containers plus forest shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    pub containers: Vec<ContainerStatus>,
    pub total_nodes: usize,
    pub roots: usize,
    pub layers: usize,
    /// Bindings whose declared parent no longer matches their parent's content
    pub stale: usize,
}

/// One row of the forest listing, in bind order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingRow {
    pub order: usize,
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub container: String,
    pub layer: usize,
    pub fingerprint: String,
    pub current: bool,
}

/// Result of the verify command.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub valid: bool,
    pub node_count: usize,
    pub errors: Vec<String>,
    /// Node identities left unbound by a stalled resolution
    pub unresolved: Vec<String>,
}
