//! Error types
//!
//! `StorageError` covers container I/O, `ForestError` covers snapshot integrity and
//! resolution, and `ApiError` is what the workspace and CLI surface to callers.

use crate::types::NodeKey;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by containers
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Container {0} is open read-only")]
    ReadOnly(String),

    #[error("Container already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Container not found: {0}")]
    NotFound(PathBuf),

    #[error("Node {name:?} not found in container {container}")]
    NodeNotFound { container: String, name: String },

    #[error("Node {name:?} already exists in container {container}")]
    NodeExists { container: String, name: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Errors raised while snapshotting or resolving the forest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    /// A node is missing required attributes or carries malformed ones
    #[error("Integrity error in {node}: {reason}")]
    Integrity { node: NodeKey, reason: String },

    /// The fixed point stalled with nodes left unbound
    #[error("Cycle or dangling reference among {} node(s): {}", .nodes.len(), format_keys(.nodes))]
    CycleOrDanglingReference { nodes: Vec<NodeKey> },

    /// A container or node was requested outside current bounds
    #[error("Lookup error: {0}")]
    Lookup(String),
}

fn format_keys(nodes: &[NodeKey]) -> String {
    nodes
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ForestError {
    pub fn integrity(node: &NodeKey, reason: impl Into<String>) -> Self {
        ForestError::Integrity {
            node: node.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the workspace facade and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Forest(#[from] ForestError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl ApiError {
    /// Lookup failures are local to the query that caused them
    pub fn is_lookup(&self) -> bool {
        matches!(self, ApiError::Forest(ForestError::Lookup(_)))
    }
}

impl From<crate::store::SnapshotError> for ApiError {
    fn from(err: crate::store::SnapshotError) -> Self {
        match err {
            crate::store::SnapshotError::Storage(e) => ApiError::StorageError(e),
            crate::store::SnapshotError::Forest(e) => ApiError::Forest(e),
        }
    }
}
