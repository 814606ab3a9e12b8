//! Node Store
//!
//! Containers own top-level nodes. The `NodeStore` keeps the ordered list of open
//! containers and produces validated, container-agnostic snapshots for the resolver.

pub mod memory;
pub mod persistence;

pub use memory::MemoryContainer;
pub use persistence::SledContainer;

use crate::error::{ForestError, StorageError};
use crate::kinds::NodeKind;
use crate::tree::node::{Node, PARENT_ATTR, TYPE_ATTR};
use crate::types::{ContainerId, Fingerprint, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// How a container is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenMode {
    /// `r`: read-only, must exist
    #[serde(rename = "r")]
    Read,
    /// `r+`: read/write, must exist
    #[serde(rename = "r+")]
    ReadWrite,
    /// `w`: create, truncating existing content
    #[serde(rename = "w")]
    Truncate,
    /// `w-` or `x`: create, fail if it exists
    #[serde(rename = "w-", alias = "x")]
    CreateNew,
    /// `a`: read/write, create if missing
    #[default]
    #[serde(rename = "a")]
    Append,
}

impl OpenMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, OpenMode::Read)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::ReadWrite => "r+",
            OpenMode::Truncate => "w",
            OpenMode::CreateNew => "w-",
            OpenMode::Append => "a",
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(OpenMode::Read),
            "r+" => Ok(OpenMode::ReadWrite),
            "w" => Ok(OpenMode::Truncate),
            "w-" | "x" => Ok(OpenMode::CreateNew),
            "a" => Ok(OpenMode::Append),
            other => Err(format!(
                "invalid open mode {:?} (must be one of r, r+, w, w-, x, a)",
                other
            )),
        }
    }
}

/// A persistent collection of top-level nodes
pub trait Container: Send + Sync {
    /// Short display name (the file name for on-disk containers)
    fn label(&self) -> &str;
    fn path(&self) -> &Path;
    fn is_read_only(&self) -> bool;
    /// All top-level nodes, ordered by name
    fn nodes(&self) -> Result<Vec<Node>, StorageError>;
    fn get(&self, name: &str) -> Result<Option<Node>, StorageError>;
    /// Insert or replace the node stored under `node.name`
    fn put(&self, node: &Node) -> Result<(), StorageError>;
    fn remove(&self, name: &str) -> Result<(), StorageError>;
    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError>;
    fn flush(&self) -> Result<(), StorageError>;
}

/// Selects an open container by position or file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerSelector {
    /// Position in the open list; negative values count from the end
    Index(isize),
    /// Container label (file name)
    Name(String),
}

impl Default for ContainerSelector {
    fn default() -> Self {
        ContainerSelector::Index(-1)
    }
}

impl FromStr for ContainerSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<isize>() {
            Ok(i) => ContainerSelector::Index(i),
            Err(_) => ContainerSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ContainerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerSelector::Index(i) => write!(f, "{}", i),
            ContainerSelector::Name(n) => f.write_str(n),
        }
    }
}

/// An open container with its session identity
pub struct OpenContainer {
    pub id: ContainerId,
    pub container: Box<dyn Container>,
}

/// Validated view of one node within a snapshot
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub key: NodeKey,
    pub container_label: String,
    pub kind: NodeKind,
    pub declared_parent: Fingerprint,
    pub node: Node,
}

/// Consistent copy of every node across all open containers
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<NodeRecord>,
}

impl Snapshot {
    /// Validate raw nodes into records, rejecting missing or malformed required attributes
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = (NodeKey, String, Node)>,
    ) -> Result<Self, ForestError> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (key, container_label, node) in nodes {
            if !seen.insert(key.clone()) {
                return Err(ForestError::integrity(&key, "node enumerated twice"));
            }
            let record = validate(key, container_label, node)?;
            records.push(record);
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(Snapshot { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &NodeKey) -> Option<&NodeRecord> {
        self.records
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.records[i])
    }
}

fn validate(key: NodeKey, container_label: String, node: Node) -> Result<NodeRecord, ForestError> {
    let tag = node
        .str_attribute(TYPE_ATTR)
        .ok_or_else(|| ForestError::integrity(&key, "missing string attribute 'type'"))?;
    let kind = NodeKind::from_tag(tag)
        .ok_or_else(|| ForestError::integrity(&key, format!("unknown node type {:?}", tag)))?;
    let parent = node
        .str_attribute(PARENT_ATTR)
        .ok_or_else(|| ForestError::integrity(&key, "missing string attribute 'parent'"))?;
    let declared_parent = parent
        .parse::<Fingerprint>()
        .map_err(|e| ForestError::integrity(&key, e.to_string()))?;
    Ok(NodeRecord {
        key,
        container_label,
        kind,
        declared_parent,
        node,
    })
}

/// Errors from snapshotting: either the containers failed or the content is invalid
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Forest(#[from] ForestError),
}

/// Ordered collection of open containers
#[derive(Default)]
pub struct NodeStore {
    containers: Vec<OpenContainer>,
    next_id: u64,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a container, assigning it a fresh identity
    pub fn push(&mut self, container: Box<dyn Container>) -> ContainerId {
        let id = ContainerId(self.next_id);
        self.next_id += 1;
        debug!(container = %container.label(), %id, "Container attached");
        self.containers.push(OpenContainer { id, container });
        id
    }

    /// Move the container at `index` to the end of the open list
    pub fn move_to_end(&mut self, index: usize) -> ContainerId {
        let open = self.containers.remove(index);
        let id = open.id;
        self.containers.push(open);
        id
    }

    /// Detach the container at `index`, flushing it first
    ///
    /// A failed flush leaves the container open.
    pub fn remove(&mut self, index: usize) -> Result<OpenContainer, StorageError> {
        self.containers[index].container.flush()?;
        Ok(self.containers.remove(index))
    }

    /// Flush every container, then detach them all
    ///
    /// Nothing is detached unless every flush succeeds.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        for open in &self.containers {
            open.container.flush()?;
        }
        self.containers.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenContainer> {
        self.containers.iter()
    }

    /// Position of the container opened from `path`, if any
    pub fn position_of_path(&self, path: &Path) -> Option<usize> {
        self.containers
            .iter()
            .position(|open| open.container.path() == path)
    }

    /// Resolve a selector to a position in the open list
    pub fn index(&self, selector: &ContainerSelector) -> Result<usize, ForestError> {
        let len = self.containers.len();
        match selector {
            ContainerSelector::Index(i) => {
                let resolved = if *i < 0 { len as isize + i } else { *i };
                if resolved < 0 || resolved as usize >= len {
                    return Err(ForestError::Lookup(format!(
                        "There is no container associated with index {}",
                        i
                    )));
                }
                Ok(resolved as usize)
            }
            ContainerSelector::Name(name) => self
                .containers
                .iter()
                .position(|open| open.container.label() == name)
                .ok_or_else(|| {
                    ForestError::Lookup(format!("There is no container named {:?}", name))
                }),
        }
    }

    pub fn get(&self, selector: &ContainerSelector) -> Result<&OpenContainer, ForestError> {
        let index = self.index(selector)?;
        Ok(&self.containers[index])
    }

    pub fn by_id(&self, id: ContainerId) -> Result<&OpenContainer, ForestError> {
        self.containers
            .iter()
            .find(|open| open.id == id)
            .ok_or_else(|| ForestError::Lookup(format!("Container {} is not open", id)))
    }

    /// Enumerate every node across all open containers into a validated snapshot
    pub fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let mut raw = Vec::new();
        for open in &self.containers {
            for node in open.container.nodes()? {
                let key = NodeKey::new(open.id, node.name.clone());
                raw.push((key, open.container.label().to_string(), node));
            }
        }
        Ok(Snapshot::from_nodes(raw)?)
    }
}

/// File name of a container path, used as its label
pub(crate) fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Absolute form of a container path, so reopen detection compares like with like
pub(crate) fn normalize_path(path: &Path) -> Result<PathBuf, StorageError> {
    if path.as_os_str().is_empty() {
        return Err(StorageError::InvalidPath("empty container path".to_string()));
    }
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
