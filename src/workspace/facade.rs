//! Workspace: the ordered set of open containers plus the binding table.
//!
//! Every operation that changes the node multiset (opening or closing a container,
//! creating, removing or renaming a node, editing its content) ends with a full re-link.

use crate::binding::{Binding, BindingTable};
use crate::config::WorkspaceConfig;
use crate::error::{ApiError, ForestError};
use crate::forest::{self, ForestPlan};
use crate::kinds::{NodeKind, TIMESTAMP_FORMAT};
use crate::store::{
    Container, ContainerSelector, NodeStore, OpenContainer, OpenMode, SledContainer,
};
use crate::tree::hasher::fingerprint;
use crate::tree::node::{Child, Entry, Node, Value, MODIFIED_ATTR, PARENT_ATTR, TYPE_ATTR};
use crate::types::{ContainerId, Fingerprint, NodeKey};
use crate::workspace::types::{BindingRow, ContainerStatus, VerifyResult, WorkspaceStatus};
use chrono::Local;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[derive(Default)]
pub struct Workspace {
    store: NodeStore,
    bindings: BindingTable,
    plan: ForestPlan,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every container listed in the configuration, relative to `root`
    pub fn from_config(config: &WorkspaceConfig, root: &Path) -> Result<Self, ApiError> {
        let mut workspace = Self::new();
        for (path, mode) in config.resolve_paths(root) {
            workspace.open(&path, mode)?;
        }
        workspace.resolve()?;
        Ok(workspace)
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn plan(&self) -> &ForestPlan {
        &self.plan
    }

    /// Open containers in list order
    pub fn containers(&self) -> impl Iterator<Item = &dyn Container> {
        self.store.iter().map(|open| open.container.as_ref())
    }

    /// Open a container file and add it to the workspace
    ///
    /// A container that is already open is moved to the end of the list instead.
    pub fn add(&mut self, path: &Path, mode: OpenMode) -> Result<ContainerId, ApiError> {
        let id = self.open(path, mode)?;
        self.resolve()?;
        Ok(id)
    }

    fn open(&mut self, path: &Path, mode: OpenMode) -> Result<ContainerId, ApiError> {
        let normalized = crate::store::normalize_path(path)?;
        if let Some(index) = self.store.position_of_path(&normalized) {
            debug!(path = %normalized.display(), "Container already open; moving to end");
            return Ok(self.store.move_to_end(index));
        }
        let container = SledContainer::open(&normalized, mode)?;
        info!(path = %normalized.display(), %mode, "Opened container");
        Ok(self.store.push(Box::new(container)))
    }

    /// Add an already constructed container
    pub fn attach(&mut self, container: Box<dyn Container>) -> Result<ContainerId, ApiError> {
        let id = self.store.push(container);
        self.resolve()?;
        Ok(id)
    }

    /// Close every container; files stay on disk
    pub fn clear(&mut self) -> Result<(), ApiError> {
        self.store.clear()?;
        self.resolve()
    }

    pub fn close(&mut self, selector: &ContainerSelector) -> Result<(), ApiError> {
        let index = self.store.index(selector)?;
        let closed = self.store.remove(index)?;
        info!(container = %closed.container.label(), "Closed container");
        self.resolve()
    }

    pub fn flush(&self, selector: &ContainerSelector) -> Result<(), ApiError> {
        self.store.get(selector)?.container.flush()?;
        Ok(())
    }

    pub fn flush_all(&self) -> Result<(), ApiError> {
        for open in self.store.iter() {
            open.container.flush()?;
        }
        Ok(())
    }

    /// Create a node of `kind` in the selected container
    ///
    /// The node declares the current fingerprint of the bound node `parent` (or the
    /// sentinel) as its parent. Without a name, one is generated from the kind and time.
    #[instrument(skip(self, selector), fields(container = %selector))]
    pub fn create(
        &mut self,
        selector: &ContainerSelector,
        kind: NodeKind,
        name: Option<&str>,
        parent: Option<&str>,
    ) -> Result<Binding, ApiError> {
        let declared_parent = match parent {
            Some(parent) => fingerprint(Some(&self.node(parent)?)),
            None => Fingerprint::SENTINEL,
        };

        let now = Local::now();
        let name = match name {
            Some(name) => name.to_string(),
            None => kind.default_name(now),
        };
        validate_name(&name)?;

        let open = self.store.get(selector)?;
        if open.container.get(&name)?.is_some() {
            return Err(crate::error::StorageError::NodeExists {
                container: open.container.label().to_string(),
                name,
            }
            .into());
        }
        let node = kind.create_at(&name, declared_parent, now);
        open.container.put(&node)?;
        let key = NodeKey::new(open.id, name);
        info!(node = %key, parent = %declared_parent.short(), "Created node");

        self.resolve()?;
        self.bindings
            .by_key(&key)
            .cloned()
            .ok_or_else(|| ForestError::Lookup(format!("Node {} was not bound", key)).into())
    }

    /// Delete a node; its children become orphans unless identical content remains
    pub fn remove(&mut self, name: &str) -> Result<(), ApiError> {
        let (key, open) = self.locate(name)?;
        open.container.remove(&key.name)?;
        info!(node = %key, "Removed node");
        self.resolve()
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<(), ApiError> {
        validate_name(new_name)?;
        let (key, open) = self.locate(name)?;
        open.container.rename(&key.name, new_name)?;
        info!(node = %key, new_name, "Renamed node");
        self.resolve()
    }

    /// Set an attribute on a node; `type` and `parent` are fixed at creation
    ///
    /// Setting `modified` directly records the given value instead of the current time.
    pub fn set_attribute(&mut self, name: &str, key: &str, value: Value) -> Result<(), ApiError> {
        if key == TYPE_ATTR || key == PARENT_ATTR {
            return Err(ApiError::InvalidOperation(format!(
                "attribute {:?} is set once at creation",
                key
            )));
        }
        let stamp = key != MODIFIED_ATTR;
        self.modify(name, stamp, |node| node.set_attribute(key, value))
    }

    /// Write an entry under the node's `data` child, changing its fingerprint
    pub fn put_data(&mut self, name: &str, entry: &str, value: Value) -> Result<(), ApiError> {
        validate_name(entry)?;
        self.modify(name, true, |node| {
            node.data_mut()
                .children
                .insert(entry.to_string(), Child::Data(value));
        })
    }

    fn modify(
        &mut self,
        name: &str,
        stamp: bool,
        edit: impl FnOnce(&mut Node),
    ) -> Result<(), ApiError> {
        let (key, open) = self.locate(name)?;
        let mut node = open.container.get(&key.name)?.ok_or_else(|| {
            ForestError::Lookup(format!("Node {} is bound but missing from its container", key))
        })?;
        let before = fingerprint(Some(&node));
        edit(&mut node);
        if stamp {
            node.set_attribute(MODIFIED_ATTR, Local::now().format(TIMESTAMP_FORMAT).to_string());
        }
        open.container.put(&node)?;
        let after = fingerprint(Some(&node));
        if before != after {
            debug!(node = %key, before = %before.short(), after = %after.short(), "Fingerprint changed");
        }
        self.resolve()
    }

    /// Current content of a bound node
    pub fn node(&self, name: &str) -> Result<Node, ApiError> {
        let (key, open) = self.locate(name)?;
        open.container
            .get(&key.name)?
            .ok_or_else(|| ForestError::Lookup(format!("No node named {:?}", name)).into())
    }

    /// Typed lookup of an attribute or child on a bound node
    pub fn access(&self, name: &str, key: &str) -> Result<Entry, ApiError> {
        let node = self.node(name)?;
        node.access(key).map(Entry::from).ok_or_else(|| {
            ForestError::Lookup(format!("Node {:?} has no attribute or child {:?}", name, key))
                .into()
        })
    }

    pub fn fingerprint(&self, name: &str) -> Result<Fingerprint, ApiError> {
        Ok(fingerprint(Some(&self.node(name)?)))
    }

    /// Whether the node's declared parent equals its bound parent's current fingerprint
    pub fn matches(&self, name: &str) -> Result<bool, ApiError> {
        let binding = self.bindings.find(name)?;
        let parent = match self.bindings.parent(binding.handle) {
            Some(parent) => Some(self.node_at(&parent.key)?),
            None => None,
        };
        Ok(forest::is_current(binding.declared_parent, parent.as_ref()))
    }

    fn node_at(&self, key: &NodeKey) -> Result<Node, ApiError> {
        let open = self.store.by_id(key.container)?;
        open.container
            .get(&key.name)?
            .ok_or_else(|| ForestError::Lookup(format!("Node {} is not stored", key)).into())
    }

    fn locate(&self, name: &str) -> Result<(NodeKey, &OpenContainer), ApiError> {
        let key = self.bindings.find(name)?.key.clone();
        let open = self.store.by_id(key.container)?;
        Ok((key, open))
    }

    /// Discard all bindings and resolve the whole forest again
    ///
    /// On failure the previous bindings stay in place.
    pub fn resolve(&mut self) -> Result<(), ApiError> {
        let snapshot = self.store.snapshot()?;
        match forest::resolve(&snapshot, &mut self.bindings) {
            Ok(plan) => {
                self.plan = plan;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Re-link failed; keeping previous bindings");
                Err(err.into())
            }
        }
    }

    /// Resolve without touching the bindings and report problems instead of failing
    pub fn verify(&self) -> Result<VerifyResult, ApiError> {
        let mut result = VerifyResult {
            valid: true,
            node_count: 0,
            errors: Vec::new(),
            unresolved: Vec::new(),
        };
        let snapshot = match self.store.snapshot() {
            Ok(snapshot) => snapshot,
            Err(crate::store::SnapshotError::Forest(err)) => {
                result.valid = false;
                result.errors.push(err.to_string());
                return Ok(result);
            }
            Err(err) => return Err(err.into()),
        };
        result.node_count = snapshot.len();
        if let Err(err) = forest::plan(&snapshot) {
            result.valid = false;
            if let ForestError::CycleOrDanglingReference { nodes } = &err {
                result.unresolved = nodes.iter().map(|k| k.to_string()).collect();
            }
            result.errors.push(err.to_string());
        }
        Ok(result)
    }

    pub fn status(&self) -> Result<WorkspaceStatus, ApiError> {
        let mut containers = Vec::new();
        for (index, open) in self.store.iter().enumerate() {
            containers.push(ContainerStatus {
                index,
                label: open.container.label().to_string(),
                path: open.container.path().display().to_string(),
                read_only: open.container.is_read_only(),
                nodes: open.container.nodes()?.len(),
            });
        }
        let stale = self
            .bindings
            .iter()
            .filter(|b| !self.bindings.is_current(b.handle))
            .count();
        Ok(WorkspaceStatus {
            total_nodes: containers.iter().map(|c| c.nodes).sum(),
            containers,
            roots: self.bindings.roots().count(),
            layers: self.plan.layer_count(),
            stale,
        })
    }

    /// Forest listing in bind order
    pub fn rows(&self) -> Vec<BindingRow> {
        self.bindings
            .iter()
            .map(|b| BindingRow {
                order: b.handle.index(),
                name: b.name().to_string(),
                kind: b.kind.to_string(),
                parent: self.bindings.parent(b.handle).map(|p| p.name().to_string()),
                container: b.container_label.clone(),
                layer: b.layer,
                fingerprint: b.fingerprint.to_hex(),
                current: self.bindings.is_current(b.handle),
            })
            .collect()
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.contains('/') {
        return Err(ApiError::InvalidOperation(format!(
            "invalid node name {:?}: must be non-empty and contain no '/'",
            name
        )));
    }
    Ok(())
}
