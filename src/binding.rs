//! Binding Sink
//!
//! The resolver hands every node to a sink exactly once per pass, parents first. The
//! binding table is the sink used by the workspace: an explicit table keyed by node
//! identity, rebuilt from scratch on every pass.

use crate::error::ForestError;
use crate::forest::Linkage;
use crate::kinds::NodeKind;
use crate::store::NodeRecord;
use crate::types::{ContainerId, Fingerprint, NodeKey};
use serde::Serialize;
use std::collections::HashMap;

/// Consumer of resolved nodes
pub trait BindingSink {
    type Handle: Copy;

    /// Invalidate every handle produced by the previous pass
    fn clear(&mut self);

    /// Materialize one node; `parent` is the handle returned for its resolved parent
    fn bind(&mut self, record: &NodeRecord, linkage: &Linkage, parent: Option<Self::Handle>)
        -> Self::Handle;
}

/// Index into the binding table, valid until the next pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BindingHandle(usize);

impl BindingHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One bound node
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    pub handle: BindingHandle,
    pub key: NodeKey,
    pub container_label: String,
    pub kind: NodeKind,
    pub declared_parent: Fingerprint,
    /// Fingerprint at bind time
    pub fingerprint: Fingerprint,
    pub parent: Option<BindingHandle>,
    pub layer: usize,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn container(&self) -> ContainerId {
        self.key.container
    }

    /// Whether `qualifier` names this binding's container by label or `#id`
    fn in_container(&self, qualifier: &str) -> bool {
        self.container_label == qualifier || self.container().to_string() == qualifier
    }
}

/// Binding table: handles in bind order plus identity and name indexes
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: Vec<Binding>,
    by_key: HashMap<NodeKey, BindingHandle>,
    by_name: HashMap<String, Vec<BindingHandle>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in bind order
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn get(&self, handle: BindingHandle) -> Option<&Binding> {
        self.entries.get(handle.0)
    }

    pub fn by_key(&self, key: &NodeKey) -> Option<&Binding> {
        self.by_key.get(key).and_then(|h| self.get(*h))
    }

    /// Look a binding up by node name
    ///
    /// `name` may be qualified as `<container>/<name>`, where the container is its label
    /// or its `#id`. Fails when the name is unbound or still matches more than one
    /// container.
    pub fn find(&self, name: &str) -> Result<&Binding, ForestError> {
        let (container, node) = match name.split_once('/') {
            Some((container, node)) => (Some(container), node),
            None => (None, name),
        };
        let handles: Vec<BindingHandle> = self
            .by_name
            .get(node)
            .into_iter()
            .flatten()
            .copied()
            .filter(|h| container.map_or(true, |c| self.entries[h.0].in_container(c)))
            .collect();
        match handles.as_slice() {
            [] => Err(ForestError::Lookup(format!("No node named {:?}", name))),
            [handle] => Ok(&self.entries[handle.0]),
            handles => {
                let labels: Vec<_> = handles
                    .iter()
                    .map(|h| {
                        let b = &self.entries[h.0];
                        format!("{} ({})", b.container_label, b.container())
                    })
                    .collect();
                Err(ForestError::Lookup(format!(
                    "Node name {:?} is ambiguous: bound in {}; qualify it as <container>/{}",
                    name,
                    labels.join(", "),
                    node
                )))
            }
        }
    }

    pub fn parent(&self, handle: BindingHandle) -> Option<&Binding> {
        self.get(handle).and_then(|b| b.parent).and_then(|p| self.get(p))
    }

    pub fn children(&self, handle: BindingHandle) -> impl Iterator<Item = &Binding> {
        self.entries
            .iter()
            .filter(move |b| b.parent == Some(handle))
    }

    pub fn roots(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter().filter(|b| b.parent.is_none())
    }

    /// Whether the binding's declared parent equals its parent's fingerprint at bind time
    pub fn is_current(&self, handle: BindingHandle) -> bool {
        let Some(binding) = self.get(handle) else {
            return false;
        };
        let parent_fp = self
            .parent(handle)
            .map(|p| p.fingerprint)
            .unwrap_or(Fingerprint::SENTINEL);
        binding.declared_parent == parent_fp
    }

    /// One-line description: `Basic e (a) from /e in store.grove`
    pub fn describe(&self, handle: BindingHandle) -> Option<String> {
        let binding = self.get(handle)?;
        let parent = self
            .parent(handle)
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| "-".to_string());
        Some(format!(
            "{} {} ({}) from /{} in {}",
            binding.kind,
            binding.name(),
            parent,
            binding.name(),
            binding.container_label
        ))
    }
}

impl BindingSink for BindingTable {
    type Handle = BindingHandle;

    fn clear(&mut self) {
        self.entries.clear();
        self.by_key.clear();
        self.by_name.clear();
    }

    fn bind(
        &mut self,
        record: &NodeRecord,
        linkage: &Linkage,
        parent: Option<BindingHandle>,
    ) -> BindingHandle {
        if let Some(existing) = self.by_key.get(&record.key) {
            let entry = &self.entries[existing.0];
            if entry.parent == parent && entry.fingerprint == linkage.fingerprint {
                return *existing;
            }
        }

        let handle = BindingHandle(self.entries.len());
        self.entries.push(Binding {
            handle,
            key: record.key.clone(),
            container_label: record.container_label.clone(),
            kind: record.kind,
            declared_parent: record.declared_parent,
            fingerprint: linkage.fingerprint,
            parent,
            layer: linkage.layer,
        });
        if let Some(previous) = self.by_key.insert(record.key.clone(), handle) {
            // Rebinding with different inputs supersedes the stale entry in the name index
            if let Some(handles) = self.by_name.get_mut(&record.key.name) {
                handles.retain(|h| *h != previous);
            }
        }
        self.by_name
            .entry(record.key.name.clone())
            .or_default()
            .push(handle);
        handle
    }
}
