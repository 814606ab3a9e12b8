//! Forest Resolver
//!
//! Reconstructs parent/child structure from content fingerprints. See [`resolver`] for the
//! fixed-point pass; this module holds its output types and the staleness check.

pub mod resolver;

pub use resolver::{plan, resolve};

use crate::tree::hasher::fingerprint;
use crate::tree::node::Node;
use crate::types::{Fingerprint, NodeKey};
use serde::Serialize;
use std::collections::HashMap;

/// Resolved position of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Linkage {
    pub key: NodeKey,
    /// Resolved parent, `None` for roots and orphans
    pub parent: Option<NodeKey>,
    /// Distance from the nearest root or orphan
    pub layer: usize,
    /// Content fingerprint at resolution time
    pub fingerprint: Fingerprint,
}

/// Binding order for a whole forest: every parent precedes its children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForestPlan {
    order: Vec<Linkage>,
    position: HashMap<NodeKey, usize>,
}

impl ForestPlan {
    pub fn new(order: Vec<Linkage>) -> Self {
        let position = order
            .iter()
            .enumerate()
            .map(|(i, linkage)| (linkage.key.clone(), i))
            .collect();
        Self { order, position }
    }

    pub fn order(&self) -> &[Linkage] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bind index of a node
    pub fn position(&self, key: &NodeKey) -> Option<usize> {
        self.position.get(key).copied()
    }

    pub fn get(&self, key: &NodeKey) -> Option<&Linkage> {
        self.position(key).map(|i| &self.order[i])
    }

    pub fn parent_of(&self, key: &NodeKey) -> Option<&NodeKey> {
        self.get(key).and_then(|linkage| linkage.parent.as_ref())
    }

    pub fn roots(&self) -> impl Iterator<Item = &Linkage> {
        self.order.iter().filter(|linkage| linkage.parent.is_none())
    }

    pub fn children_of<'a>(&'a self, key: &'a NodeKey) -> impl Iterator<Item = &'a Linkage> + 'a {
        self.order
            .iter()
            .filter(move |linkage| linkage.parent.as_ref() == Some(key))
    }

    /// Number of layers, counting the root/orphan layer
    pub fn layer_count(&self) -> usize {
        self.order
            .iter()
            .map(|linkage| linkage.layer + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Whether a child's declared parent still equals its bound parent's current fingerprint
///
/// An unbound child (`parent == None`) is current only when it declared the sentinel.
pub fn is_current(declared_parent: Fingerprint, parent: Option<&Node>) -> bool {
    declared_parent == fingerprint(parent)
}
