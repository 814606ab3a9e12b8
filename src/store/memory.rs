//! In-memory container for tests and scratch work

use crate::error::StorageError;
use crate::store::Container;
use crate::tree::node::Node;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct MemoryContainer {
    label: String,
    path: PathBuf,
    read_only: bool,
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryContainer {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            path: PathBuf::from(format!("memory://{}", label)),
            label,
            read_only: false,
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Freeze the container: subsequent writes fail with `ReadOnly`
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly(self.label.clone()));
        }
        Ok(())
    }

    fn not_found(&self, name: &str) -> StorageError {
        StorageError::NodeNotFound {
            container: self.label.clone(),
            name: name.to_string(),
        }
    }
}

impl Container for MemoryContainer {
    fn label(&self) -> &str {
        &self.label
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn nodes(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.nodes.read().values().cloned().collect())
    }

    fn get(&self, name: &str) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.read().get(name).cloned())
    }

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        self.check_writable()?;
        self.nodes.write().insert(node.name.clone(), node.clone());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.nodes
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| self.not_found(name))
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(to) {
            return Err(StorageError::NodeExists {
                container: self.label.clone(),
                name: to.to_string(),
            });
        }
        let mut node = nodes.remove(from).ok_or_else(|| self.not_found(from))?;
        node.name = to.to_string();
        nodes.insert(to.to_string(), node);
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory container whose flush always fails
#[cfg(test)]
pub(crate) struct UnflushableContainer(pub MemoryContainer);

#[cfg(test)]
impl Container for UnflushableContainer {
    fn label(&self) -> &str {
        self.0.label()
    }

    fn path(&self) -> &Path {
        self.0.path()
    }

    fn is_read_only(&self) -> bool {
        self.0.is_read_only()
    }

    fn nodes(&self) -> Result<Vec<Node>, StorageError> {
        self.0.nodes()
    }

    fn get(&self, name: &str) -> Result<Option<Node>, StorageError> {
        self.0.get(name)
    }

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        self.0.put(node)
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.0.remove(name)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.0.rename(from, to)
    }

    fn flush(&self) -> Result<(), StorageError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
    }
}
