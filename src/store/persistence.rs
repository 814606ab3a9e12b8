//! Sled-backed containers
//!
//! Each container is one sled database directory. Node names are the keys and nodes are
//! stored bincode-encoded.

use crate::error::StorageError;
use crate::store::{label_for, normalize_path, Container, OpenMode};
use crate::tree::node::Node;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SledContainer {
    label: String,
    path: PathBuf,
    mode: OpenMode,
    db: sled::Db,
}

impl SledContainer {
    /// Open or create a container according to `mode`
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, StorageError> {
        let path = normalize_path(path)?;
        let exists = path.exists();
        match mode {
            OpenMode::Read | OpenMode::ReadWrite if !exists => {
                return Err(StorageError::NotFound(path));
            }
            OpenMode::CreateNew if exists => {
                return Err(StorageError::AlreadyExists(path));
            }
            OpenMode::Truncate if exists => {
                info!(path = %path.display(), "Truncating container");
                if path.is_dir() {
                    std::fs::remove_dir_all(&path)?;
                } else {
                    std::fs::remove_file(&path)?;
                }
            }
            _ => {}
        }

        let db = sled::Config::new().path(&path).open()?;
        debug!(path = %path.display(), %mode, "Container opened");
        Ok(Self {
            label: label_for(&path),
            path,
            mode,
            db,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.mode.is_read_only() {
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

impl Container for SledContainer {
    fn label(&self) -> &str {
        &self.label
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.mode.is_read_only()
    }

    fn nodes(&self) -> Result<Vec<Node>, StorageError> {
        let mut nodes = Vec::new();
        for entry in self.db.iter() {
            let (_, value) = entry?;
            nodes.push(bincode::deserialize(&value)?);
        }
        Ok(nodes)
    }

    fn get(&self, name: &str) -> Result<Option<Node>, StorageError> {
        match self.db.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, node: &Node) -> Result<(), StorageError> {
        self.check_writable()?;
        let bytes = bincode::serialize(node)?;
        self.db.insert(node.name.as_bytes(), bytes)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.db
            .remove(name.as_bytes())?
            .map(|_| ())
            .ok_or_else(|| self.not_found(name))
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        if self.db.contains_key(to.as_bytes())? {
            return Err(StorageError::NodeExists {
                container: self.label.clone(),
                name: to.to_string(),
            });
        }
        let mut node = self.get(from)?.ok_or_else(|| self.not_found(from))?;
        node.name = to.to_string();
        let mut batch = sled::Batch::default();
        batch.insert(to.as_bytes(), bincode::serialize(&node)?);
        batch.remove(from.as_bytes());
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
