//! Grove: content-fingerprinted node forests
//!
//! Nodes live in containers and never store pointers to each other. Each node records
//! the fingerprint its parent had when the node was created; the forest is rebuilt
//! from those fingerprints every time the set of nodes changes.

pub mod binding;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod forest;
pub mod kinds;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod workspace;

pub use binding::{Binding, BindingHandle, BindingSink, BindingTable};
pub use concurrency::SharedWorkspace;
pub use error::{ApiError, ForestError, StorageError};
pub use kinds::NodeKind;
pub use store::{Container, ContainerSelector, OpenMode};
pub use types::{Fingerprint, NodeKey};
pub use workspace::Workspace;
