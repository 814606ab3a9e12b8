//! Nodes and their content fingerprints

pub mod hasher;
pub mod node;

pub use hasher::fingerprint;
pub use node::{Access, Child, Entry, Node, Value};
