//! Fingerprint computation for nodes
//!
//! A fingerprint digests the node's reserved `data` child only: every entry's raw bytes
//! in key order, then every attribute of `data` in key order. Bookkeeping attributes on
//! the node itself (`type`, `parent`, timestamps, log) never contribute, so editing them
//! does not re-parent anything.

use crate::tree::node::{Child, Node, DATA_KEY};
use crate::types::{Fingerprint, FINGERPRINT_LEN};

/// Compute the fingerprint of a node, or the sentinel for `None`
pub fn fingerprint(node: Option<&Node>) -> Fingerprint {
    match node {
        None => Fingerprint::SENTINEL,
        Some(node) => digest(&data_bytes(node)),
    }
}

/// Raw bytes covered by the fingerprint
pub fn data_bytes(node: &Node) -> Vec<u8> {
    match node.child(DATA_KEY) {
        None => Vec::new(),
        Some(Child::Node(data)) => data.raw_bytes(),
        Some(Child::Data(value)) => value.raw_bytes(),
    }
}

/// BLAKE3 in extendable-output mode, truncated to the fingerprint width
pub fn digest(bytes: &[u8]) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    hasher.update(bytes);
    let mut out = [0u8; FINGERPRINT_LEN];
    hasher.finalize_xof().fill(&mut out);
    Fingerprint::from_bytes(out)
}
