//! Node kinds
//!
//! Every node carries a `type` attribute naming its kind. Kinds are a closed set known
//! at compile time; each one owns the initializer that stamps a freshly created node
//! with its required attributes.

use crate::tree::node::{
    Node, CREATED_ATTR, DATA_KEY, LOG_ATTR, MODIFIED_ATTR, PARENT_ATTR, TYPE_ATTR,
};
use crate::types::Fingerprint;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format written to `created` and `modified`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp suffix used by generated node names
pub const NAME_STAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Supported node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain node: bookkeeping attributes plus an empty `data` child
    Basic,
}

type Initializer = fn(&mut Node, Fingerprint, DateTime<Local>);

struct KindSpec {
    kind: NodeKind,
    tag: &'static str,
    init: Initializer,
}

const KINDS: &[KindSpec] = &[KindSpec {
    kind: NodeKind::Basic,
    tag: "Basic",
    init: init_basic,
}];

fn init_basic(node: &mut Node, parent: Fingerprint, now: DateTime<Local>) {
    let created = now.format(TIMESTAMP_FORMAT).to_string();
    node.set_attribute(TYPE_ATTR, NodeKind::Basic.tag());
    node.set_attribute(PARENT_ATTR, parent.to_hex());
    node.set_attribute(CREATED_ATTR, created.clone());
    node.set_attribute(MODIFIED_ATTR, created);
    node.set_attribute(LOG_ATTR, "");
    node.children.remove(DATA_KEY);
    node.data_mut();
}

impl NodeKind {
    fn spec(&self) -> &'static KindSpec {
        KINDS
            .iter()
            .find(|spec| spec.kind == *self)
            .unwrap_or(&KINDS[0])
    }

    /// Tag stored in the `type` attribute
    pub fn tag(&self) -> &'static str {
        self.spec().tag
    }

    /// All registered kinds, in registration order
    pub fn all() -> impl Iterator<Item = NodeKind> {
        KINDS.iter().map(|spec| spec.kind)
    }

    /// Look a kind up by its exact `type` tag
    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        KINDS.iter().find(|spec| spec.tag == tag).map(|spec| spec.kind)
    }

    /// Create a node of this kind declaring `parent` as its parent fingerprint
    pub fn create(&self, name: impl Into<String>, parent: Fingerprint) -> Node {
        self.create_at(name, parent, Local::now())
    }

    pub fn create_at(
        &self,
        name: impl Into<String>,
        parent: Fingerprint,
        now: DateTime<Local>,
    ) -> Node {
        let mut node = Node::new(name);
        (self.spec().init)(&mut node, parent, now);
        node
    }

    /// Generated name: first lowercase letter of the tag followed by a timestamp
    pub fn default_name(&self, now: DateTime<Local>) -> String {
        let initial = self
            .tag()
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('n');
        format!("{}{}", initial, now.format(NAME_STAMP_FORMAT))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    /// Accepts the exact tag or its lowercase form (`Basic`, `basic`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KINDS
            .iter()
            .find(|spec| spec.tag == s || spec.tag.to_lowercase() == s)
            .map(|spec| spec.kind)
            .ok_or_else(|| {
                let known: Vec<_> = KINDS.iter().map(|spec| spec.tag).collect();
                format!("unknown node kind {:?} (known: {})", s, known.join(", "))
            })
    }
}
