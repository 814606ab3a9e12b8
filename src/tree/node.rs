//! Node types and typed attribute/child access

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved child key holding the fingerprinted payload
pub const DATA_KEY: &str = "data";
/// Required attribute naming the node kind
pub const TYPE_ATTR: &str = "type";
/// Required attribute holding the declared parent fingerprint
pub const PARENT_ATTR: &str = "parent";
pub const CREATED_ATTR: &str = "created";
pub const MODIFIED_ATTR: &str = "modified";
pub const LOG_ATTR: &str = "log";

/// Scalar or array value stored as an attribute or a leaf data block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl Value {
    /// Canonical raw byte representation fed to the fingerprint hasher
    ///
    /// Numbers are little-endian, 8 bytes per element.
    pub fn raw_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int(v) => v.to_le_bytes().to_vec(),
            Value::Float(v) => v.to_le_bytes().to_vec(),
            Value::Bool(v) => vec![u8::from(*v)],
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Bytes(b) => b.clone(),
            Value::IntArray(vs) => vs.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Value::FloatArray(vs) => vs.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a command-line token list into the narrowest matching value
    ///
    /// A single token becomes a scalar, several tokens an array. Tokens that are not
    /// all integers or all floats are joined into a string.
    pub fn parse_tokens(tokens: &[String]) -> Value {
        if tokens.len() == 1 {
            let t = tokens[0].as_str();
            if let Ok(v) = t.parse::<i64>() {
                return Value::Int(v);
            }
            if let Ok(v) = t.parse::<f64>() {
                return Value::Float(v);
            }
            return match t {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Str(t.to_string()),
            };
        }
        if let Ok(ints) = tokens.iter().map(|t| t.parse::<i64>()).collect::<Result<Vec<_>, _>>() {
            return Value::IntArray(ints);
        }
        if let Ok(floats) = tokens.iter().map(|t| t.parse::<f64>()).collect::<Result<Vec<_>, _>>() {
            return Value::FloatArray(floats);
        }
        Value::Str(tokens.join(" "))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::IntArray(vs) => write!(f, "{:?}", vs),
            Value::FloatArray(vs) => write!(f, "{:?}", vs),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(vs: Vec<i64>) -> Self {
        Value::IntArray(vs)
    }
}

impl From<Vec<f64>> for Value {
    fn from(vs: Vec<f64>) -> Self {
        Value::FloatArray(vs)
    }
}

/// Child entry of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Child {
    Node(Node),
    Data(Value),
}

/// Named, attributed node
///
/// Both maps are key-ordered, so iteration is canonical regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub attributes: BTreeMap<String, Value>,
    pub children: BTreeMap<String, Child>,
}

/// Result of looking a key up on a node: attributes win over children
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Access<'a> {
    Attribute(&'a Value),
    ChildNode(&'a Node),
    ChildData(&'a Value),
}

/// Owned form of [`Access`], for values read out of a container
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Entry {
    Attribute(Value),
    Node(Node),
    Data(Value),
}

impl From<Access<'_>> for Entry {
    fn from(access: Access<'_>) -> Self {
        match access {
            Access::Attribute(value) => Entry::Attribute(value.clone()),
            Access::ChildNode(node) => Entry::Node(node.clone()),
            Access::ChildData(value) => Entry::Data(value.clone()),
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.children.insert(key.into(), Child::Data(value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.insert(child.name.clone(), Child::Node(child));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// String attribute, or `None` when absent or not a string
    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn child(&self, key: &str) -> Option<&Child> {
        self.children.get(key)
    }

    /// Typed lookup: attribute keys first, then child keys
    pub fn access(&self, key: &str) -> Option<Access<'_>> {
        if let Some(value) = self.attributes.get(key) {
            return Some(Access::Attribute(value));
        }
        match self.children.get(key)? {
            Child::Node(node) => Some(Access::ChildNode(node)),
            Child::Data(value) => Some(Access::ChildData(value)),
        }
    }

    /// Mutable handle on the reserved `data` child node, created when missing
    ///
    /// A leaf block stored under `data` is replaced by an empty node.
    pub fn data_mut(&mut self) -> &mut Node {
        let entry = self
            .children
            .entry(DATA_KEY.to_string())
            .or_insert_with(|| Child::Node(Node::new(DATA_KEY)));
        if let Child::Data(_) = entry {
            *entry = Child::Node(Node::new(DATA_KEY));
        }
        match entry {
            Child::Node(node) => node,
            Child::Data(_) => unreachable!("data child was just replaced by a node"),
        }
    }

    /// Concatenated raw bytes of all children then all attributes, each in key order
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_raw(&mut buf);
        buf
    }

    pub(crate) fn write_raw(&self, buf: &mut Vec<u8>) {
        for child in self.children.values() {
            match child {
                Child::Node(node) => node.write_raw(buf),
                Child::Data(value) => buf.extend_from_slice(&value.raw_bytes()),
            }
        }
        for value in self.attributes.values() {
            buf.extend_from_slice(&value.raw_bytes());
        }
    }
}
