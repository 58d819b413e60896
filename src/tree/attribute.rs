//! Leaf attributes.

use std::fmt;

use super::node::{Node, WeakNode};
use super::value::Value;

/// A named leaf value inside a [`Node`].
///
/// The parent link is non-owning and only used to compute paths. It is
/// set when the attribute is inserted into a node.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    value: Value,
    parent: WeakNode,
}

impl Attribute {
    /// Creates a detached attribute.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            parent: WeakNode::default(),
        }
    }

    /// Attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Replaces the value of this handle.
    ///
    /// Attributes are stored by value, so changing a copy obtained from
    /// [`Node::attribute`] does not change the tree; use [`Node::set`] or
    /// re-add it for that.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Consumes the attribute and returns its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Raw value for export to a nested mapping.
    #[must_use]
    pub fn to_plain_value(&self) -> Value {
        self.value.clone()
    }

    /// Node this attribute belongs to, if it is attached and the node is
    /// still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.parent.upgrade()
    }

    /// Full slash-separated path. A detached attribute's path is its name.
    #[must_use]
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}/{}", parent.path(), self.name),
            None => self.name.clone(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: WeakNode) {
        self.parent = parent;
    }

    pub(crate) fn detach(&mut self) {
        self.parent = WeakNode::default();
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.parent().map_or(0, |p| p.depth());
        let kind = self
            .value
            .value_type()
            .map_or_else(|| "null".to_string(), |t| t.to_string());
        write!(
            f,
            "{}{} = {} ({kind})",
            "\t".repeat(depth),
            self.name,
            self.value
        )
    }
}
