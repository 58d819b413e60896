//! Templates: declarative schemas for configuration trees.
//!
//! A template tree describes the expected shape of a configuration tree.
//! Validating a node against a template inserts defaults, coerces values
//! to their declared types, runs validator callbacks and reports the
//! first violation with the full path of the offending element.
//!
//! - [`FixedAttribute`] / [`VariableAttribute`]: leaf values with a known
//!   or an arbitrary name.
//! - [`FixedNode`]: a named section with declared children.
//! - [`VariableNode`]: a named section whose attributes all share one
//!   [`VariableAttribute`] template.
//! - [`NodeSet`]: several sibling sections of the same shape with known
//!   names.

pub mod attribute;
pub mod node;
pub mod node_set;
pub mod sample;
pub mod schema_file;
pub mod validators;

use std::fmt;
use std::rc::Rc;

pub use attribute::{AttributeSpec, FixedAttribute, VariableAttribute};
pub use node::{FixedNode, NodeTemplate, VariableNode};
pub use node_set::NodeSet;
pub use sample::SampleFormat;
pub use schema_file::SchemaDocument;

use crate::error::Result;
use crate::tree::Node;

// ============================================================================
// Validators
// ============================================================================

/// Validator callback over a value of type `T`.
///
/// Returns `Ok(true)` to accept, `Ok(false)` to reject, or `Err(detail)`
/// to reject with a diagnostic that is appended to the error message.
pub struct Validator<T: ?Sized>(Rc<dyn Fn(&T) -> std::result::Result<bool, String>>);

impl<T: ?Sized> Validator<T> {
    /// Wraps a callback that may report a diagnostic.
    pub fn new(f: impl Fn(&T) -> std::result::Result<bool, String> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wraps a plain predicate.
    pub fn predicate(f: impl Fn(&T) -> bool + 'static) -> Self {
        Self(Rc::new(move |v| Ok(f(v))))
    }

    /// Runs the callback. `Err` carries the optional diagnostic.
    pub(crate) fn check(&self, input: &T) -> std::result::Result<(), Option<String>> {
        match (self.0)(input) {
            Ok(true) => Ok(()),
            Ok(false) => Err(None),
            Err(detail) => Err(Some(detail)),
        }
    }
}

impl<T: ?Sized> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Generates the root template for a freshly loaded tree.
///
/// The tree is passed before validation so the schema can depend on it,
/// for example by declaring one section per configured source.
pub type SchemaGenerator = Rc<dyn Fn(&Node) -> Result<FixedNode>>;

// ============================================================================
// Template
// ============================================================================

/// Any template that can be a child of a [`FixedNode`].
#[derive(Debug, Clone)]
pub enum Template {
    /// Fixed-name attribute
    Attribute(FixedAttribute),
    /// Fixed-name node with declared children
    Node(FixedNode),
    /// Node with arbitrary attribute names
    VariableNode(VariableNode),
    /// Family of same-shaped sibling nodes
    NodeSet(NodeSet),
}

impl Template {
    /// Name under which the template is registered in its parent.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Attribute(t) => t.name(),
            Self::Node(t) => t.name(),
            Self::VariableNode(t) => t.name(),
            Self::NodeSet(t) => t.name(),
        }
    }

    /// Returns `true` for attribute templates.
    #[must_use]
    pub const fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute(_))
    }
}

impl From<FixedAttribute> for Template {
    fn from(t: FixedAttribute) -> Self {
        Self::Attribute(t)
    }
}

impl From<FixedNode> for Template {
    fn from(t: FixedNode) -> Self {
        Self::Node(t)
    }
}

impl From<VariableNode> for Template {
    fn from(t: VariableNode) -> Self {
        Self::VariableNode(t)
    }
}

impl From<NodeSet> for Template {
    fn from(t: NodeSet) -> Self {
        Self::NodeSet(t)
    }
}

impl From<NodeTemplate> for Template {
    fn from(t: NodeTemplate) -> Self {
        match t {
            NodeTemplate::Fixed(n) => Self::Node(n),
            NodeTemplate::Variable(n) => Self::VariableNode(n),
        }
    }
}
