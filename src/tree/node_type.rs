//! Node classification and its propagation rules.
//!
//! Every node is `Content` (plain values), `ContentNode` (a subtree that
//! serializes as one blob) or `AbstractNode` (a container whose children
//! are themselves typed nodes). The classes must stay consistent: an
//! abstract node only holds content nodes or abstract nodes, and a content
//! node only holds content. Changing one node's type therefore rewrites its
//! neighbours.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::node::Node;
use crate::error::TreeError;

/// Classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    /// Holds plain values only.
    #[default]
    #[serde(rename = "C", alias = "content")]
    Content,
    /// Holds a subtree usable as a single serialized blob.
    #[serde(rename = "CN", alias = "content_node")]
    ContentNode,
    /// Container of typed nodes; one level of hierarchical storage.
    #[serde(rename = "AN", alias = "abstract_node")]
    AbstractNode,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "C",
            Self::ContentNode => "CN",
            Self::AbstractNode => "AN",
        })
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "content" => Ok(Self::Content),
            "cn" | "content_node" => Ok(Self::ContentNode),
            "an" | "abstract_node" => Ok(Self::AbstractNode),
            other => Err(format!("unknown node type: {other}")),
        }
    }
}

/// Consequences of moving a node from one type to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Propagation {
    /// Type applied to every direct child node.
    pub children: Option<NodeType>,
    /// Type applied to every ancestor.
    pub ancestors: Option<NodeType>,
    /// Whether some ancestor must already be a content node.
    pub needs_content_node_ancestor: bool,
}

impl Propagation {
    /// Looks up the transition table.
    #[must_use]
    pub const fn for_transition(current: NodeType, new: NodeType) -> Self {
        use NodeType::{AbstractNode, Content, ContentNode};

        let (children, ancestors, needs_content_node_ancestor) = match (current, new) {
            (Content, ContentNode) => (None, Some(AbstractNode), false),
            (Content, AbstractNode) => (Some(ContentNode), Some(AbstractNode), false),
            (ContentNode, AbstractNode) => (Some(ContentNode), None, false),
            (AbstractNode, ContentNode) => (Some(Content), None, false),
            (ContentNode, Content) => (None, None, true),
            (AbstractNode, Content) => (Some(Content), None, true),
            _ => (None, None, false),
        };
        Self {
            children,
            ancestors,
            needs_content_node_ancestor,
        }
    }
}

impl Node {
    /// Changes this node's type and rewrites the neighbours it affects.
    ///
    /// Setting the current type is a no-op. Propagation recurses: every
    /// neighbour change goes through `set_node_type` itself.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeTypePrecondition`] when demoting to
    /// `Content` with no `ContentNode` ancestor. The node is left unchanged
    /// in that case.
    pub fn set_node_type(&self, new_type: NodeType) -> Result<(), TreeError> {
        let current = self.node_type();
        if current == new_type {
            return Ok(());
        }
        let rule = Propagation::for_transition(current, new_type);
        if rule.needs_content_node_ancestor && !self.has_content_node_ancestor() {
            return Err(TreeError::NodeTypePrecondition { name: self.name() });
        }

        tracing::trace!(path = %self.path(), from = %current, to = %new_type, "node type change");
        self.store_node_type(new_type);

        if let Some(ancestor_type) = rule.ancestors {
            let mut cursor = self.parent();
            while let Some(ancestor) = cursor {
                ancestor.set_node_type(ancestor_type)?;
                cursor = ancestor.parent();
            }
        }
        if let Some(child_type) = rule.children {
            for child in self.child_nodes() {
                child.set_node_type(child_type)?;
            }
        }
        Ok(())
    }

    /// Re-applies the consequences of the current type without changing it.
    ///
    /// Called after structural changes so newly inserted children and the
    /// parent agree with this node's type.
    ///
    /// # Errors
    ///
    /// Propagates precondition failures from neighbour changes.
    pub fn refresh_node_type(&self) -> Result<(), TreeError> {
        let parent = self.parent();
        match self.node_type() {
            NodeType::AbstractNode => {
                if let Some(parent) = parent {
                    parent.set_node_type(NodeType::AbstractNode)?;
                }
                for child in self.child_nodes() {
                    if child.node_type() == NodeType::Content {
                        child.set_node_type(NodeType::ContentNode)?;
                    }
                }
            }
            NodeType::ContentNode => {
                if let Some(parent) = parent {
                    parent.set_node_type(NodeType::AbstractNode)?;
                }
                for child in self.child_nodes() {
                    child.set_node_type(NodeType::Content)?;
                }
            }
            NodeType::Content => {
                if let Some(parent) = parent
                    && parent.node_type() == NodeType::AbstractNode
                {
                    parent.set_node_type(NodeType::ContentNode)?;
                }
                for child in self.child_nodes() {
                    child.set_node_type(NodeType::Content)?;
                }
            }
        }
        Ok(())
    }

    fn has_content_node_ancestor(&self) -> bool {
        let mut cursor = self.parent();
        while let Some(ancestor) = cursor {
            if ancestor.node_type() == NodeType::ContentNode {
                return true;
            }
            cursor = ancestor.parent();
        }
        false
    }
}
