//! Container nodes and structural operations.
//!
//! A [`Node`] is a shared handle. Children are owned by their parent's
//! ordered mapping; parents are referenced weakly, so dropping the root
//! drops the whole tree. Borrows of the inner cell are never held across
//! calls into other nodes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};

use super::attribute::Attribute;
use super::node_type::NodeType;
use super::value::{Item, Mapping, Value};
use crate::error::TreeError;

// ============================================================================
// Handles
// ============================================================================

#[derive(Debug)]
pub(crate) struct NodeInner {
    name: String,
    node_type: NodeType,
    children: IndexMap<String, Child>,
    parent: WeakNode,
    /// Path-only parent of a node that is not yet inserted anywhere.
    anchor: WeakNode,
    depth: usize,
}

/// Shared handle to a configuration node.
///
/// Cloning the handle does not copy the node; use [`Node::deep_copy`] for
/// an independent tree.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeInner>>);

/// Non-owning link to a node.
#[derive(Debug, Clone, Default)]
pub struct WeakNode(Weak<RefCell<NodeInner>>);

impl WeakNode {
    /// Returns the node if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

/// A direct child of a node.
#[derive(Debug, Clone)]
pub enum Child {
    /// Nested node
    Node(Node),
    /// Leaf attribute
    Attribute(Attribute),
}

impl Child {
    /// Name under which the child is stored.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Node(n) => n.name(),
            Self::Attribute(a) => a.name().to_string(),
        }
    }

    /// Full path of the child.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Node(n) => n.path(),
            Self::Attribute(a) => a.path(),
        }
    }

    /// Returns the node, if this child is one.
    #[must_use]
    pub const fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            Self::Attribute(_) => None,
        }
    }

    /// Returns the attribute, if this child is one.
    #[must_use]
    pub const fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Self::Attribute(a) => Some(a),
            Self::Node(_) => None,
        }
    }

    /// Plain, independent projection of this child.
    #[must_use]
    pub fn to_item(&self) -> Item {
        match self {
            Self::Node(n) => Item::Map(n.to_mapping()),
            Self::Attribute(a) => Item::Value(a.to_plain_value()),
        }
    }
}

impl From<Node> for Child {
    fn from(n: Node) -> Self {
        Self::Node(n)
    }
}

impl From<Attribute> for Child {
    fn from(a: Attribute) -> Self {
        Self::Attribute(a)
    }
}

// ============================================================================
// Content accepted by `add`
// ============================================================================

/// Everything [`Node::add`] and [`Node::set`] accept.
#[derive(Debug, Clone)]
pub enum Content {
    /// A single node or attribute, inserted under its own name
    Child(Child),
    /// Several nodes or attributes
    Children(Vec<Child>),
    /// Name/item pairs; nested mappings become nodes
    Pairs(Vec<(String, Item)>),
    /// A raw mapping; nested mappings become nodes
    Map(Mapping),
    /// A bare value. Only valid where a path supplies its name.
    Value(Value),
}

impl From<Child> for Content {
    fn from(c: Child) -> Self {
        Self::Child(c)
    }
}

impl From<Node> for Content {
    fn from(n: Node) -> Self {
        Self::Child(Child::Node(n))
    }
}

impl From<Attribute> for Content {
    fn from(a: Attribute) -> Self {
        Self::Child(Child::Attribute(a))
    }
}

impl From<Vec<Child>> for Content {
    fn from(c: Vec<Child>) -> Self {
        Self::Children(c)
    }
}

impl From<Vec<Node>> for Content {
    fn from(nodes: Vec<Node>) -> Self {
        Self::Children(nodes.into_iter().map(Child::Node).collect())
    }
}

impl From<Vec<Attribute>> for Content {
    fn from(attrs: Vec<Attribute>) -> Self {
        Self::Children(attrs.into_iter().map(Child::Attribute).collect())
    }
}

impl From<Vec<(String, Item)>> for Content {
    fn from(pairs: Vec<(String, Item)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<Vec<(&str, Item)>> for Content {
    fn from(pairs: Vec<(&str, Item)>) -> Self {
        Self::Pairs(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<Mapping> for Content {
    fn from(m: Mapping) -> Self {
        Self::Map(m)
    }
}

impl From<Item> for Content {
    fn from(item: Item) -> Self {
        match item {
            Item::Map(m) => Self::Map(m),
            Item::Value(v) => Self::Value(v),
        }
    }
}

impl From<Value> for Content {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! content_from_scalar {
    ($($t:ty),*) => {
        $(impl From<$t> for Content {
            fn from(v: $t) -> Self {
                Self::Value(v.into())
            }
        })*
    };
}

content_from_scalar!(&str, String, bool, i64, i32, f64);

// ============================================================================
// Node
// ============================================================================

impl Node {
    /// Creates an empty, detached `Content` node.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_type(name, NodeType::Content)
    }

    /// Creates an empty, detached node of the given type.
    pub fn with_type(name: impl Into<String>, node_type: NodeType) -> Self {
        Self(Rc::new(RefCell::new(NodeInner {
            name: name.into(),
            node_type,
            children: IndexMap::new(),
            parent: WeakNode::default(),
            anchor: WeakNode::default(),
            depth: 1,
        })))
    }

    /// Creates a node and populates it from a raw mapping.
    ///
    /// # Errors
    ///
    /// Fails like [`Node::add`].
    pub fn from_mapping(name: impl Into<String>, mapping: Mapping) -> Result<Self, TreeError> {
        let node = Self::new(name);
        node.add(mapping)?;
        Ok(node)
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Current classification.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.0.borrow().node_type
    }

    pub(crate) fn store_node_type(&self, node_type: NodeType) {
        self.0.borrow_mut().node_type = node_type;
    }

    /// Distance from the root; the root has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.borrow().depth
    }

    /// Parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade()
    }

    /// Topmost ancestor (or this node when detached).
    #[must_use]
    pub fn root(&self) -> Self {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Full slash-separated path.
    ///
    /// A detached node named `root` has the empty path, so its children sit
    /// at `/name`. Any other detached node is at `/name`. An anchored node
    /// takes its path from the anchor.
    #[must_use]
    pub fn path(&self) -> String {
        let (name, parent) = {
            let inner = self.0.borrow();
            let parent = inner.parent.upgrade().or_else(|| inner.anchor.upgrade());
            (inner.name.clone(), parent)
        };
        match parent {
            Some(parent) => format!("{}/{name}", parent.path()),
            None if name == "root" => String::new(),
            None => format!("/{name}"),
        }
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Returns `true` when the node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().children.is_empty()
    }

    /// Returns `true` if a direct child with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().children.contains_key(name)
    }

    /// Direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Child> {
        self.0.borrow().children.get(name).cloned()
    }

    /// Direct children in insertion order.
    #[must_use]
    pub fn children(&self) -> Vec<Child> {
        self.0.borrow().children.values().cloned().collect()
    }

    /// Names of the direct children in insertion order.
    #[must_use]
    pub fn child_names(&self) -> Vec<String> {
        self.0.borrow().children.keys().cloned().collect()
    }

    /// Direct child nodes in insertion order.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Self> {
        self.0
            .borrow()
            .children
            .values()
            .filter_map(|c| c.as_node().cloned())
            .collect()
    }

    /// Returns `true` if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    // ------------------------------------------------------------------------
    // add
    // ------------------------------------------------------------------------

    /// Inserts content, replacing same-named children in place.
    ///
    /// Nested mappings become child nodes and everything else becomes an
    /// attribute. Nodes that already belong to another parent are moved.
    /// Node types are re-propagated afterwards.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidArgument`] for a bare value, an empty or
    ///   slash-containing name, or a node that would become its own
    ///   descendant.
    /// - [`TreeError::NodeTypePrecondition`] if propagation fails.
    pub fn add(&self, content: impl Into<Content>) -> Result<(), TreeError> {
        match content.into() {
            Content::Child(child) => self.attach(child)?,
            Content::Children(children) => {
                for child in children {
                    self.attach(child)?;
                }
            }
            Content::Pairs(pairs) => {
                for (name, item) in pairs {
                    self.attach_item(name, item)?;
                }
            }
            Content::Map(map) => {
                for (name, item) in map {
                    self.attach_item(name, item)?;
                }
            }
            Content::Value(value) => {
                return Err(TreeError::InvalidArgument {
                    message: format!(
                        "value {value} cannot be added to node {} without a name",
                        self.name()
                    ),
                });
            }
        }
        self.refresh_node_type()
    }

    fn attach_item(&self, name: String, item: Item) -> Result<(), TreeError> {
        check_name(&name)?;
        match item {
            Item::Map(map) => {
                // The new node knows its parent while it is being populated
                // but only joins the parent's children afterwards.
                let node = Self::new(name);
                node.link_parent(self);
                node.add(map)?;
                self.insert(Child::Node(node));
            }
            Item::Value(value) => {
                let mut attr = Attribute::new(name, value);
                attr.set_parent(self.downgrade());
                self.insert(Child::Attribute(attr));
            }
        }
        Ok(())
    }

    fn attach(&self, child: Child) -> Result<(), TreeError> {
        match child {
            Child::Node(node) => {
                let name = node.name();
                check_name(&name)?;
                if node.ptr_eq(self) || self.has_ancestor(&node) {
                    return Err(TreeError::InvalidArgument {
                        message: format!("node {name} cannot be added below itself"),
                    });
                }
                if let Some(old_parent) = node.parent()
                    && !old_parent.ptr_eq(self)
                {
                    old_parent.release(&node);
                }
                node.link_parent(self);
                self.insert(Child::Node(node));
            }
            Child::Attribute(mut attr) => {
                check_name(attr.name())?;
                attr.set_parent(self.downgrade());
                self.insert(Child::Attribute(attr));
            }
        }
        Ok(())
    }

    /// Inserts without propagation, detaching any node it replaces.
    pub(crate) fn insert(&self, child: Child) {
        let name = child.name();
        let replaced = self.0.borrow_mut().children.insert(name, child.clone());
        if let Some(Child::Node(old)) = replaced
            && !matches!(&child, Child::Node(new) if new.ptr_eq(&old))
        {
            old.unlink_parent();
        }
    }

    /// Removes a direct child without propagation.
    pub(crate) fn remove(&self, name: &str) -> Option<Child> {
        let removed = self.0.borrow_mut().children.shift_remove(name);
        match removed {
            Some(Child::Node(node)) => {
                node.unlink_parent();
                Some(Child::Node(node))
            }
            Some(Child::Attribute(mut attr)) => {
                attr.detach();
                Some(Child::Attribute(attr))
            }
            None => None,
        }
    }

    /// Drops `node` from this node's children if it is stored here.
    fn release(&self, node: &Self) {
        let name = node.name();
        let stored_here = matches!(
            self.0.borrow().children.get(&name),
            Some(Child::Node(n)) if n.ptr_eq(node)
        );
        if stored_here {
            self.0.borrow_mut().children.shift_remove(&name);
        }
    }

    pub(crate) fn link_parent(&self, parent: &Self) {
        {
            let mut inner = self.0.borrow_mut();
            inner.parent = parent.downgrade();
            inner.anchor = WeakNode::default();
        }
        self.update_depth(parent.depth() + 1);
    }

    /// Places a detached node below `parent` for paths and depth only.
    ///
    /// The node stays out of `parent`'s children and has no [`parent`](Self::parent),
    /// so node types do not propagate across the anchor.
    pub(crate) fn anchor_below(&self, parent: &Self) {
        self.0.borrow_mut().anchor = parent.downgrade();
        self.update_depth(parent.depth() + 1);
    }

    fn unlink_parent(&self) {
        {
            let mut inner = self.0.borrow_mut();
            inner.parent = WeakNode::default();
            inner.anchor = WeakNode::default();
        }
        self.update_depth(1);
    }

    fn update_depth(&self, depth: usize) {
        self.0.borrow_mut().depth = depth;
        for child in self.child_nodes() {
            child.update_depth(depth + 1);
        }
    }

    fn has_ancestor(&self, candidate: &Self) -> bool {
        let mut cursor = self.parent();
        while let Some(ancestor) = cursor {
            if ancestor.ptr_eq(candidate) {
                return true;
            }
            cursor = ancestor.parent();
        }
        false
    }

    // ------------------------------------------------------------------------
    // delete / set
    // ------------------------------------------------------------------------

    /// Deletes the node or attribute at `path`.
    ///
    /// A missing final segment is ignored.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NoPath`] when `path` has no segments (e.g. `"/"`).
    /// - [`TreeError::NotFound`] when an intermediate segment is missing.
    pub fn delete(&self, path: &str) -> Result<(), TreeError> {
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return Err(TreeError::NoPath);
        };
        let target = self.descend(parents, path)?;
        if target.remove(last).is_some() {
            tracing::debug!(path = %join_path(&target.path(), last), "deleted");
        }
        Ok(())
    }

    /// Adds or replaces content at `path`.
    ///
    /// With an empty path the content is added to this node. With a bare
    /// value or mapping the last segment names the new child; nodes and
    /// attributes keep their own names.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotFound`] when an intermediate segment is missing;
    ///   intermediate nodes are never created.
    /// - Anything [`Node::add`] reports.
    pub fn set(&self, path: &str, value: impl Into<Content>) -> Result<(), TreeError> {
        let value = value.into();
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return self.add(value);
        };
        let target = self.descend(parents, path)?;
        match value {
            Content::Child(child) => target.add(child),
            Content::Value(v) => target.add(vec![((*last).to_string(), Item::Value(v))]),
            Content::Map(m) => target.add(vec![((*last).to_string(), Item::Map(m))]),
            Content::Pairs(pairs) => target.add(vec![(
                (*last).to_string(),
                Item::Map(pairs.into_iter().collect()),
            )]),
            Content::Children(children) => {
                let node = Self::new(*last);
                node.add(children)?;
                target.add(node)
            }
        }
    }

    fn descend(&self, segments: &[&str], full_path: &str) -> Result<Self, TreeError> {
        let mut node = self.clone();
        for segment in segments {
            let next = node.child(segment).and_then(|c| c.as_node().cloned());
            node = next.ok_or_else(|| TreeError::NotFound {
                path: full_path.to_string(),
            })?;
        }
        Ok(node)
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Resolves `path` to a child handle. The empty path is this node.
    ///
    /// Returns `None` if a segment is missing or the path descends through
    /// an attribute.
    #[must_use]
    pub fn get_obj(&self, path: &str) -> Option<Child> {
        let mut current = Child::Node(self.clone());
        for segment in split_path(path) {
            let next = match &current {
                Child::Node(node) => node.child(segment)?,
                Child::Attribute(_) => return None,
            };
            current = next;
        }
        Some(current)
    }

    /// Node at `path`, if there is one.
    #[must_use]
    pub fn node(&self, path: &str) -> Option<Self> {
        match self.get_obj(path)? {
            Child::Node(n) => Some(n),
            Child::Attribute(_) => None,
        }
    }

    /// Attribute at `path`, if there is one.
    #[must_use]
    pub fn attribute(&self, path: &str) -> Option<Attribute> {
        match self.get_obj(path)? {
            Child::Attribute(a) => Some(a),
            Child::Node(_) => None,
        }
    }

    /// Deep, independent copy of whatever is at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Item> {
        self.get_obj(path).map(|c| c.to_item())
    }

    /// Value of the attribute at `path`.
    #[must_use]
    pub fn get_value(&self, path: &str) -> Option<Value> {
        self.attribute(path).map(Attribute::into_value)
    }

    /// Only the direct attributes of the node at `path`.
    #[must_use]
    pub fn get_attributes(&self, path: &str) -> Option<Mapping> {
        let node = self.node(path)?;
        let inner = node.0.borrow();
        Some(
            inner
                .children
                .iter()
                .filter_map(|(k, c)| {
                    c.as_attribute()
                        .map(|a| (k.clone(), Item::Value(a.to_plain_value())))
                })
                .collect(),
        )
    }

    /// Plain nested-mapping projection of this node.
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        self.children()
            .iter()
            .map(|c| (c.name(), c.to_item()))
            .collect()
    }

    /// Names (or full paths) of the direct child nodes at `path`.
    #[must_use]
    pub fn list_nodes(&self, path: &str, fullpath: bool) -> Vec<String> {
        self.list_children(path, fullpath, |c| c.as_node().is_some())
    }

    /// Names (or full paths) of the direct attributes at `path`.
    #[must_use]
    pub fn list_attributes(&self, path: &str, fullpath: bool) -> Vec<String> {
        self.list_children(path, fullpath, |c| c.as_attribute().is_some())
    }

    fn list_children(&self, path: &str, fullpath: bool, keep: impl Fn(&Child) -> bool) -> Vec<String> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        node.children()
            .iter()
            .filter(|c| keep(*c))
            .map(|c| {
                let name = c.name();
                if fullpath { join_path(path, &name) } else { name }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // search
    // ------------------------------------------------------------------------

    /// Paths of nodes below `path` holding an attribute that matches.
    ///
    /// An attribute matches when `name` is `None` or equal to its name and
    /// `predicate` accepts its value. The node directly containing it is
    /// reported. `depth` > 1 also reports containers up to `depth - 1`
    /// levels above, and `recursive` searches again from each descendant.
    /// Results are de-duplicated in discovery order.
    #[must_use]
    pub fn search<F>(
        &self,
        path: &str,
        name: Option<&str>,
        predicate: F,
        depth: usize,
        recursive: bool,
    ) -> Vec<String>
    where
        F: Fn(&Value) -> bool,
    {
        let Some(start) = self.node(path) else {
            return Vec::new();
        };
        let mut found = IndexSet::new();
        for child in start.child_nodes() {
            for hit in child.search_here(name, &predicate, depth, recursive) {
                found.insert(join_path(path, &hit));
            }
        }
        found.into_iter().collect()
    }

    fn search_here<F>(&self, name: Option<&str>, predicate: &F, depth: usize, recursive: bool) -> Vec<String>
    where
        F: Fn(&Value) -> bool,
    {
        let own_name = self.name();
        let mut hits = Vec::new();
        for child in self.children() {
            match child {
                Child::Node(node) => {
                    if recursive {
                        hits.extend(
                            node.search_here(name, predicate, depth, recursive)
                                .into_iter()
                                .map(|hit| join_path(&own_name, &hit)),
                        );
                    }
                    if depth > 1 && !node.search_here(name, predicate, depth - 1, false).is_empty() {
                        hits.push(own_name.clone());
                    }
                }
                Child::Attribute(attr) => {
                    if name.is_some_and(|n| n != attr.name()) {
                        continue;
                    }
                    if predicate(attr.value()) {
                        hits.push(own_name.clone());
                    }
                }
            }
        }
        hits
    }

    // ------------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------------

    /// Independent, detached copy of this subtree with the same types.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let copy = Self::with_type(self.name(), self.node_type());
        copy.copy_children_from(self);
        copy
    }

    fn copy_children_from(&self, source: &Self) {
        for child in source.children() {
            match child {
                Child::Node(node) => {
                    let copied = Self::with_type(node.name(), node.node_type());
                    copied.link_parent(self);
                    copied.copy_children_from(&node);
                    self.insert(Child::Node(copied));
                }
                Child::Attribute(mut attr) => {
                    attr.set_parent(self.downgrade());
                    self.insert(Child::Attribute(attr));
                }
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Node")
            .field("name", &inner.name)
            .field("node_type", &inner.node_type)
            .field("depth", &inner.depth)
            .field("children", &inner.children)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = self.parent().map_or_else(|| "/".to_string(), |p| p.name());
        let depth = self.depth();
        write!(
            f,
            "{}[{}] : (Type:{}, Parent:{parent}, Depth:{depth})",
            "\t".repeat(depth - 1),
            self.name(),
            self.node_type()
        )?;
        for child in self.children() {
            match child {
                Child::Node(n) => write!(f, "\n{n}")?,
                Child::Attribute(a) => write!(f, "\n{a}")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Splits a slash-separated path, dropping empty segments.
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Joins a base path and a relative one. An absolute `rel` wins.
#[must_use]
pub fn join_path(base: &str, rel: &str) -> String {
    if rel.starts_with('/') || base.is_empty() {
        rel.to_string()
    } else if base.ends_with('/') {
        format!("{base}{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

fn check_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains('/') {
        return Err(TreeError::InvalidArgument {
            message: format!("invalid child name {name:?}"),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
