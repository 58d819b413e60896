//! Hierarchical key-value store backend.
//!
//! Each store path holds a byte blob and may have children. A tree maps
//! onto the store one [`NodeType::AbstractNode`] per path segment:
//!
//! - an abstract node stores its direct attributes as a JSON blob and one
//!   child path per child node;
//! - a content node stores its whole subtree as one JSON blob;
//! - a content node cannot be written on its own.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::codec;
use crate::error::{Result, SourceError};
use crate::tree::{Node, NodeType};

// ============================================================================
// Store interface
// ============================================================================

/// Change notification delivered to watchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Data at the path changed
    Data(String),
    /// A child was created or deleted below the path
    Children(String),
}

impl StoreEvent {
    /// Path the event refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Data(p) | Self::Children(p) => p,
        }
    }
}

/// Callback invoked for store changes at or below a watched path.
pub type WatchCallback = Rc<dyn Fn(&StoreEvent)>;

/// Minimal hierarchical key-value store.
///
/// Paths are absolute and slash-separated. Implementations deliver watch
/// notifications without holding internal borrows, so callbacks may call
/// back into the store.
pub trait KvStore {
    /// Returns `true` if the path exists.
    fn exists(&self, path: &str) -> bool;

    /// Blob stored at the path, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Store-specific failures.
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Names of the direct children of the path.
    ///
    /// # Errors
    ///
    /// Store-specific failures.
    fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Creates the path with `data`, creating missing ancestors empty.
    ///
    /// # Errors
    ///
    /// Fails if the path already exists.
    fn create(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Replaces the blob at an existing path.
    ///
    /// # Errors
    ///
    /// Fails if the path does not exist.
    fn set(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Deletes the path and everything below it. Missing paths are ignored.
    ///
    /// # Errors
    ///
    /// Store-specific failures.
    fn delete_recursive(&self, path: &str) -> Result<()>;

    /// Registers a callback for changes at or below `path`.
    ///
    /// # Errors
    ///
    /// Store-specific failures.
    fn watch(&self, path: &str, callback: WatchCallback) -> Result<()>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process [`KvStore`] with synchronous notifications.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, Vec<u8>>>,
    watchers: RefCell<Vec<(String, WatchCallback)>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.borrow().len())
            .field("watchers", &self.watchers.borrow().len())
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored paths in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn notify(&self, event: &StoreEvent) {
        let targets: Vec<WatchCallback> = self
            .watchers
            .borrow()
            .iter()
            .filter(|(watched, _)| is_within(event.path(), watched))
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in targets {
            callback(event);
        }
    }
}

impl KvStore for MemoryStore {
    fn exists(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(&normalize(path))
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.borrow().get(&normalize(path)).cloned())
    }

    fn children(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        let prefix = if path == "/" { path.clone() } else { format!("{path}/") };
        let entries = self.entries.borrow();
        Ok(entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                let rest = &k[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    fn create(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        let mut created = Vec::new();
        {
            let mut entries = self.entries.borrow_mut();
            if entries.contains_key(&path) {
                return Err(store_error(&path, "node already exists"));
            }
            for ancestor in ancestors(&path) {
                if !entries.contains_key(&ancestor) {
                    entries.insert(ancestor.clone(), Vec::new());
                    created.push(ancestor);
                }
            }
            entries.insert(path.clone(), data.to_vec());
        }
        for ancestor in created {
            self.notify(&StoreEvent::Children(parent_of(&ancestor)));
        }
        self.notify(&StoreEvent::Children(parent_of(&path)));
        Ok(())
    }

    fn set(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        {
            let mut entries = self.entries.borrow_mut();
            let Some(slot) = entries.get_mut(&path) else {
                return Err(store_error(&path, "node does not exist"));
            };
            *slot = data.to_vec();
        }
        self.notify(&StoreEvent::Data(path));
        Ok(())
    }

    fn delete_recursive(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|k, _| !is_within(k, &path));
            before != entries.len()
        };
        if removed {
            self.notify(&StoreEvent::Children(parent_of(&path)));
        }
        Ok(())
    }

    fn watch(&self, path: &str, callback: WatchCallback) -> Result<()> {
        self.watchers.borrow_mut().push((normalize(path), callback));
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `true` when `path` equals `base` or lies below it.
fn is_within(path: &str, base: &str) -> bool {
    base == "/"
        || path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// Proper ancestors of `path`, outermost first, excluding `/`.
fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut cursor = parent_of(path);
    while cursor != "/" {
        result.push(cursor.clone());
        cursor = parent_of(&cursor);
    }
    result.reverse();
    result
}

fn store_error(path: &str, message: &str) -> crate::Error {
    SourceError::Store {
        path: path.to_string(),
        message: message.to_string(),
    }
    .into()
}

// ============================================================================
// Tree reader / writer
// ============================================================================

/// Reads the subtree stored at `path` into a node called `name`.
///
/// Returns `None` if the path does not exist.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] for a childless path whose blob is not a
/// JSON object.
pub fn read_tree(store: &dyn KvStore, path: &str, name: &str) -> Result<Option<Node>> {
    if !store.exists(path) {
        tracing::error!(path = %path, "store path does not exist");
        return Ok(None);
    }
    let children = store.children(path)?;
    let blob = store.get(path)?.unwrap_or_default();
    tracing::debug!(name = %name, path = %path, "reading store node");

    let text = String::from_utf8_lossy(&blob);
    let node = match codec::decode_json(&text, path) {
        Ok(mapping) => {
            let node = Node::with_type(name, NodeType::ContentNode);
            node.add(mapping)?;
            node
        }
        Err(_) if !children.is_empty() => Node::new(name),
        Err(err) => {
            tracing::error!(path = %path, "unable to read store node");
            return Err(err);
        }
    };

    if !children.is_empty() {
        node.set_node_type(NodeType::AbstractNode)?;
        let base = path.trim_end_matches('/');
        for child in children {
            if let Some(child_node) = read_tree(store, &format!("{base}/{child}"), &child)? {
                node.add(child_node)?;
            }
        }
    }
    Ok(Some(node))
}

/// Writes `node` to `path`.
///
/// # Errors
///
/// - [`SourceError::Unsupported`] for a `Content` node.
/// - [`SourceError::Store`] if the path exists and `force` is not set.
pub fn write_tree(store: &dyn KvStore, node: &Node, path: &str, force: bool) -> Result<()> {
    let content = match node.node_type() {
        NodeType::Content => {
            tracing::error!(node = %node.name(), "write called on content node");
            return Err(SourceError::Unsupported {
                reason: format!("write method called on Content node {}", node.name()),
            }
            .into());
        }
        NodeType::ContentNode => codec::encode_json_compact(&node.to_mapping())?,
        NodeType::AbstractNode => {
            let attributes = node.get_attributes("").unwrap_or_default();
            codec::encode_json_compact(&attributes)?
        }
    };

    if store.exists(path) {
        if !force {
            tracing::error!(path = %path, "store path already exists and force is not set");
            return Err(store_error(
                path,
                "path already exists and force attribute is not set",
            ));
        }
        store.delete_recursive(path)?;
    }
    store.create(path, content.as_bytes())?;

    if node.node_type() == NodeType::AbstractNode {
        let base = path.trim_end_matches('/');
        for child in node.child_nodes() {
            write_tree(store, &child, &format!("{base}/{}", child.name()), force)?;
        }
    }
    tracing::debug!(path = %path, "saved node to store");
    Ok(())
}
