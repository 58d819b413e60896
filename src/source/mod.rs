//! Configuration sources: files in three formats and key-value stores.
//!
//! A [`Source`] is parsed from a string identifier:
//!
//! | Identifier | Source |
//! |---|---|
//! | `kv:///app/config`, `zookeeper://host:2181/app/config` | store path |
//! | `*.json` | JSON file |
//! | `*.yaml`, `*.yml` | YAML file |
//! | anything else | text file |

pub mod codec;
pub mod store;
pub mod text;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};
use crate::tree::{Mapping, Node};
pub use store::{KvStore, MemoryStore, StoreEvent, WatchCallback};

/// File serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `[section]` / `key = value` text
    Text,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl Format {
    /// Format implied by a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Text,
        }
    }

    /// Parses a document.
    ///
    /// # Errors
    ///
    /// [`SourceError::Parse`] or [`SourceError::Empty`].
    pub fn decode(self, text: &str, location: &str) -> Result<Mapping> {
        let mapping = match self {
            Self::Text => text::parse(text, location)?,
            Self::Json => codec::decode_json(text, location)?,
            Self::Yaml => codec::decode_yaml(text, location)?,
        };
        if mapping.is_empty() {
            return Err(SourceError::Empty {
                location: location.to_string(),
            }
            .into());
        }
        Ok(mapping)
    }

    /// Renders a tree.
    ///
    /// # Errors
    ///
    /// [`SourceError::Unsupported`] when the text format cannot represent
    /// the tree, or a serialization error.
    pub fn encode(self, node: &Node) -> Result<String> {
        match self {
            Self::Text => text::render(node),
            Self::Json => codec::encode_json(&node.to_mapping()),
            Self::Yaml => codec::encode_yaml(&node.to_mapping()),
        }
    }
}

/// Where a configuration lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local file in the given format
    File(PathBuf, Format),
    /// Key-value store path
    Store(String),
}

impl FromStr for Source {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("kv://") {
            return Ok(Self::Store(store_path(rest)));
        }
        if let Some(rest) = s.strip_prefix("zookeeper://") {
            // Authority (credentials, host, port) is the store's concern.
            let path = rest.find('/').map_or("/", |i| &rest[i..]);
            return Ok(Self::Store(store_path(path)));
        }
        let path = PathBuf::from(s);
        let format = Format::from_path(&path);
        Ok(Self::File(path, format))
    }
}

fn store_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path, _) => write!(f, "{}", path.display()),
            Self::Store(path) => write!(f, "kv://{path}"),
        }
    }
}

impl Source {
    /// Parses an identifier; never fails.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        match identifier.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        }
    }

    /// Returns `true` for store sources.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Loads the source into a detached node named `root`.
    ///
    /// Trees read from files are classified as content nodes. Trees read
    /// from a store keep the types implied by the store layout.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NotFound`] if the file or store path is missing.
    /// - [`SourceError::Empty`] if it holds no configuration.
    /// - [`SourceError::NoStore`] for a store source without a store.
    /// - Parse failures.
    pub fn load(&self, store: Option<&dyn KvStore>) -> Result<Node> {
        match self {
            Self::File(path, format) => {
                let location = path.display().to_string();
                let text = read_file(path)?;
                tracing::info!(source = %location, "reading configuration file");
                let node = Node::from_mapping("root", format.decode(&text, &location)?)?;
                node.set_node_type(crate::tree::NodeType::ContentNode)?;
                Ok(node)
            }
            Self::Store(path) => {
                let store = store.ok_or_else(|| SourceError::NoStore {
                    location: self.to_string(),
                })?;
                let node = store::read_tree(store, path, "root")?.ok_or_else(|| {
                    SourceError::NotFound {
                        location: self.to_string(),
                    }
                })?;
                if node.is_empty() {
                    return Err(SourceError::Empty {
                        location: self.to_string(),
                    }
                    .into());
                }
                Ok(node)
            }
        }
    }

    /// Writes `node` to this source.
    ///
    /// # Errors
    ///
    /// - [`SourceError::AlreadyExists`] if the destination exists and
    ///   `force` is not set.
    /// - Format limitations and I/O failures.
    pub fn save(&self, node: &Node, store: Option<&dyn KvStore>, force: bool) -> Result<()> {
        match self {
            Self::File(path, format) => {
                tracing::info!(destination = %path.display(), "writing configuration file");
                if path.exists() && !force {
                    tracing::error!(destination = %path.display(), "file already exists");
                    return Err(SourceError::AlreadyExists {
                        location: path.display().to_string(),
                    }
                    .into());
                }
                let text = format.encode(node)?;
                std::fs::write(path, text)?;
                tracing::debug!(destination = %path.display(), "saved configuration");
                Ok(())
            }
            Self::Store(path) => {
                let store = store.ok_or_else(|| SourceError::NoStore {
                    location: self.to_string(),
                })?;
                tracing::info!(destination = %self, "saving configuration to store");
                store::write_tree(store, node, path, force)
            }
        }
    }

    /// Deletes the source.
    ///
    /// # Errors
    ///
    /// [`SourceError::NotFound`] for a missing file; I/O or store failures.
    pub fn remove(&self, store: Option<&dyn KvStore>) -> Result<()> {
        match self {
            Self::File(path, _) => {
                if !path.is_file() {
                    return Err(SourceError::NotFound {
                        location: path.display().to_string(),
                    }
                    .into());
                }
                std::fs::remove_file(path)?;
                Ok(())
            }
            Self::Store(path) => {
                let store = store.ok_or_else(|| SourceError::NoStore {
                    location: self.to_string(),
                })?;
                store.delete_recursive(path)
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|_| {
        tracing::error!(source = %path.display(), "file does not exist or is not readable");
        crate::Error::from(SourceError::NotFound {
            location: path.display().to_string(),
        })
    })
}
