//! `[section]` / `key = value` text format.
//!
//! Everything after `#` is a comment. Keys before the first section
//! header belong to the root. Values are kept as strings; `[a, b, c]`
//! becomes a list of strings. The format holds at most two levels, so
//! writing rejects root-level attributes and nested sections.

use std::fmt::Write as _;

use crate::error::{Result, SourceError};
use crate::tree::{Child, Item, Mapping, Node, Value};

/// One meaningful line of a text configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank, comment, or malformed line
    Skip,
    /// `[name]` header
    Section(String),
    /// `key = value` pair
    Pair(String, TextValue),
}

/// Value of a `key = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue {
    /// Plain string
    Scalar(String),
    /// `[a, b, c]` list
    List(Vec<String>),
}

impl From<TextValue> for Value {
    fn from(v: TextValue) -> Self {
        match v {
            TextValue::Scalar(s) => Self::String(s),
            TextValue::List(items) => Self::List(items.into_iter().map(Self::String).collect()),
        }
    }
}

/// Classifies one line.
#[must_use]
pub fn parse_line(line: &str) -> Line {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.len() <= 2 {
        return Line::Skip;
    }
    if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
        let name = inner.trim();
        return if name.is_empty() {
            Line::Skip
        } else {
            Line::Section(name.to_string())
        };
    }
    let Some((key, value)) = line.split_once('=') else {
        return Line::Skip;
    };
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Line::Skip;
    }
    let value = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) if value.len() > 2 => {
            TextValue::List(inner.split(',').map(|s| s.trim().to_string()).collect())
        }
        _ => TextValue::Scalar(value.to_string()),
    };
    Line::Pair(key.to_string(), value)
}

/// Parses a whole document into a mapping.
///
/// A repeated section header starts the section afresh.
///
/// # Errors
///
/// Returns [`SourceError::Empty`] when no section or pair is found.
pub fn parse(text: &str, location: &str) -> Result<Mapping> {
    let mut root = Mapping::new();
    let mut section: Option<String> = None;
    for line in text.lines() {
        match parse_line(line) {
            Line::Skip => {}
            Line::Section(name) => {
                root.insert(name.clone(), Item::Map(Mapping::new()));
                section = Some(name);
            }
            Line::Pair(key, value) => {
                let item = Item::Value(value.into());
                match section.as_ref().and_then(|name| root.get_mut(name)) {
                    Some(Item::Map(map)) => {
                        map.insert(key, item);
                    }
                    _ => {
                        root.insert(key, item);
                    }
                }
            }
        }
    }
    if root.is_empty() {
        return Err(SourceError::Empty {
            location: location.to_string(),
        }
        .into());
    }
    Ok(root)
}

/// Renders a two-level tree.
///
/// # Errors
///
/// Returns [`SourceError::Unsupported`] for attributes directly under the
/// root or nodes below a section.
pub fn render(node: &Node) -> Result<String> {
    let mut out = String::new();
    for child in node.children() {
        let Child::Node(section) = child else {
            tracing::error!("cfg format does not support attributes at root level");
            return Err(unsupported("cfg format does not support attributes at root level"));
        };
        let _ = write!(out, "\n[{}]\n", section.name());
        for entry in section.children() {
            let Child::Attribute(attr) = entry else {
                tracing::error!("cfg format does not support multi-level hierarchy");
                return Err(unsupported("cfg format does not support multi-level hierarchy"));
            };
            let _ = writeln!(out, "{} = {}", attr.name(), attr.value());
        }
    }
    Ok(out)
}

fn unsupported(reason: &str) -> crate::Error {
    SourceError::Unsupported {
        reason: reason.to_string(),
    }
    .into()
}
