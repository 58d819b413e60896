//! JSON and YAML encoding of raw mappings.
//!
//! Decoding turns date-like strings into dates. Numeric strings stay
//! strings. Encoding writes dates as ISO-8601.

use serde::Serialize;

use crate::error::{Result, SourceError};
use crate::tree::{Item, Mapping, mapping_to_json};

/// Decodes a JSON document whose top level is an object.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] with the failing line for malformed
/// JSON or a non-object document.
pub fn decode_json(text: &str, location: &str) -> Result<Mapping> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|e| SourceError::Parse {
        location: location.to_string(),
        line: Some(e.line()),
        message: e.to_string(),
    })?;
    into_mapping(Item::from_json(&json, true), location)
}

/// Decodes a YAML document whose top level is a mapping.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] for malformed YAML or a non-mapping
/// document.
pub fn decode_yaml(text: &str, location: &str) -> Result<Mapping> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| SourceError::Parse {
        location: location.to_string(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })?;
    into_mapping(Item::from_yaml(&yaml), location)
}

fn into_mapping(item: Item, location: &str) -> Result<Mapping> {
    match item {
        Item::Map(map) => Ok(map),
        Item::Value(_) => Err(SourceError::Parse {
            location: location.to_string(),
            line: None,
            message: "top-level value must be a mapping".to_string(),
        }
        .into()),
    }
}

/// Pretty-prints a mapping as JSON with four-space indentation.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if serialization fails.
pub fn encode_json(mapping: &Mapping) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    mapping_to_json(mapping).serialize(&mut serializer)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Compact single-line JSON, as stored in key-value blobs.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if serialization fails.
pub fn encode_json_compact(mapping: &Mapping) -> Result<String> {
    Ok(serde_json::to_string(&mapping_to_json(mapping))?)
}

/// Renders a mapping as YAML.
///
/// # Errors
///
/// Returns [`crate::Error::Yaml`] if serialization fails.
pub fn encode_yaml(mapping: &Mapping) -> Result<String> {
    Ok(serde_yaml::to_string(&Item::Map(mapping.clone()))?)
}
