//! Sample configuration generation from templates.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::{AttributeSpec, FixedNode, NodeTemplate, Template};
use crate::error::{Result, SourceError};
use crate::tree::value_to_json;

/// Placeholder key for the attributes of a variable node.
const VARIABLE_KEY: &str = "<attribute>";

/// Output format for [`FixedNode::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Pretty-printed JSON object
    #[default]
    Json,
    /// Commented-out `[section]` / `key = value` text
    Text,
}

impl FixedNode {
    /// Renders a sample configuration with every default filled in.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unsupported`] for a text sample of a
    /// template with sections nested below sections.
    pub fn sample(&self, format: SampleFormat) -> Result<String> {
        match format {
            SampleFormat::Json => {
                let mut text = serde_json::to_string_pretty(&json_object(self))?;
                text.push('\n');
                Ok(text)
            }
            SampleFormat::Text => {
                let mut out = String::new();
                if self.name() == "root" {
                    for child in self.children() {
                        text_top_level(&mut out, child)?;
                    }
                } else {
                    text_section(&mut out, self.name(), self.description_text(), self.children())?;
                }
                Ok(out)
            }
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

fn json_object(node: &FixedNode) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for child in node.children() {
        match child {
            Template::Attribute(t) => {
                object.insert(t.name().to_string(), json_default(t.spec()));
            }
            Template::Node(t) => {
                object.insert(t.name().to_string(), json_object(t));
            }
            Template::VariableNode(t) => {
                object.insert(t.name().to_string(), json_variable(t.attribute().spec()));
            }
            Template::NodeSet(set) => {
                for name in set.names() {
                    let element = match set.element() {
                        NodeTemplate::Fixed(t) => json_object(t),
                        NodeTemplate::Variable(t) => json_variable(t.attribute().spec()),
                    };
                    object.insert(name.clone(), element);
                }
            }
        }
    }
    serde_json::Value::Object(object)
}

fn json_variable(spec: &AttributeSpec) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert(VARIABLE_KEY.to_string(), json_default(spec));
    serde_json::Value::Object(object)
}

fn json_default(spec: &AttributeSpec) -> serde_json::Value {
    if spec.default.is_null() {
        serde_json::Value::String(String::new())
    } else {
        value_to_json(&spec.default)
    }
}

// ============================================================================
// Text
// ============================================================================

fn text_top_level(out: &mut String, child: &Template) -> Result<()> {
    match child {
        Template::Attribute(t) => text_attribute(out, t.name(), t.spec()),
        Template::Node(t) => text_section(out, t.name(), t.description_text(), t.children())?,
        Template::VariableNode(t) => {
            text_header(out, t.name(), t.description_text());
            text_attribute(out, VARIABLE_KEY, t.attribute().spec());
        }
        Template::NodeSet(set) => {
            for name in set.names() {
                match set.element() {
                    NodeTemplate::Fixed(t) => text_section(out, name, t.description_text(), t.children())?,
                    NodeTemplate::Variable(t) => {
                        text_header(out, name, t.description_text());
                        text_attribute(out, VARIABLE_KEY, t.attribute().spec());
                    }
                }
            }
        }
    }
    Ok(())
}

fn text_section<'a>(
    out: &mut String,
    name: &str,
    description: Option<&str>,
    children: impl Iterator<Item = &'a Template>,
) -> Result<()> {
    text_header(out, name, description);
    for child in children {
        let Template::Attribute(t) = child else {
            return Err(SourceError::Unsupported {
                reason: "Text format configuration files are not supported for multi-level node hierarchy"
                    .into(),
            }
            .into());
        };
        text_attribute(out, t.name(), t.spec());
    }
    Ok(())
}

fn text_header(out: &mut String, name: &str, description: Option<&str>) {
    let _ = write!(out, "# {}\n# [{name}]\n", description.unwrap_or_default());
}

fn text_attribute(out: &mut String, name: &str, spec: &AttributeSpec) {
    let default = if spec.default.is_null() {
        String::new()
    } else {
        spec.default.to_string()
    };
    let _ = write!(
        out,
        "#\n# {}\n# {name} = {default}\n",
        spec.description.as_deref().unwrap_or_default()
    );
}
