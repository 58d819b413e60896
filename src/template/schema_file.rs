//! Declarative schema documents.
//!
//! A YAML document describing a template tree, so a configuration can be
//! validated without compiled schema code. Node set names may be taken
//! from the loaded tree (`names_from`), which makes a document a schema
//! generator rather than a fixed template.
//!
//! ```yaml
//! name: root
//! optional: false
//! children:
//!   - node: general
//!     optional: false
//!     children:
//!       - attribute: log_level
//!         default: INFO
//!         one_of: [DEBUG, INFO, WARNING, ERROR, CRITICAL]
//!         case_insensitive: true
//!   - variable_node: sources
//!     values: { one_of: [YES, NO], case_insensitive: true }
//!   - node_set: source_spec
//!     names_from: /sources
//!     element:
//!       node: source_spec
//!       children:
//!         - attribute: method
//!           optional: false
//! ```

use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use super::validators::{one_of, range};
use super::{FixedAttribute, FixedNode, NodeSet, NodeTemplate, SchemaGenerator, Validator, VariableAttribute, VariableNode};
use crate::error::{Result, SourceError, TreeError};
use crate::tree::{Item, Node, NodeType, Value, ValueType};

// ============================================================================
// Document
// ============================================================================

/// Parsed schema document; the top level describes the root node.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Root template name, `root` unless overridden
    #[serde(default = "default_root_name")]
    pub name: String,

    /// Whether the root may be absent
    #[serde(default)]
    pub optional: bool,

    /// Node type applied to the root after validation
    #[serde(default)]
    pub node_type: Option<NodeType>,

    /// Root description used in samples
    #[serde(default)]
    pub description: Option<String>,

    /// Child declarations in validation order
    #[serde(default)]
    pub children: Vec<Declaration>,
}

fn default_root_name() -> String {
    "root".to_string()
}

/// One child entry. Exactly one of `attribute`, `node`, `variable_node`
/// or `node_set` names the entry and selects its kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    /// Fixed attribute name
    #[serde(default)]
    pub attribute: Option<String>,
    /// Fixed node name
    #[serde(default)]
    pub node: Option<String>,
    /// Variable node name
    #[serde(default)]
    pub variable_node: Option<String>,
    /// Node set name
    #[serde(default)]
    pub node_set: Option<String>,

    /// Whether the element may be absent (defaults to `true`)
    #[serde(default)]
    pub optional: Option<bool>,
    /// Description used in samples
    #[serde(default)]
    pub description: Option<String>,
    /// Node type hint for nodes
    #[serde(default)]
    pub node_type: Option<NodeType>,

    /// Declared value type of an attribute
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    /// Allowed attribute values
    #[serde(default)]
    pub one_of: Option<Vec<String>>,
    /// Compare `one_of` ignoring ASCII case
    #[serde(default)]
    pub case_insensitive: bool,
    /// Inclusive numeric lower bound
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive numeric upper bound
    #[serde(default)]
    pub max: Option<f64>,
    /// Attribute default
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,

    /// Children of a fixed node
    #[serde(default)]
    pub children: Vec<Declaration>,
    /// Shared attribute settings of a variable node
    #[serde(default)]
    pub values: Option<ValueDeclaration>,

    /// Literal node set names
    #[serde(default)]
    pub names: Vec<String>,
    /// Path in the loaded tree whose child names join the node set
    #[serde(default)]
    pub names_from: Option<String>,
    /// Suffix appended to every name taken from `names_from`
    #[serde(default)]
    pub names_suffix: Option<String>,
    /// Node set element
    #[serde(default)]
    pub element: Option<Box<Declaration>>,
}

/// Type and validator settings of a variable node's attributes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueDeclaration {
    /// Declared value type
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    /// Allowed values
    #[serde(default)]
    pub one_of: Option<Vec<String>>,
    /// Compare `one_of` ignoring ASCII case
    #[serde(default)]
    pub case_insensitive: bool,
    /// Inclusive numeric lower bound
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive numeric upper bound
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueDeclaration {
    fn validator(&self) -> Option<Validator<Value>> {
        let choice = self
            .one_of
            .clone()
            .map(|options| one_of(options, self.case_insensitive));
        let bounds = (self.min.is_some() || self.max.is_some()).then(|| range(self.min, self.max));
        match (choice, bounds) {
            (Some(choice), Some(bounds)) => Some(Validator::new(move |v: &Value| {
                if choice.check(v).is_err() {
                    return Ok(false);
                }
                match bounds.check(v) {
                    Ok(()) => Ok(true),
                    Err(detail) => detail.map_or(Ok(false), Err),
                }
            })),
            (choice, bounds) => choice.or(bounds),
        }
    }
}

enum Kind<'a> {
    Attribute(&'a str),
    Node(&'a str),
    VariableNode(&'a str),
    NodeSet(&'a str),
}

impl SchemaDocument {
    /// Parses a YAML schema document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Yaml`] for malformed YAML or unknown fields.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads and parses a YAML schema file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] if the file cannot be read, or a
    /// YAML error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|_| SourceError::NotFound {
            location: path.display().to_string(),
        })?;
        tracing::debug!(schema = %path.display(), "loaded schema document");
        Self::from_yaml_str(&text)
    }

    /// Builds the root template, resolving `names_from` against `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidArgument`] for a malformed declaration,
    /// [`TreeError::DuplicateTemplate`] for repeated names, or
    /// [`TreeError::EmptyNodeSet`] for a node set without literal names.
    pub fn generate(&self, tree: &Node) -> Result<FixedNode> {
        let mut root = FixedNode::new(self.name.clone()).optional(self.optional);
        if let Some(node_type) = self.node_type {
            root = root.node_type(node_type);
        }
        if let Some(description) = &self.description {
            root = root.description(description.clone());
        }
        for decl in &self.children {
            build_child(&mut root, decl, tree)?;
        }
        Ok(root)
    }

    /// Turns the document into a generator for [`crate::Root`].
    #[must_use]
    pub fn into_generator(self) -> SchemaGenerator {
        Rc::new(move |tree: &Node| self.generate(tree))
    }
}

// ============================================================================
// Building
// ============================================================================

fn build_child(parent: &mut FixedNode, decl: &Declaration, tree: &Node) -> Result<()> {
    match decl.kind()? {
        Kind::Attribute(name) => {
            parent.add(build_attribute(name, decl)?)?;
        }
        Kind::Node(name) => {
            parent.add(build_fixed(name, decl, tree)?)?;
        }
        Kind::VariableNode(name) => {
            parent.add(build_variable(name, decl))?;
        }
        Kind::NodeSet(name) => {
            let Some(element) = &decl.element else {
                return Err(invalid(format!("node set {name} has no element")).into());
            };
            let element: NodeTemplate = match element.kind()? {
                Kind::Node(n) => build_fixed(n, element, tree)?.into(),
                Kind::VariableNode(n) => build_variable(n, element).into(),
                _ => return Err(invalid(format!("node set {name} element must be a node")).into()),
            };

            let mut names = decl.names.clone();
            if let Some(path) = &decl.names_from {
                let suffix = decl.names_suffix.as_deref().unwrap_or_default();
                let found = tree.node(path).map(|n| n.child_names()).unwrap_or_default();
                for found in found {
                    let name = format!("{found}{suffix}");
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                if names.is_empty() {
                    tracing::debug!(node_set = %name, names_from = %path, "no names found, skipping node set");
                    return Ok(());
                }
            }
            parent.add(NodeSet::new(name, element, names)?)?;
        }
    }
    Ok(())
}

fn build_attribute(name: &str, decl: &Declaration) -> Result<FixedAttribute> {
    let value = decl.value_declaration();
    let mut attr = FixedAttribute::new(name)
        .optional(decl.optional.unwrap_or(true))
        .value_type(value.value_type.unwrap_or_default());
    if let Some(default) = &decl.default {
        match Item::from_yaml(default) {
            Item::Value(v) => attr = attr.default_value(v),
            Item::Map(_) => return Err(invalid(format!("default of {name} must be a scalar or list")).into()),
        }
    }
    if let Some(description) = &decl.description {
        attr = attr.description(description.clone());
    }
    if let Some(validator) = value.validator() {
        attr = attr.with_validator(validator);
    }
    Ok(attr)
}

fn build_fixed(name: &str, decl: &Declaration, tree: &Node) -> Result<FixedNode> {
    let mut node = FixedNode::new(name).optional(decl.optional.unwrap_or(true));
    if let Some(node_type) = decl.node_type {
        node = node.node_type(node_type);
    }
    if let Some(description) = &decl.description {
        node = node.description(description.clone());
    }
    for child in &decl.children {
        build_child(&mut node, child, tree)?;
    }
    Ok(node)
}

fn build_variable(name: &str, decl: &Declaration) -> VariableNode {
    let values = decl.values.clone().unwrap_or_default();
    let mut attr = VariableAttribute::new().value_type(values.value_type.unwrap_or_default());
    if let Some(validator) = values.validator() {
        attr = attr.with_validator(validator);
    }
    let mut node = VariableNode::new(name, attr).optional(decl.optional.unwrap_or(true));
    if let Some(node_type) = decl.node_type {
        node = node.node_type(node_type);
    }
    if let Some(description) = &decl.description {
        node = node.description(description.clone());
    }
    node
}

impl Declaration {
    fn value_declaration(&self) -> ValueDeclaration {
        ValueDeclaration {
            value_type: self.value_type,
            one_of: self.one_of.clone(),
            case_insensitive: self.case_insensitive,
            min: self.min,
            max: self.max,
        }
    }

    fn kind(&self) -> std::result::Result<Kind<'_>, TreeError> {
        let kinds = [
            self.attribute.as_deref().map(Kind::Attribute),
            self.node.as_deref().map(Kind::Node),
            self.variable_node.as_deref().map(Kind::VariableNode),
            self.node_set.as_deref().map(Kind::NodeSet),
        ];
        let mut found = kinds.into_iter().flatten();
        match (found.next(), found.next()) {
            (Some(kind), None) => Ok(kind),
            (None, _) => Err(invalid(
                "declaration needs one of attribute, node, variable_node or node_set".to_string(),
            )),
            (Some(_), Some(_)) => Err(invalid(
                "declaration has more than one of attribute, node, variable_node or node_set"
                    .to_string(),
            )),
        }
    }
}

const fn invalid(message: String) -> TreeError {
    TreeError::InvalidArgument { message }
}
