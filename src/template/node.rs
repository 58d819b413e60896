//! Node templates.
//!
//! Validation normalises the actual node in place: defaults are inserted,
//! values are replaced by their coerced form, and children whose
//! validation yields nothing are removed. Children not mentioned by the
//! template are kept.

use indexmap::IndexMap;

use super::attribute::VariableAttribute;
use super::{Template, Validator};
use crate::error::{Result, TreeError, ValidationError};
use crate::tree::{Child, Mapping, Node, NodeType};

/// Maximum edit distance for "did you mean" hints on unknown keys.
const SUGGESTION_DISTANCE: usize = 2;

// ============================================================================
// Fixed-name node
// ============================================================================

/// Template for a named section with declared children.
#[derive(Debug, Clone)]
pub struct FixedNode {
    name: String,
    optional: bool,
    validator: Option<Validator<Mapping>>,
    description: Option<String>,
    node_type: Option<NodeType>,
    children: IndexMap<String, Template>,
}

impl FixedNode {
    /// Creates an optional node template without children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
            validator: None,
            description: None,
            node_type: None,
            children: IndexMap::new(),
        }
    }

    /// Marks the node as mandatory.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Sets whether the node may be absent.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets the description used in samples.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Type applied to the node after successful validation.
    #[must_use]
    pub const fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Accepts nodes whose plain projection satisfies `f`.
    #[must_use]
    pub fn validator(mut self, f: impl Fn(&Mapping) -> bool + 'static) -> Self {
        self.validator = Some(Validator::predicate(f));
        self
    }

    /// Accepts nodes for which `f` returns `Ok(true)`.
    #[must_use]
    pub fn try_validator(
        mut self,
        f: impl Fn(&Mapping) -> std::result::Result<bool, String> + 'static,
    ) -> Self {
        self.validator = Some(Validator::new(f));
        self
    }

    /// Registers a child template.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateTemplate`] if the name is taken.
    pub fn add(&mut self, template: impl Into<Template>) -> std::result::Result<&mut Self, TreeError> {
        let template = template.into();
        let name = template.name().to_string();
        if self.children.contains_key(&name) {
            return Err(TreeError::DuplicateTemplate {
                name,
                node: self.name.clone(),
            });
        }
        self.children.insert(name, template);
        Ok(self)
    }

    /// Builder form of [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateTemplate`] if the name is taken.
    pub fn with(mut self, template: impl Into<Template>) -> std::result::Result<Self, TreeError> {
        self.add(template)?;
        Ok(self)
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the node may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Description, if any.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Node type hint.
    #[must_use]
    pub const fn node_type_hint(&self) -> Option<NodeType> {
        self.node_type
    }

    /// Child templates in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Template> {
        self.children.values()
    }

    /// Child template by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Template> {
        self.children.get(name)
    }

    /// Validates `actual` against this template.
    ///
    /// Returns the normalised node, or `None` when the node is optional and
    /// ends up absent or empty.
    ///
    /// # Errors
    ///
    /// The first violation found in declaration order.
    pub fn validate(&self, actual: Option<Child>) -> Result<Option<Node>> {
        self.validate_in(actual, None)
    }

    /// Validates a node that may not exist yet; a synthesized node is
    /// linked to `parent` so error paths are complete.
    pub(crate) fn validate_in(&self, actual: Option<Child>, parent: Option<&Node>) -> Result<Option<Node>> {
        let Some(node) = self.prepare(actual, parent)? else {
            return Ok(None);
        };

        for template in self.children.values() {
            match template {
                Template::NodeSet(set) => set.validate_within(&node)?,
                Template::Attribute(attr_t) => {
                    let name = attr_t.name();
                    let actual = match node.child(name) {
                        Some(Child::Attribute(a)) => Some(a),
                        Some(Child::Node(n)) => {
                            return Err(ValidationError::NotAnAttribute { path: n.path() }.into());
                        }
                        None => None,
                    };
                    match attr_t.validate_in(actual, Some(&node))? {
                        Some(attr) => node.add(attr)?,
                        None => {
                            node.remove(name);
                        }
                    }
                }
                Template::Node(node_t) => {
                    let result = node_t.validate_in(node.child(node_t.name()), Some(&node))?;
                    splice(&node, node_t.name(), result)?;
                }
                Template::VariableNode(node_t) => {
                    let result = node_t.validate_in(node.child(node_t.name()), Some(&node))?;
                    splice(&node, node_t.name(), result)?;
                }
            }
        }
        self.warn_unknown(&node);

        if node.is_empty() {
            if !self.optional {
                return Err(ValidationError::MissingMandatoryNode { path: node.path() }.into());
            }
            return Ok(None);
        }
        run_node_validator(self.validator.as_ref(), &node)?;
        apply_node_type(self.node_type, &node)?;
        Ok(Some(node))
    }

    fn prepare(&self, actual: Option<Child>, parent: Option<&Node>) -> Result<Option<Node>> {
        if actual.is_none() && self.optional {
            tracing::debug!(template = %self.name, "optional node is missing");
            return Ok(None);
        }
        if matches!(actual, Some(Child::Attribute(_))) {
            return Err(ValidationError::NotANode {
                name: self.name.clone(),
            }
            .into());
        }
        if self.children.is_empty() {
            return Err(ValidationError::EmptyTemplate {
                name: self.name.clone(),
            }
            .into());
        }
        match actual {
            Some(Child::Node(node)) => Ok(Some(node)),
            _ => {
                tracing::debug!(template = %self.name, "mandatory node is missing, creating it from defaults");
                Ok(Some(synthesize(&self.name, parent)))
            }
        }
    }

    fn known(&self, key: &str) -> bool {
        self.children.values().any(|t| match t {
            Template::NodeSet(set) => set.names().iter().any(|n| n == key),
            other => other.name() == key,
        })
    }

    fn warn_unknown(&self, node: &Node) {
        for key in node.child_names() {
            if self.known(&key) {
                continue;
            }
            let suggestion = self
                .children
                .keys()
                .map(|name| (name, strsim::damerau_levenshtein(&key, name)))
                .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
                .min_by_key(|(_, dist)| *dist);
            if let Some((name, _)) = suggestion {
                tracing::warn!(
                    path = %crate::tree::join_path(&node.path(), &key),
                    "unrecognised key, did you mean '{name}'?"
                );
            }
        }
    }
}

// ============================================================================
// Variable-attribute node
// ============================================================================

/// Template for a named section whose attributes share one template.
#[derive(Debug, Clone)]
pub struct VariableNode {
    name: String,
    optional: bool,
    validator: Option<Validator<Mapping>>,
    description: Option<String>,
    node_type: Option<NodeType>,
    attribute: VariableAttribute,
}

impl VariableNode {
    /// Creates an optional template applying `attribute` to every entry.
    pub fn new(name: impl Into<String>, attribute: VariableAttribute) -> Self {
        Self {
            name: name.into(),
            optional: true,
            validator: None,
            description: None,
            node_type: None,
            attribute,
        }
    }

    /// Marks the node as mandatory.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Sets whether the node may be absent.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets the description used in samples.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Type applied to the node after successful validation.
    #[must_use]
    pub const fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Accepts nodes whose plain projection satisfies `f`.
    #[must_use]
    pub fn validator(mut self, f: impl Fn(&Mapping) -> bool + 'static) -> Self {
        self.validator = Some(Validator::predicate(f));
        self
    }

    /// Accepts nodes for which `f` returns `Ok(true)`.
    #[must_use]
    pub fn try_validator(
        mut self,
        f: impl Fn(&Mapping) -> std::result::Result<bool, String> + 'static,
    ) -> Self {
        self.validator = Some(Validator::new(f));
        self
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the node may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Description, if any.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Template shared by all attributes.
    #[must_use]
    pub const fn attribute(&self) -> &VariableAttribute {
        &self.attribute
    }

    /// Validates `actual` against this template.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyNode`] for a mandatory node without
    ///   attributes.
    /// - [`ValidationError::NotAnAttribute`] if the node contains a node.
    /// - Any attribute failure.
    pub fn validate(&self, actual: Option<Child>) -> Result<Option<Node>> {
        self.validate_in(actual, None)
    }

    pub(crate) fn validate_in(&self, actual: Option<Child>, parent: Option<&Node>) -> Result<Option<Node>> {
        let node = match actual {
            None if self.optional => {
                tracing::debug!(template = %self.name, "optional node is missing");
                return Ok(None);
            }
            None => synthesize(&self.name, parent),
            Some(Child::Attribute(_)) => {
                return Err(ValidationError::NotANode {
                    name: self.name.clone(),
                }
                .into());
            }
            Some(Child::Node(node)) => node,
        };
        if node.is_empty() && !self.optional {
            return Err(ValidationError::EmptyNode { path: node.path() }.into());
        }

        for child in node.children() {
            match child {
                Child::Attribute(attr) => {
                    let name = attr.name().to_string();
                    match self.attribute.validate(attr)? {
                        Some(attr) => node.add(attr)?,
                        None => {
                            node.remove(&name);
                        }
                    }
                }
                Child::Node(n) => {
                    return Err(ValidationError::NotAnAttribute { path: n.path() }.into());
                }
            }
        }

        if node.is_empty() {
            if !self.optional {
                return Err(ValidationError::EmptyNode { path: node.path() }.into());
            }
            return Ok(None);
        }
        run_node_validator(self.validator.as_ref(), &node)?;
        apply_node_type(self.node_type, &node)?;
        Ok(Some(node))
    }
}

// ============================================================================
// Node template
// ============================================================================

/// A fixed or variable node template, used as a node set element.
#[derive(Debug, Clone)]
pub enum NodeTemplate {
    /// Fixed-name node template
    Fixed(FixedNode),
    /// Variable-attribute node template
    Variable(VariableNode),
}

impl NodeTemplate {
    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Fixed(t) => t.name(),
            Self::Variable(t) => t.name(),
        }
    }

    /// Whether the node may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        match self {
            Self::Fixed(t) => t.is_optional(),
            Self::Variable(t) => t.is_optional(),
        }
    }

    /// Description, if any.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        match self {
            Self::Fixed(t) => t.description_text(),
            Self::Variable(t) => t.description_text(),
        }
    }

    /// Validates `actual` against the wrapped template.
    ///
    /// # Errors
    ///
    /// As the wrapped template.
    pub fn validate(&self, actual: Option<Child>) -> Result<Option<Node>> {
        self.validate_in(actual, None)
    }

    pub(crate) fn validate_in(&self, actual: Option<Child>, parent: Option<&Node>) -> Result<Option<Node>> {
        match self {
            Self::Fixed(t) => t.validate_in(actual, parent),
            Self::Variable(t) => t.validate_in(actual, parent),
        }
    }
}

impl From<FixedNode> for NodeTemplate {
    fn from(t: FixedNode) -> Self {
        Self::Fixed(t)
    }
}

impl From<VariableNode> for NodeTemplate {
    fn from(t: VariableNode) -> Self {
        Self::Variable(t)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Empty detached node named `name`, anchored below `parent` for paths.
fn synthesize(name: &str, parent: Option<&Node>) -> Node {
    let node = Node::new(name);
    if let Some(parent) = parent {
        node.anchor_below(parent);
    }
    node
}

/// Puts a validated child back, or drops it when validation emptied it.
pub(crate) fn splice(parent: &Node, name: &str, result: Option<Node>) -> Result<()> {
    match result {
        Some(child) => parent.add(child)?,
        None => {
            if matches!(parent.child(name), Some(Child::Node(_))) {
                parent.remove(name);
            }
        }
    }
    Ok(())
}

fn run_node_validator(validator: Option<&Validator<Mapping>>, node: &Node) -> Result<()> {
    let Some(validator) = validator else {
        return Ok(());
    };
    if let Err(detail) = validator.check(&node.to_mapping()) {
        let err = ValidationError::NodeFailed {
            path: node.path(),
            detail,
        };
        tracing::error!("{err}");
        return Err(err.into());
    }
    Ok(())
}

fn apply_node_type(hint: Option<NodeType>, node: &Node) -> Result<()> {
    if let Some(node_type) = hint
        && node_type != node.node_type()
    {
        node.set_node_type(node_type)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FixedAttribute;
    use crate::tree::{Item, Value, ValueType};

    fn root_with(section: &str, entries: &[(&str, Item)]) -> Node {
        let root = Node::new("root");
        let map: Mapping = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        root.set(&format!("/{section}"), map).unwrap();
        root
    }

    #[test]
    fn empty_template_always_fails() {
        let t = FixedNode::new("some_node").mandatory();
        let err = t.validate(None).unwrap_err();
        assert_eq!(err.to_string(), "Template for node some_node has no attributes");
        let err = t.validate(Some(Child::Node(Node::new("some_node")))).unwrap_err();
        assert_eq!(err.to_string(), "Template for node some_node has no attributes");
    }

    #[test]
    fn duplicate_child_template() {
        let mut t = FixedNode::new("some_node");
        t.add(FixedAttribute::new("attr1")).unwrap();
        let err = t.add(FixedAttribute::new("attr1")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute or node attr1 can only be added to node some_node once"
        );
    }

    #[test]
    fn attribute_where_node_expected() {
        let t = FixedNode::new("general").with(FixedAttribute::new("a")).unwrap();
        let err = t
            .validate(Some(Child::Attribute(crate::tree::Attribute::new("general", 1))))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration object passed for validation to template general is not a node"
        );
    }

    #[test]
    fn node_where_attribute_expected() {
        let root = root_with("general", &[("a", Item::Map(Mapping::new()))]);
        let t = FixedNode::new("general").with(FixedAttribute::new("a")).unwrap();
        let err = t.validate(root.get_obj("general")).unwrap_err();
        assert_eq!(err.to_string(), "Expecting /general/a to be an attribute, found a node");
    }

    #[test]
    fn missing_mandatory_node_without_defaults() {
        let root = Node::new("root");
        let t = FixedNode::new("x")
            .mandatory()
            .with(FixedAttribute::new("a"))
            .unwrap();
        let err = t.validate_in(None, Some(&root)).unwrap_err();
        assert_eq!(err.to_string(), "Mandatory node /x is missing, with no defaults set");
    }

    #[test]
    fn mandatory_node_filled_from_defaults() {
        let root = Node::new("root");
        let t = FixedNode::new("x")
            .mandatory()
            .with(FixedAttribute::new("a").value_type(ValueType::Int).default_value(3))
            .unwrap();
        let node = t.validate_in(None, Some(&root)).unwrap().unwrap();
        assert_eq!(node.get_value("a"), Some(Value::Int(3)));
        assert_eq!(node.path(), "/x");
        assert!(node.parent().is_none());
        assert!(!root.contains("x"));
    }

    #[test]
    fn filled_node_joins_abstract_parent_as_content_node() {
        let root = Node::new("root");
        root.set("/a", Mapping::new()).unwrap();
        root.set("/a/k", 1).unwrap();
        root.set_node_type(NodeType::AbstractNode).unwrap();
        assert_eq!(root.node("a").unwrap().node_type(), NodeType::ContentNode);

        let t = FixedNode::new("root")
            .mandatory()
            .with(FixedNode::new("a").with(FixedAttribute::new("k")).unwrap())
            .unwrap()
            .with(
                FixedNode::new("b")
                    .mandatory()
                    .with(FixedAttribute::new("x").default_value("on"))
                    .unwrap(),
            )
            .unwrap();
        let tree = t.validate(Some(Child::Node(root))).unwrap().unwrap();
        assert_eq!(tree.node_type(), NodeType::AbstractNode);
        assert_eq!(tree.node("a").unwrap().node_type(), NodeType::ContentNode);
        assert_eq!(tree.node("b").unwrap().node_type(), NodeType::ContentNode);
        assert_eq!(tree.get_value("/b/x"), Some(Value::from("on")));
        assert_eq!(tree.node("b").unwrap().path(), "/b");
    }

    #[test]
    fn filled_node_reports_full_path() {
        let root = Node::new("root");
        let t = FixedNode::new("root")
            .mandatory()
            .with(
                FixedNode::new("b")
                    .mandatory()
                    .with(FixedAttribute::new("y").default_value(1))
                    .unwrap()
                    .with(FixedAttribute::new("x").mandatory())
                    .unwrap(),
            )
            .unwrap();
        let err = t.validate(Some(Child::Node(root))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mandatory parameter /b/x has not been set, and has no default value"
        );
    }

    #[test]
    fn optional_node_with_mandatory_attribute_may_be_absent() {
        let t = FixedNode::new("opt_node")
            .with(FixedAttribute::new("mand_attr").mandatory())
            .unwrap();
        assert!(t.validate(None).unwrap().is_none());
    }

    #[test]
    fn node_validator_sees_normalised_values() {
        let root = root_with("general", &[("port", Item::from("8080"))]);
        let t = FixedNode::new("general")
            .with(FixedAttribute::new("port").value_type(ValueType::Int))
            .unwrap()
            .with(FixedAttribute::new("host").default_value("localhost"))
            .unwrap()
            .validator(|m| {
                m.get("port").and_then(Item::as_value) == Some(&Value::Int(8080))
                    && m.contains_key("host")
            });
        let node = t.validate(root.get_obj("general")).unwrap().unwrap();
        assert_eq!(node.get_value("host"), Some(Value::from("localhost")));
    }

    #[test]
    fn node_validator_failure() {
        let root = root_with("general", &[("a", Item::from("x"))]);
        let t = FixedNode::new("general")
            .with(FixedAttribute::new("a"))
            .unwrap()
            .try_validator(|_| Err("inconsistent".into()));
        let err = t.validate(root.get_obj("general")).unwrap_err();
        assert_eq!(err.to_string(), "Node /general failed validation: inconsistent");
    }

    #[test]
    fn unknown_children_are_kept() {
        let root = root_with("general", &[("a", Item::from("x")), ("extra", Item::from(1))]);
        let t = FixedNode::new("general").with(FixedAttribute::new("a")).unwrap();
        let node = t.validate(root.get_obj("general")).unwrap().unwrap();
        assert_eq!(node.get_value("extra"), Some(Value::Int(1)));
    }

    #[test]
    fn node_type_hint_applied() {
        let root = root_with("general", &[("a", Item::from("x"))]);
        root.set_node_type(NodeType::AbstractNode).unwrap();
        let t = FixedNode::new("general")
            .node_type(NodeType::ContentNode)
            .with(FixedAttribute::new("a"))
            .unwrap();
        let node = t.validate(root.get_obj("general")).unwrap().unwrap();
        assert_eq!(node.node_type(), NodeType::ContentNode);
    }

    #[test]
    fn variable_node_validates_every_attribute() {
        let root = root_with("sources", &[("a", Item::from("yes")), ("b", Item::from("no"))]);
        let t = VariableNode::new(
            "sources",
            VariableAttribute::new().value_type(ValueType::Bool),
        );
        let node = t.validate(root.get_obj("sources")).unwrap().unwrap();
        assert_eq!(node.get_value("a"), Some(Value::Bool(true)));
        assert_eq!(node.get_value("b"), Some(Value::Bool(false)));
    }

    #[test]
    fn variable_node_validator_failure() {
        let root = root_with("varnode", &[("a", Item::from("x"))]);
        let t = VariableNode::new(
            "varnode",
            VariableAttribute::new().validator(|v| v.as_str() == Some("y")),
        );
        let err = t.validate(root.get_obj("varnode")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter /varnode/a failed validation for value x"
        );
    }

    #[test]
    fn mandatory_variable_node_cannot_be_empty() {
        let root = root_with("varnode", &[]);
        let t = VariableNode::new("varnode", VariableAttribute::new()).mandatory();
        let err = t.validate(root.get_obj("varnode")).unwrap_err();
        assert_eq!(err.to_string(), "Node /varnode cannot be empty");
    }

    #[test]
    fn mandatory_variable_node_emptied_by_nulls() {
        let root = root_with("varnode", &[("a", Item::Value(Value::Null))]);
        let t = VariableNode::new("varnode", VariableAttribute::new()).mandatory();
        let err = t.validate(root.get_obj("varnode")).unwrap_err();
        assert_eq!(err.to_string(), "Node /varnode cannot be empty");

        let optional = VariableNode::new("varnode", VariableAttribute::new());
        assert!(optional.validate(root.get_obj("varnode")).unwrap().is_none());
    }
}
