//! Node set templates: same-shaped sibling sections with known names.

use super::node::{NodeTemplate, splice};
use crate::error::{Result, TreeError};
use crate::tree::Node;

/// Declares one section per name, all validated by the same element
/// template.
///
/// The names are usually discovered from the loaded tree by a schema
/// generator, e.g. one section per configured data source.
#[derive(Debug, Clone)]
pub struct NodeSet {
    name: String,
    element: NodeTemplate,
    names: Vec<String>,
}

impl NodeSet {
    /// Creates a node set.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyNodeSet`] when `names` is empty.
    pub fn new<I, S>(
        name: impl Into<String>,
        element: impl Into<NodeTemplate>,
        names: I,
    ) -> std::result::Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(TreeError::EmptyNodeSet);
        }
        Ok(Self {
            name: name.into(),
            element: element.into(),
            names,
        })
    }

    /// Registration name inside the parent template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared element template.
    #[must_use]
    pub const fn element(&self) -> &NodeTemplate {
        &self.element
    }

    /// Expected section names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Validates every named section of `parent` in place.
    ///
    /// # Errors
    ///
    /// The first element validation failure.
    pub fn validate(&self, parent: &Node) -> Result<()> {
        self.validate_within(parent)
    }

    pub(crate) fn validate_within(&self, parent: &Node) -> Result<()> {
        tracing::debug!(node_set = %self.name, "validating node set");
        for name in &self.names {
            if !parent.contains(name) {
                if self.element.is_optional() {
                    tracing::debug!(name = %name, parent = %parent.path(), "optional node is missing");
                    continue;
                }
                tracing::warn!(name = %name, parent = %parent.path(), "mandatory node is missing");
                parent.add(Node::new(name.as_str()))?;
            }
            let result = self.element.validate_in(parent.child(name), Some(parent))?;
            splice(parent, name, result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FixedAttribute, FixedNode};
    use crate::tree::{Item, Mapping, Value};

    fn element() -> FixedNode {
        FixedNode::new("element")
            .mandatory()
            .with(FixedAttribute::new("method").mandatory().default_value("GET"))
            .unwrap()
    }

    #[test]
    fn empty_name_list_is_rejected() {
        let err = NodeSet::new("sources", element(), Vec::<String>::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Node Set template can only be initialized with a non-empty list of node names"
        );
    }

    #[test]
    fn missing_mandatory_member_filled_from_defaults() {
        let root = Node::new("root");
        let mut a = Mapping::new();
        a.insert("method".into(), Item::from("POST"));
        root.set("/a", a).unwrap();

        let set = NodeSet::new("sources", element(), ["a", "b"]).unwrap();
        set.validate(&root).unwrap();
        assert_eq!(root.get_value("/a/method"), Some(Value::from("POST")));
        assert_eq!(root.get_value("/b/method"), Some(Value::from("GET")));
    }

    #[test]
    fn optional_member_is_skipped() {
        let root = Node::new("root");
        let element = FixedNode::new("element")
            .with(FixedAttribute::new("method").default_value("GET"))
            .unwrap();
        let set = NodeSet::new("sources", element, ["a"]).unwrap();
        set.validate(&root).unwrap();
        assert!(root.is_empty());
    }

    #[test]
    fn missing_mandatory_attribute_without_default() {
        let root = Node::new("root");
        let element = FixedNode::new("element")
            .mandatory()
            .with(
                FixedAttribute::new("method")
                    .mandatory()
                    .validator(|v| !v.is_null()),
            )
            .unwrap();
        let set = NodeSet::new("sources", element, ["test_missing_method"]).unwrap();
        let err = set.validate(&root).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter /test_missing_method/method failed validation for value null"
        );
    }
}
