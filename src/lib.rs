//! `conftree` - Hierarchical configuration trees with template validation
//!
//! Configuration files and hierarchical key-value stores load into a tree
//! of nodes and attributes. Templates validate the tree, filling in
//! defaults and coercing values on the way, and the tree can be written
//! back in any supported format.
//!
//! ```
//! use conftree::template::{FixedAttribute, FixedNode};
//! use conftree::tree::{Child, Mapping, Node, ValueType};
//!
//! # fn main() -> conftree::Result<()> {
//! let tree = Node::new("root");
//! tree.set("/general", Mapping::new())?;
//! tree.set("/general/port", "8080")?;
//!
//! let general = FixedNode::new("general")
//!     .with(FixedAttribute::new("port").value_type(ValueType::Int))?
//!     .with(FixedAttribute::new("log_level").default_value("INFO"))?;
//! let template = FixedNode::new("root").with(general)?;
//!
//! let tree = template.validate(Some(Child::Node(tree)))?.expect("validated");
//! assert_eq!(tree.get_value("/general/port"), Some(8080.into()));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod observability;
pub mod root;
pub mod source;
pub mod template;
pub mod tree;

pub use error::{Error, Result};
pub use root::{Root, RootOptions};
pub use source::{Format, KvStore, MemoryStore, Source};
pub use template::{FixedAttribute, FixedNode, NodeSet, SchemaDocument, VariableAttribute, VariableNode};
pub use tree::{Attribute, Child, Item, Mapping, Node, NodeType, Value, ValueType};
