//! Configuration tree: nodes, attributes and leaf values.
//!
//! A tree is built from a raw [`Mapping`] (usually produced by a loader),
//! mutated with `add`/`set`/`delete`, and projected back to a mapping with
//! [`Node::get`] or [`Node::to_mapping`]. Node types are kept consistent on
//! every mutation; see [`NodeType`].

pub mod attribute;
pub mod node;
pub mod node_type;
pub mod value;

pub use attribute::Attribute;
pub use node::{Child, Content, Node, WeakNode, join_path, split_path};
pub use node_type::{NodeType, Propagation};
pub use value::{Item, Mapping, Value, ValueType, mapping_to_json, value_to_json};
