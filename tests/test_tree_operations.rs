//! Structural operations on configuration trees: set/get/delete, search,
//! listing, and the independence of projected values.

mod common;

use conftree::error::TreeError;
use conftree::{Attribute, Item, Mapping, Node, Value};

fn t1_tree(b: Item) -> Node {
    let root = common::load_fixture("import.conf");
    let mut n = Mapping::new();
    n.insert("b".into(), b);
    n.insert("n2".into(), Item::Map(Mapping::new()));
    let mut t1 = Mapping::new();
    t1.insert("i".into(), Item::from(2));
    t1.insert("n".into(), Item::Map(n));
    root.set("/t1", t1).unwrap();
    root
}

fn new_section(pairs: &[(&str, &str)]) -> Mapping {
    let section: Mapping = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Item::from(*v)))
        .collect();
    let mut wrapper = Mapping::new();
    wrapper.insert("new_section".into(), Item::Map(section));
    wrapper
}

// ============================================================================
// set / get / delete
// ============================================================================

#[test]
fn set_into_missing_section_fails() {
    let root = common::load_fixture("import.conf");
    let err = root.set("/invalid_section/attribute", "value").unwrap_err();
    assert!(matches!(err, TreeError::NotFound { .. }));
}

#[test]
fn setting_a_section_again_replaces_it() {
    let root = common::load_fixture("import.conf");
    root.set("/", new_section(&[("attr1", "val1"), ("attr2", "val2")]))
        .unwrap();
    root.set("/", new_section(&[("attr3", "val1"), ("attr4", "val2")]))
        .unwrap();
    assert!(root.get("/new_section/attr1").is_none());
    assert_eq!(root.get_value("/new_section/attr3"), Some(Value::from("val1")));
}

#[test]
fn add_node_and_attribute() {
    let root = common::load_fixture("import.conf");
    root.set("/", Node::new("add_node_ok")).unwrap();
    assert!(matches!(root.get("/add_node_ok"), Some(Item::Map(m)) if m.is_empty()));

    root.set("/", Attribute::new("add_attr_ok", true)).unwrap();
    assert_eq!(root.get("/add_attr_ok"), Some(Item::from(true)));
}

#[test]
fn get_returns_plain_mapping() {
    let root = common::load_fixture("import.conf");
    let input = new_section(&[("attr1", "val1"), ("attr2", "val2")]);
    root.set("/", input.clone()).unwrap();
    assert_eq!(root.get("/new_section"), input.get("new_section").cloned());
    assert!(root.get("/general/abc").is_none());
}

#[test]
fn delete_rules() {
    let root = common::load_fixture("import.conf");
    assert_eq!(
        root.delete("/").unwrap_err().to_string(),
        "No path to delete specified"
    );
    assert!(matches!(
        root.delete("/no_such_node/no_such_attribute"),
        Err(TreeError::NotFound { .. })
    ));

    root.set("/", new_section(&[("attr1", "val1"), ("attr2", "val2")]))
        .unwrap();
    root.delete("/new_section/attr1").unwrap();
    assert!(root.get("/new_section/attr1").is_none());
    assert!(root.get("/new_section/attr2").is_some());
    root.delete("/new_section").unwrap();
    assert!(root.get("/new_section").is_none());
}

#[test]
fn projection_is_independent_of_the_tree() {
    let root = t1_tree(Item::from(5));
    let Some(Item::Map(mut projected)) = root.get("/t1") else {
        panic!("expected a mapping at /t1");
    };
    let result1 = root.get_value("/t1/n/b");

    if let Some(Item::Map(n)) = projected.get_mut("n") {
        n.insert("b".into(), Item::from(10));
    }
    let result2 = root.get_value("/t1/n/b");

    let mut replacement = Mapping::new();
    replacement.insert("b".into(), Item::from("abc"));
    projected.insert("n".into(), Item::Map(replacement));
    let result3 = root.get_value("/t1/n/b");

    assert_eq!(result1, Some(Value::Int(5)));
    assert_eq!(result1, result2);
    assert_eq!(result2, result3);
}

// ============================================================================
// search
// ============================================================================

#[test]
fn search_by_attribute_name() {
    let root = t1_tree(Item::from(true));
    assert!(root.search("/", Some("x"), |v| *v == Value::Int(5), 1, false).is_empty());
    assert!(root.search("/", Some("i"), |v| *v == Value::Int(5), 1, false).is_empty());
    assert_eq!(
        root.search("/", Some("i"), |v| *v == Value::Int(2), 1, false),
        ["/t1"]
    );
    assert_eq!(root.search("/", None, |v| *v == Value::Int(2), 1, false), ["/t1"]);
}

#[test]
fn search_with_depth_and_recursion() {
    let root = t1_tree(Item::from(5));
    let five = |v: &Value| *v == Value::Int(5);
    assert_eq!(root.search("/", None, five, 2, false), ["/t1"]);
    assert_eq!(root.search("/", None, five, 1, true), ["/t1/n"]);

    let mut both = root.search("/", None, five, 2, true);
    both.sort();
    assert_eq!(both, ["/t1", "/t1/n"]);
}

// ============================================================================
// listing
// ============================================================================

#[test]
fn list_nodes_and_attributes() {
    let root = t1_tree(Item::from(5));
    assert_eq!(root.list_nodes("/t1", false), ["n"]);
    assert_eq!(root.list_nodes("/t1", true), ["/t1/n"]);
    assert_eq!(root.list_attributes("/t1", false), ["i"]);
    assert_eq!(
        root.list_nodes("/", false),
        [
            "general",
            "target",
            "zookeeper",
            "sources",
            "src1",
            "src2",
            "src1_fields",
            "src2_fields",
            "t1"
        ]
    );
}

#[test]
fn fixture_values_stay_strings() {
    let root = common::load_fixture("import.conf");
    assert_eq!(root.get_value("/general/log_level"), Some(Value::from("debug")));
    assert_eq!(root.get_value("/src2/csv_sep"), Some(Value::from(";")));
    assert_eq!(
        root.get_value("/src1_fields/amount"),
        Some(Value::from(vec!["amount", "float"]))
    );
}
