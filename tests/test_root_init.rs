//! Root initialization, refresh and watch behaviour.

mod common;

use std::rc::Rc;

use conftree::source::store::write_tree;
use conftree::template::validators::one_of;
use conftree::template::SchemaGenerator;
use conftree::{
    FixedAttribute, FixedNode, KvStore, Mapping, MemoryStore, Node, NodeType, Root, RootOptions,
    Source, Value,
};

use common::{fixture_source, write_file};

fn log_level_schema() -> SchemaGenerator {
    Rc::new(|_tree: &Node| -> conftree::Result<FixedNode> {
        let general = FixedNode::new("general").mandatory().with(
            FixedAttribute::new("log_level")
                .default_value("INFO")
                .with_validator(one_of(["DEBUG", "INFO", "WARNING", "ERROR"], false)),
        )?;
        Ok(FixedNode::new("root").mandatory().with(general)?)
    })
}

// ============================================================================
// Candidate resolution
// ============================================================================

#[test]
fn explicit_source_is_loaded() {
    let root = Root::init(RootOptions::new().source(fixture_source("import.conf"))).unwrap();
    assert_eq!(
        root.source(),
        Some(&Source::parse(&fixture_source("import.conf")))
    );
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("debug"))
    );
}

#[test]
fn first_loadable_default_wins() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write_file(dir.path(), "empty.conf", "");
    let good = write_file(dir.path(), "good.json", r#"{"general": {"log_level": "ERROR"}}"#);
    let later = write_file(dir.path(), "later.json", r#"{"general": {"log_level": "DEBUG"}}"#);

    let root = Root::init(RootOptions::new().default_sources([
        "does_not_exist.conf".to_string(),
        empty,
        good.clone(),
        later,
    ]))
    .unwrap();
    assert_eq!(root.source(), Some(&Source::parse(&good)));
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("ERROR"))
    );
}

#[test]
fn unset_environment_variable_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "good.json", r#"{"general": {"log_level": "ERROR"}}"#);

    let root = Root::init(
        RootOptions::new()
            .env_var("CONFTREE_TEST_VARIABLE_THAT_IS_NEVER_SET")
            .default_source(good.clone()),
    )
    .unwrap();
    assert_eq!(root.source(), Some(&Source::parse(&good)));
}

#[test]
fn no_loadable_candidate_lists_every_source() {
    let err = Root::init(
        RootOptions::new().default_sources(["missing_a.conf", "missing_b.json"]),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not read configuration from any of the specified sources: \
         missing_a.conf, missing_b.json"
    );
}

#[test]
fn explicit_failure_is_fatal_even_with_defaults() {
    let err = Root::init(
        RootOptions::new()
            .source("missing.conf")
            .default_source(fixture_source("import.conf")),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "File missing.conf does not exist or is not readable"
    );
}

#[test]
fn explicit_file_without_sections_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.conf", "abc");
    let err = Root::init(RootOptions::new().source(path.clone())).unwrap_err();
    assert_eq!(err.to_string(), format!("Empty configuration file {path}"));
}

#[test]
fn schema_alone_builds_defaults() {
    let root = Root::init(RootOptions::new().schema(log_level_schema())).unwrap();
    assert!(root.source().is_none());
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("INFO"))
    );
}

#[test]
fn validation_failure_surfaces_from_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad_level.conf", "[general]\nlog_level = LOUD\n");
    let err = Root::init(
        RootOptions::new()
            .source(path)
            .schema(log_level_schema()),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameter /general/log_level failed validation for value LOUD"
    );
}

#[test]
fn from_tree_validates_in_place() {
    let tree = Node::new("root");
    tree.set("/general", Mapping::new()).unwrap();
    let root = Root::from_tree(tree, Some(log_level_schema())).unwrap();
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("INFO"))
    );
    assert!(!root.refresh().unwrap(), "no source to refresh from");
}

#[test]
fn file_root_cannot_watch() {
    let root = Rc::new(Root::init(RootOptions::new().source(fixture_source("import.conf"))).unwrap());
    let err = root.watch().unwrap_err();
    assert!(err.to_string().starts_with("No store connection available"));
}

// ============================================================================
// Refresh and watch
// ============================================================================

fn seeded_store(level: &str) -> Rc<MemoryStore> {
    let store = Rc::new(MemoryStore::new());
    let tree = Node::new("root");
    tree.set("/general", Mapping::new()).unwrap();
    tree.set("/general/log_level", level).unwrap();
    tree.set_node_type(NodeType::AbstractNode).unwrap();
    write_tree(&*store, &tree, "/app/cfg", false).unwrap();
    store
}

fn watched_root(store: &Rc<MemoryStore>) -> Rc<Root> {
    let options = RootOptions::new()
        .source("kv:///app/cfg")
        .store(Rc::clone(store) as Rc<dyn KvStore>)
        .schema(log_level_schema());
    let root = Rc::new(Root::init(options).unwrap());
    root.watch().unwrap();
    root
}

#[test]
fn store_change_triggers_reload() {
    let store = seeded_store("INFO");
    let root = watched_root(&store);
    assert_eq!(root.tree().node_type(), NodeType::AbstractNode);

    store
        .set("/app/cfg/general", br#"{"log_level": "DEBUG"}"#)
        .unwrap();
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("DEBUG"))
    );
    assert!(!root.is_busy());
}

#[test]
fn own_save_does_not_trigger_reload() {
    let store = seeded_store("INFO");
    let root = watched_root(&store);
    let before = root.tree();

    root.save(&Source::parse("kv:///app/cfg"), true).unwrap();
    assert!(before.ptr_eq(&root.tree()), "tree was replaced by a reload");
    assert!(!root.is_busy());
    assert!(store.exists("/app/cfg/general"));
}

#[test]
fn failed_reload_keeps_previous_tree() {
    let store = seeded_store("INFO");
    let root = watched_root(&store);

    store
        .set("/app/cfg/general", br#"{"log_level": "LOUD"}"#)
        .unwrap();
    assert_eq!(
        root.tree().get_value("/general/log_level"),
        Some(Value::from("INFO"))
    );
    let err = root.refresh().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameter /general/log_level failed validation for value LOUD"
    );
    assert!(!root.is_busy());
}

#[test]
fn dropped_root_ignores_notifications() {
    let store = seeded_store("INFO");
    let root = watched_root(&store);
    drop(root);
    store
        .set("/app/cfg/general", br#"{"log_level": "DEBUG"}"#)
        .unwrap();
}

#[test]
fn store_source_requires_connection() {
    let err = Root::init(RootOptions::new().source("kv:///app/cfg")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "No store connection available for kv:///app/cfg"
    );
}
