use std::{fs, path::PathBuf};

use serde_json::{Value, json};
use spacefold_core::SpaceIndex;
use spacefold_core::models::{
    Combinator, FilterValueType, PathState, SortField, SpaceKind, SpaceState,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("space_definitions.json")
}

fn load_fixture() -> Vec<SpaceState> {
    let raw = fs::read_to_string(fixture_path()).expect("read space definitions fixture");
    serde_json::from_str(&raw).expect("parse space definitions fixture")
}

fn members(index: &SpaceIndex, space: &str) -> Vec<String> {
    index
        .space_members(space)
        .into_iter()
        .map(|path| path.path.clone())
        .collect()
}

#[test]
fn fixture_uses_original_wire_names() {
    let spaces = load_fixture();
    assert_eq!(spaces.len(), 5);

    let open = &spaces[0];
    assert_eq!(open.kind, SpaceKind::Smart);
    assert_eq!(open.sort.field, SortField::Name);
    assert_eq!(open.filters[0].filters[0].func, "is");
    assert_eq!(open.filters[0].filters[0].kind, "frontmatter");

    let owned = &spaces[1];
    assert_eq!(owned.filters[0].combinator, Combinator::Any);
    assert_eq!(
        owned.filters[0].filters[0].value_type,
        FilterValueType::Property
    );
    assert_eq!(
        owned.filters[0].filters[1].value_type,
        FilterValueType::Literal
    );

    assert!(spaces[2].joins[0].recursive);
    assert_eq!(spaces[4].kind, SpaceKind::Default);
    assert_eq!(spaces[4].links, vec!["Work/b.md", "notes.md"]);
}

#[test]
fn serialized_definitions_keep_wire_names() {
    let spaces = load_fixture();
    let value = serde_json::to_value(&spaces[1]).expect("serialize space");
    let filter = &value["filters"][0]["filters"][0];
    assert_eq!(filter["fn"], Value::String("is".to_string()));
    assert_eq!(filter["fType"], Value::String("property".to_string()));
    assert_eq!(value["filters"][0]["type"], Value::String("any".to_string()));
    assert_eq!(value["type"], Value::String("smart".to_string()));
}

#[test]
fn fixture_spaces_resolve_members() {
    let mut index = SpaceIndex::default();
    for space in load_fixture() {
        index.add_space(space).expect("add fixture space");
    }
    index.on_path_created(PathState::folder("Work"));
    index.on_path_created(
        PathState::file("Work/a.md")
            .with_tag("#done")
            .with_property("status", json!("open"))
            .with_property("owner", json!("kim")),
    );
    index.on_path_created(PathState::file("Work/deep/c.md").with_tag("#done/late"));
    index.on_path_created(PathState::file("Work/b.md").with_tag("#mine"));
    index.on_path_created(PathState::file("notes.md").with_property("status", json!("Open")));

    assert_eq!(members(&index, "spaces://Open"), vec!["Work/a.md", "notes.md"]);
    assert_eq!(members(&index, "spaces://Owned"), vec!["Work/a.md", "Work/b.md"]);
    assert_eq!(members(&index, "spaces://DoneWork"), vec!["Work/a.md"]);
    assert_eq!(
        members(&index, "spaces://#done"),
        vec!["Work/a.md", "Work/deep/c.md"]
    );
    assert_eq!(members(&index, "spaces://Pinned"), vec!["Work/b.md", "notes.md"]);
}
