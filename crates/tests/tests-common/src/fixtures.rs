//! Schemas and requests used across test cases.

use std::path::PathBuf;

use query_engine_metadata::metadata;

/// Find a fixture via the crate root provided by `cargo test`.
/// This depends on the convention that this crate lives in `/crates/tests/tests-common`.
pub fn get_fixture_file(fixture_path: &str) -> PathBuf {
    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push("fixtures");
    d.push(fixture_path);
    d
}

/// The blog schema: users with posts, comments, followers and a union of what they wrote.
pub fn blog_schema() -> metadata::Schema {
    let contents = std::fs::read_to_string(get_fixture_file("blog/schema.json"))
        .expect("the blog schema fixture is readable");
    serde_json::from_str(&contents).expect("the blog schema fixture is valid")
}

/// A request for a root field of the blog schema's `Query` type.
pub fn query(field: metadata::Field) -> metadata::QueryRequest {
    metadata::QueryRequest {
        parent_type: "Query".to_string(),
        field_nodes: vec![field],
        fragments: std::collections::BTreeMap::new(),
    }
}

/// A field with the given sub-selections.
pub fn field(name: &str, selections: Vec<metadata::Selection>) -> metadata::Selection {
    metadata::Selection::Field(metadata::Field::new(name).with_selections(selections))
}

/// Scalar fields.
pub fn scalars(names: &[&str]) -> Vec<metadata::Selection> {
    names
        .iter()
        .map(|name| metadata::Selection::field(*name))
        .collect()
}

/// A connection selection: `edges { cursor node { ... } } pageInfo { ... }`.
pub fn connection(node: Vec<metadata::Selection>) -> Vec<metadata::Selection> {
    vec![
        field(
            "edges",
            vec![metadata::Selection::field("cursor"), field("node", node)],
        ),
        field(
            "pageInfo",
            scalars(&["hasNextPage", "hasPreviousPage", "startCursor", "endCursor"]),
        ),
    ]
}
