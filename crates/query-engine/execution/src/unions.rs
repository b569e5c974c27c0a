//! Fold the type-qualified properties of union and interface objects into plain ones.

use query_engine_translation::translation::sql_ast::{SqlAstNode, TableNode};

/// Replace every `field@Type` property by `field`, at every level fetched with `node`.
/// The first non-null value wins.
pub fn resolve_unions(data: &mut serde_json::Value, node: &TableNode) {
    match data {
        serde_json::Value::Array(items) => {
            for item in items {
                resolve_unions(item, node);
            }
        }
        serde_json::Value::Object(object) => resolve_object(object, node),
        _ => {}
    }
}

fn resolve_object(object: &mut serde_json::Map<String, serde_json::Value>, node: &TableNode) {
    for (type_name, children) in &node.typed_children {
        let suffix = format!("@{type_name}");
        for child in children {
            match child {
                SqlAstNode::ColumnDeps(deps) => {
                    for name in deps.columns.keys() {
                        collapse(object, name, &suffix);
                    }
                }
                SqlAstNode::Table(table) | SqlAstNode::Union(table) => {
                    let name = match table.batch_keys() {
                        Some((_, parent_key)) => &parent_key.field_name,
                        None => &table.field_name,
                    };
                    collapse(object, name, &suffix);
                }
                other => {
                    if let Some(name) = other.field_name() {
                        collapse(object, name, &suffix);
                    }
                }
            }
        }
    }

    for child in node.table_children() {
        if child.is_batch_boundary() {
            continue;
        }
        if let Some(value) = object.get_mut(&child.field_name) {
            resolve_unions(value, child);
        }
    }
}

fn collapse(object: &mut serde_json::Map<String, serde_json::Value>, name: &str, suffix: &str) {
    let qualified = object.remove(&format!("{name}{suffix}"));
    if object.get(name).map_or(true, serde_json::Value::is_null) {
        object.insert(
            name.to_string(),
            qualified.unwrap_or(serde_json::Value::Null),
        );
    }
}
