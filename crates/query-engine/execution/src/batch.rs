//! Fetch the tables behind batch boundaries once their parents are in the data.
//!
//! Boundaries are fetched level by level. Every boundary reachable from the current level
//! without crossing another boundary gets one statement, scoped to the parent keys found
//! in the data, and all of these statements run together. Their rows are then spliced
//! into the parents, and the tables fetched become the next level.
//!
//! Objects are addressed by JSON pointer into the data, so the statements of one level
//! can run while nothing borrows the data.

use futures::future::try_join_all;
use indexmap::IndexMap;
use tracing::{info_span, Instrument};

use query_engine_metadata::metadata;
use query_engine_sql::sql;
use query_engine_translation::translation::shape::define_object_shape;
use query_engine_translation::translation::sql_ast::TableNode;
use query_engine_translation::translation::stringify;

use crate::connections::{connect_children, connection};
use crate::error::Error;
use crate::executor::Executor;
use crate::query::{execute, log_shape, Options};
use crate::unions::resolve_unions;

/// Rows of a batch, by the key they match their parents on.
type Groups = IndexMap<String, Vec<serde_json::Value>>;

/// A table already in the data, and the pointers of its objects.
struct Fetched<'n> {
    node: &'n TableNode,
    objects: Vec<String>,
}

/// A table to fetch, and the pointers of the objects it belongs to.
struct Boundary<'n> {
    node: &'n TableNode,
    parents: Vec<String>,
}

/// Fill in every field of `data` fetched in batches below `root`.
pub async fn next_batch(
    root: &TableNode,
    data: &mut serde_json::Value,
    context: &metadata::Context,
    executor: &dyn Executor,
    options: &Options<'_>,
) -> Result<(), Error> {
    let mut level = vec![Fetched {
        node: root,
        objects: objects_at(data, "", root),
    }];

    for depth in 1.. {
        let mut boundaries = vec![];
        for fetched in &level {
            collect_boundaries(data, fetched.node, &fetched.objects, &mut boundaries);
        }
        if boundaries.is_empty() {
            break;
        }

        let scopes: Vec<Vec<serde_json::Value>> = boundaries
            .iter()
            .map(|boundary| batch_scope(data, boundary))
            .collect();
        let groups = try_join_all(
            boundaries
                .iter()
                .zip(&scopes)
                .map(|(boundary, scope)| fetch_batch(boundary.node, scope, context, executor, options)),
        )
        .instrument(info_span!("Batch level", depth, statements = boundaries.len()))
        .await?;

        level = vec![];
        for (boundary, groups) in boundaries.iter().zip(&groups) {
            let objects = splice(data, boundary, groups)?;
            level.push(Fetched {
                node: boundary.node,
                objects,
            });
        }
    }
    Ok(())
}

/// Find the boundaries below the objects of `node`, following joined tables.
fn collect_boundaries<'n>(
    data: &serde_json::Value,
    node: &'n TableNode,
    objects: &[String],
    boundaries: &mut Vec<Boundary<'n>>,
) {
    if objects.is_empty() {
        return;
    }
    for child in node.table_children() {
        if child.is_batch_boundary() {
            boundaries.push(Boundary {
                node: child,
                parents: objects.to_vec(),
            });
        } else {
            let nested: Vec<String> = objects
                .iter()
                .flat_map(|object| objects_at(data, &field_pointer(object, &child.field_name), child))
                .collect();
            collect_boundaries(data, child, &nested, boundaries);
        }
    }
}

/// The distinct parent keys of a boundary. Missing and null keys match nothing.
fn batch_scope(data: &serde_json::Value, boundary: &Boundary) -> Vec<serde_json::Value> {
    let Some((_, parent_key)) = boundary.node.batch_keys() else {
        return vec![];
    };
    let mut scope: IndexMap<String, serde_json::Value> = IndexMap::new();
    for parent in &boundary.parents {
        let key = data
            .pointer(parent)
            .and_then(|object| object.get(&parent_key.field_name));
        if let Some(key) = key {
            if let Some(text) = key_text(key) {
                scope.entry(text).or_insert_with(|| key.clone());
            }
        }
    }
    scope.into_values().collect()
}

/// Run the statement of one boundary and group its rows by their key.
async fn fetch_batch(
    node: &TableNode,
    scope: &[serde_json::Value],
    context: &metadata::Context,
    executor: &dyn Executor,
    options: &Options<'_>,
) -> Result<Groups, Error> {
    let mut groups = Groups::new();
    let Some((this_key, _)) = node.batch_keys() else {
        return Ok(groups);
    };
    if scope.is_empty() {
        return Ok(groups);
    }

    let values: Vec<sql::ast::Value> = scope.iter().map(sql::ast::Value::from_json).collect();
    let sql = stringify::to_sql(node, context, options.dialect, Some(values.as_slice()))?;
    if sql.is_empty() {
        return Ok(groups);
    }
    tracing::debug!(field = %node.field_name, sql = %sql, "SQL");

    let shape = define_object_shape(node).as_many();
    log_shape(&shape);
    let rows = execute(executor, &sql).await?;

    let mut data = options.hydrator.nest(&rows, &shape);
    resolve_unions(&mut data, node);
    connect_children(&mut data, node)?;
    tracing::debug!(field = %node.field_name, data = %data, "SHAPED_DATA");

    if let serde_json::Value::Array(objects) = data {
        for object in objects {
            let key = object.get(&this_key.field_name).and_then(key_text);
            if let Some(key) = key {
                groups.entry(key).or_default().push(object);
            }
        }
    }
    Ok(groups)
}

/// Put the rows of a boundary into its parents, returning the pointers of the objects
/// it put there.
fn splice(
    data: &mut serde_json::Value,
    boundary: &Boundary,
    groups: &Groups,
) -> Result<Vec<String>, Error> {
    let node = boundary.node;
    let Some((_, parent_key)) = node.batch_keys() else {
        return Ok(vec![]);
    };

    let mut fetched = vec![];
    for parent in &boundary.parents {
        let Some(object) = data.pointer_mut(parent).and_then(serde_json::Value::as_object_mut)
        else {
            continue;
        };
        let group = object
            .get(&parent_key.field_name)
            .and_then(key_text)
            .and_then(|key| groups.get(&key));

        let value = if node.paginate {
            connection(
                serde_json::Value::Array(group.cloned().unwrap_or_default()),
                node,
            )?
        } else if node.grab_many {
            serde_json::Value::Array(group.cloned().unwrap_or_default())
        } else {
            group
                .and_then(|group| group.first().cloned())
                .unwrap_or(serde_json::Value::Null)
        };
        object.insert(node.field_name.clone(), value);

        fetched.extend(objects_at(
            data,
            &field_pointer(parent, &node.field_name),
            node,
        ));
    }
    Ok(fetched)
}

/// Keys are matched on their text: strings as they are, anything else as JSON.
fn key_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(string) => Some(string.clone()),
        other => Some(other.to_string()),
    }
}

/// The pointers of the objects of `node` held at `pointer`: a single object, a list of
/// them, or a connection.
fn objects_at(data: &serde_json::Value, pointer: &str, node: &TableNode) -> Vec<String> {
    match data.pointer(pointer) {
        Some(serde_json::Value::Object(connection)) if node.paginate => {
            match connection.get("edges") {
                Some(serde_json::Value::Array(edges)) => edges
                    .iter()
                    .enumerate()
                    .filter(|(_, edge)| edge["node"].is_object())
                    .map(|(index, _)| format!("{pointer}/edges/{index}/node"))
                    .collect(),
                _ => vec![],
            }
        }
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_object())
            .map(|(index, _)| format!("{pointer}/{index}"))
            .collect(),
        Some(serde_json::Value::Object(_)) => vec![pointer.to_string()],
        _ => vec![],
    }
}

fn field_pointer(object: &str, field: &str) -> String {
    format!("{object}/{}", field.replace('~', "~0").replace('/', "~1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_match_on_their_text() {
        assert_eq!(key_text(&json!(1)), Some("1".to_string()));
        assert_eq!(key_text(&json!("1")), Some("1".to_string()));
        assert_eq!(key_text(&json!(true)), Some("true".to_string()));
        assert_eq!(key_text(&json!(null)), None);
    }

    #[test]
    fn pointers_escape_field_names() {
        assert_eq!(field_pointer("/0", "a/b~c"), "/0/a~1b~0c");
        let data = json!([{"a/b~c": 1}]);
        assert_eq!(data.pointer(&field_pointer("/0", "a/b~c")), Some(&json!(1)));
    }
}
