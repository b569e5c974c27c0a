//! Turn flat rows into nested objects following an object shape.

use indexmap::IndexMap;

use query_engine_translation::translation::shape::{ObjectShape, PropertyShape};

/// One row of a result set, by column alias.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Builds nested data out of the rows of one statement.
pub trait Hydrator: Send + Sync {
    /// A list when the shape is a list, otherwise the first object or null.
    fn nest(&self, rows: &[Row], shape: &ObjectShape) -> serde_json::Value;
}

/// Groups rows by the identity column of every object, keeping the order in which
/// objects first appear. A joined object whose identity is null was not there: it
/// becomes null, or is left out of its list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestHydrator;

impl Hydrator for NestHydrator {
    fn nest(&self, rows: &[Row], shape: &ObjectShape) -> serde_json::Value {
        let rows: Vec<&Row> = rows.iter().collect();
        nest_property(&rows, shape)
    }
}

fn nest_property(rows: &[&Row], shape: &ObjectShape) -> serde_json::Value {
    let objects = nest_objects(rows, shape);
    if shape.many {
        serde_json::Value::Array(objects)
    } else {
        objects.into_iter().next().unwrap_or(serde_json::Value::Null)
    }
}

fn nest_objects(rows: &[&Row], shape: &ObjectShape) -> Vec<serde_json::Value> {
    let mut groups: IndexMap<String, Vec<&Row>> = IndexMap::new();
    for &row in rows {
        if let Some(identity) = identity(row, shape) {
            groups.entry(identity).or_default().push(row);
        }
    }
    groups
        .into_values()
        .map(|group| build_object(&group, shape))
        .collect()
}

/// The identity column's value, or of every column when the shape starts with a nested
/// object. None when it is null.
fn identity(row: &Row, shape: &ObjectShape) -> Option<String> {
    let value = |column: &str| row.get(column).unwrap_or(&serde_json::Value::Null);
    match shape.identity() {
        Some(column) => Some(value(column))
            .filter(|value| !value.is_null())
            .map(serde_json::Value::to_string),
        None => {
            let values: Vec<serde_json::Value> = shape
                .properties
                .values()
                .filter_map(|property| match property {
                    PropertyShape::Column(column) => Some(value(column).clone()),
                    PropertyShape::Object(_) => None,
                })
                .collect();
            if values.iter().all(serde_json::Value::is_null) {
                None
            } else {
                Some(serde_json::Value::Array(values).to_string())
            }
        }
    }
}

fn build_object(group: &[&Row], shape: &ObjectShape) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (name, property) in &shape.properties {
        let value = match property {
            PropertyShape::Column(column) => group
                .first()
                .and_then(|row| row.get(column))
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            PropertyShape::Object(nested) => nest_property(group, nested),
        };
        object.insert(name.clone(), value);
    }
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn column(alias: &str) -> PropertyShape {
        PropertyShape::Column(alias.to_string())
    }

    fn user_shape() -> ObjectShape {
        let posts = ObjectShape {
            many: true,
            properties: IndexMap::from([
                ("id".to_string(), column("posts__id")),
                ("body".to_string(), column("posts__body")),
            ]),
        };
        let manager = ObjectShape {
            many: false,
            properties: IndexMap::from([("id".to_string(), column("manager__id"))]),
        };
        ObjectShape {
            many: true,
            properties: IndexMap::from([
                ("id".to_string(), column("id")),
                ("posts".to_string(), PropertyShape::Object(posts)),
                ("manager".to_string(), PropertyShape::Object(manager)),
            ]),
        }
    }

    #[test]
    fn rows_are_grouped_by_identity_in_order() {
        let rows = rows(json!([
            {"id": 2, "posts__id": 7, "posts__body": "b", "manager__id": 1},
            {"id": 1, "posts__id": 5, "posts__body": "x", "manager__id": null},
            {"id": 2, "posts__id": 8, "posts__body": "c", "manager__id": 1},
            {"id": 2, "posts__id": 7, "posts__body": "b", "manager__id": 1},
        ]));
        similar_asserts::assert_eq!(
            NestHydrator.nest(&rows, &user_shape()),
            json!([
                {
                    "id": 2,
                    "posts": [{"id": 7, "body": "b"}, {"id": 8, "body": "c"}],
                    "manager": {"id": 1}
                },
                {"id": 1, "posts": [{"id": 5, "body": "x"}], "manager": null},
            ])
        );
    }

    #[test]
    fn missing_joined_rows_leave_empty_lists() {
        let rows = rows(json!([{"id": 3, "posts__id": null, "posts__body": null}]));
        similar_asserts::assert_eq!(
            NestHydrator.nest(&rows, &user_shape()),
            json!([{"id": 3, "posts": [], "manager": null}])
        );
    }

    #[test]
    fn a_single_object_is_the_first_one() {
        let shape = ObjectShape {
            many: false,
            ..user_shape()
        };
        assert_eq!(NestHydrator.nest(&[], &shape), json!(null));
        let rows = rows(json!([{"id": 4}, {"id": 5}]));
        assert_eq!(NestHydrator.nest(&rows, &shape)["id"], json!(4));
    }
}
