//! Wrap the lists of paginated fields into connections.

use query_engine_sql::sql::dialect::TOTAL_COLUMN;
use query_engine_translation::translation::cursor;
use query_engine_translation::translation::error::RequestValidationError;
use query_engine_translation::translation::sql_ast::TableNode;
use query_engine_translation::translation::stringify::pagination::PageArguments;

/// Turn the lists of every paginated field fetched with `node`, `node` included, into
/// connections. Fields fetched in batches are left alone.
pub fn array_to_connection(
    mut data: serde_json::Value,
    node: &TableNode,
) -> Result<serde_json::Value, RequestValidationError> {
    connect_children(&mut data, node)?;
    if node.paginate {
        connection(data, node)
    } else {
        Ok(data)
    }
}

/// Build the connections of the fields below `data`, but not of `data` itself.
pub fn connect_children(
    data: &mut serde_json::Value,
    node: &TableNode,
) -> Result<(), RequestValidationError> {
    match data {
        serde_json::Value::Array(items) => {
            for item in items {
                connect_children(item, node)?;
            }
        }
        serde_json::Value::Object(object) => {
            for child in node.table_children() {
                if child.is_batch_boundary() {
                    continue;
                }
                if let Some(value) = object.get_mut(&child.field_name) {
                    let taken = std::mem::take(value);
                    *value = array_to_connection(taken, child)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// The connection of one page of rows of `node`.
pub fn connection(
    data: serde_json::Value,
    node: &TableNode,
) -> Result<serde_json::Value, RequestValidationError> {
    let rows = match data {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Null => vec![],
        other => vec![other],
    };
    let arguments = PageArguments::of(node)?;

    if let Some(sort_key) = node.effective_sort_key() {
        let columns: Vec<&str> = sort_key
            .iter()
            .map(|ordering| ordering.column.as_str())
            .collect();
        return Ok(keyset_connection(rows, &arguments, &columns));
    }
    if node.effective_order_by().is_some() {
        return offset_connection(rows, &arguments);
    }
    Ok(serde_json::Value::Array(rows))
}

/// Pages were fetched with one row too many, telling whether there is another page.
fn keyset_connection(
    mut rows: Vec<serde_json::Value>,
    arguments: &PageArguments,
    columns: &[&str],
) -> serde_json::Value {
    let mut has_next_page = false;
    let mut has_previous_page = false;
    if let Some(first) = arguments.first {
        if rows.len() as u64 > first {
            has_next_page = true;
            rows.truncate(usize::try_from(first).unwrap_or(usize::MAX));
        }
    } else if let Some(last) = arguments.last {
        if rows.len() as u64 > last {
            has_previous_page = true;
            rows.truncate(usize::try_from(last).unwrap_or(usize::MAX));
        }
        // fetched backwards
        rows.reverse();
    }

    let edges: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|node| {
            let key: serde_json::Map<String, serde_json::Value> = columns
                .iter()
                .map(|column| {
                    let value = node.get(*column).cloned().unwrap_or_default();
                    ((*column).to_string(), value)
                })
                .collect();
            edge(cursor::encode(&serde_json::Value::Object(key)), node)
        })
        .collect();

    let page_info = page_info(&edges, has_next_page, has_previous_page);
    serde_json::json!({
        "edges": edges,
        "pageInfo": page_info,
    })
}

/// Offset cursors count rows from the start of the whole list, whose length the
/// `$total` column holds.
fn offset_connection(
    mut rows: Vec<serde_json::Value>,
    arguments: &PageArguments,
) -> Result<serde_json::Value, RequestValidationError> {
    let offset = match &arguments.after {
        Some(after) => cursor::decode_offset(after)?
            .checked_add(1)
            .ok_or_else(|| RequestValidationError::MalformedCursor(after.clone()))?,
        None => 0,
    };
    let total = rows.first().map_or(0, |row| total_of(&row[TOTAL_COLUMN]));

    let mut keep = rows.len() as u64;
    if let Some(first) = arguments.first {
        keep = keep.min(first);
    }
    keep = keep.min(total.saturating_sub(offset));
    rows.truncate(usize::try_from(keep).unwrap_or(usize::MAX));

    // keep never exceeds total - offset
    let has_next_page = offset + keep < total;
    let edges: Vec<serde_json::Value> = rows
        .into_iter()
        .enumerate()
        .map(|(index, node)| {
            let position = offset.saturating_add(index as u64);
            edge(cursor::encode_offset(position), node)
        })
        .collect();

    let page_info = page_info(&edges, has_next_page, false);
    Ok(serde_json::json!({
        "edges": edges,
        "pageInfo": page_info,
        "total": total,
    }))
}

/// Counts may arrive as numbers or, from some drivers, as numeric strings.
fn total_of(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(number) => number.as_u64().unwrap_or(0),
        serde_json::Value::String(string) => string.parse().unwrap_or(0),
        _ => 0,
    }
}

fn edge(cursor: String, node: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "cursor": cursor, "node": node })
}

fn page_info(
    edges: &[serde_json::Value],
    has_next_page: bool,
    has_previous_page: bool,
) -> serde_json::Value {
    serde_json::json!({
        "hasNextPage": has_next_page,
        "hasPreviousPage": has_previous_page,
        "startCursor": edges.first().map(|edge| edge["cursor"].clone()),
        "endCursor": edges.last().map(|edge| edge["cursor"].clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use query_engine_sql::sql::ast::OrderByDirection;
    use query_engine_translation::translation::sql_ast::Ordering;
    use serde_json::json;

    fn paginated(args: serde_json::Value, sort_key: bool) -> TableNode {
        let ordering = vec![Ordering {
            column: "id".to_string(),
            direction: OrderByDirection::Asc,
        }];
        TableNode {
            field_name: "posts".to_string(),
            type_name: "Post".to_string(),
            name: "posts".to_string(),
            alias: "posts".to_string(),
            args: serde_json::from_value(args).unwrap(),
            grab_many: true,
            paginate: true,
            order_by: if sort_key { None } else { Some(ordering.clone()) },
            sort_key: if sort_key { Some(ordering) } else { None },
            limit: None,
            where_: None,
            relation: None,
            children: vec![],
            typed_children: IndexMap::new(),
        }
    }

    #[test]
    fn keyset_pages_drop_the_extra_row() {
        let node = paginated(json!({"first": 2}), true);
        let data = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        let first = cursor::encode(&json!({"id": 1}));
        let second = cursor::encode(&json!({"id": 2}));
        similar_asserts::assert_eq!(
            array_to_connection(data, &node).unwrap(),
            json!({
                "edges": [
                    {"cursor": first, "node": {"id": 1}},
                    {"cursor": second, "node": {"id": 2}},
                ],
                "pageInfo": {
                    "hasNextPage": true,
                    "hasPreviousPage": false,
                    "startCursor": first,
                    "endCursor": second,
                },
            })
        );
    }

    #[test]
    fn backward_keyset_pages_are_reversed() {
        let node = paginated(json!({"last": 2}), true);
        let connection = array_to_connection(json!([{"id": 9}, {"id": 8}]), &node).unwrap();
        assert_eq!(connection["edges"][0]["node"], json!({"id": 8}));
        assert_eq!(connection["edges"][1]["node"], json!({"id": 9}));
        assert_eq!(connection["pageInfo"]["hasPreviousPage"], json!(false));
    }

    #[test]
    fn offset_pages_count_from_the_cursor() {
        let after = cursor::encode_offset(4);
        let node = paginated(json!({"first": 2, "after": after}), false);
        let data = json!([
            {"id": 6, "$total": 10},
            {"id": 7, "$total": 10},
            {"id": 8, "$total": 10},
        ]);
        let connection = array_to_connection(data, &node).unwrap();
        assert_eq!(connection["total"], json!(10));
        assert_eq!(connection["edges"].as_array().unwrap().len(), 2);
        assert_eq!(connection["edges"][0]["cursor"], json!(cursor::encode_offset(5)));
        assert_eq!(connection["pageInfo"]["endCursor"], json!(cursor::encode_offset(6)));
        assert_eq!(connection["pageInfo"]["hasNextPage"], json!(true));
    }

    #[test]
    fn offsets_past_the_largest_row_number_are_malformed() {
        let after = cursor::encode_offset(u64::MAX);
        let node = paginated(json!({"first": 2, "after": after}), false);
        assert_eq!(
            array_to_connection(json!([{"id": 1, "$total": 1}]), &node),
            Err(RequestValidationError::MalformedCursor(after))
        );
    }

    #[test]
    fn nothing_makes_an_empty_connection() {
        let node = paginated(json!({}), false);
        similar_asserts::assert_eq!(
            array_to_connection(json!(null), &node).unwrap(),
            json!({
                "edges": [],
                "pageInfo": {
                    "hasNextPage": false,
                    "hasPreviousPage": false,
                    "startCursor": null,
                    "endCursor": null,
                },
                "total": 0,
            })
        );
    }
}
