//! Normalize `orderBy` and `sortKey` options into lists of orderings.

use query_engine_metadata::metadata;
use query_engine_sql::sql::ast::OrderByDirection;

use crate::translation::error::ConfigurationError;
use crate::translation::sql_ast::Ordering;

/// Parse a direction, ignoring case.
pub fn parse_direction(direction: &str) -> Result<OrderByDirection, ConfigurationError> {
    match direction.to_uppercase().as_str() {
        "ASC" => Ok(OrderByDirection::Asc),
        "DESC" => Ok(OrderByDirection::Desc),
        _ => Err(ConfigurationError::InvalidDirection(direction.to_string())),
    }
}

/// A column name, a mapping of columns to directions, or a list of orderings.
pub fn normalize_order_by(
    order_by: &metadata::OrderBySpec,
) -> Result<Vec<Ordering>, ConfigurationError> {
    match order_by {
        metadata::OrderBySpec::Column(column) => Ok(vec![Ordering {
            column: column.clone(),
            direction: OrderByDirection::Asc,
        }]),
        metadata::OrderBySpec::Mapping(mapping) => mapping
            .iter()
            .map(|(column, direction)| ordering(column, direction))
            .collect(),
        metadata::OrderBySpec::List(list) => list
            .iter()
            .map(|spec| ordering(&spec.column, &spec.direction))
            .collect(),
    }
}

pub fn normalize_sort_key(
    sort_key: &metadata::SortKeySpec,
) -> Result<Vec<Ordering>, ConfigurationError> {
    match sort_key {
        metadata::SortKeySpec::Key { order, key } => {
            let direction = parse_direction(order)?;
            Ok(key
                .iter()
                .map(|column| Ordering {
                    column: column.clone(),
                    direction,
                })
                .collect())
        }
        metadata::SortKeySpec::List(list) => list
            .iter()
            .map(|spec| ordering(&spec.column, &spec.direction))
            .collect(),
    }
}

fn ordering(column: &str, direction: &str) -> Result<Ordering, ConfigurationError> {
    Ok(Ordering {
        column: column.to_string(),
        direction: parse_direction(direction)?,
    })
}

/// The orderings to fetch with: reversed when paging backwards.
pub fn directed(orderings: &[Ordering], backwards: bool) -> Vec<Ordering> {
    orderings
        .iter()
        .map(|ordering| Ordering {
            column: ordering.column.clone(),
            direction: if backwards {
                ordering.direction.flip()
            } else {
                ordering.direction
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asc(column: &str) -> Ordering {
        Ordering {
            column: column.to_string(),
            direction: OrderByDirection::Asc,
        }
    }

    fn desc(column: &str) -> Ordering {
        Ordering {
            column: column.to_string(),
            direction: OrderByDirection::Desc,
        }
    }

    #[test]
    fn every_order_by_form_normalizes() {
        let column: metadata::OrderBySpec = serde_json::from_value(serde_json::json!("id")).unwrap();
        assert_eq!(normalize_order_by(&column).unwrap(), vec![asc("id")]);

        let mapping: metadata::OrderBySpec =
            serde_json::from_value(serde_json::json!({"created_at": "desc", "id": "ASC"})).unwrap();
        assert_eq!(
            normalize_order_by(&mapping).unwrap(),
            vec![desc("created_at"), asc("id")]
        );

        let list: metadata::OrderBySpec = serde_json::from_value(serde_json::json!([
            {"column": "id", "direction": "Desc"},
            {"column": "name"}
        ]))
        .unwrap();
        assert_eq!(
            normalize_order_by(&list).unwrap(),
            vec![desc("id"), asc("name")]
        );
    }

    #[test]
    fn unknown_directions_are_configuration_errors() {
        let mapping: metadata::OrderBySpec =
            serde_json::from_value(serde_json::json!({"id": "sideways"})).unwrap();
        assert_eq!(
            normalize_order_by(&mapping),
            Err(ConfigurationError::InvalidDirection("sideways".to_string()))
        );
    }

    #[test]
    fn sort_keys_share_one_direction() {
        let sort_key: metadata::SortKeySpec =
            serde_json::from_value(serde_json::json!({"order": "desc", "key": ["created_at", "id"]}))
                .unwrap();
        assert_eq!(
            normalize_sort_key(&sort_key).unwrap(),
            vec![desc("created_at"), desc("id")]
        );
        assert_eq!(
            directed(&normalize_sort_key(&sort_key).unwrap(), true),
            vec![asc("created_at"), asc("id")]
        );
    }
}
