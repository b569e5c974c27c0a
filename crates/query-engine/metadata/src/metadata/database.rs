//! Metadata describing how types map to tables and how fields are fetched from them.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::builders::{ColumnThunk, JoinCondition, SqlExpression, WhereCondition};
use super::thunk::Thunk;

/// Either a single item or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SingleOrList<T> {
    Single(T),
    List(Vec<T>),
}

impl<T> SingleOrList<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            SingleOrList::Single(item) => std::slice::from_ref(item),
            SingleOrList::List(items) => items,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

/// The column(s) uniquely identifying a row.
pub type UniqueKey = SingleOrList<String>;

/// Metadata on an object, interface or union type backed by a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// The table name, or any SQL yielding a relation (such as a parenthesized subquery).
    pub sql_table: Thunk<String>,
    pub unique_key: UniqueKey,
    /// Columns fetched regardless of the selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_fetch: Option<SingleOrList<ColumnThunk>>,
}

/// Ties a batched child back to its parent: `this_key` on the child table
/// matches `parent_key` on the parent table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    pub this_key: String,
    pub parent_key: String,
}

/// Batch fetching through a junction table: `this_key` lives on the junction table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JunctionBatchConfig {
    pub this_key: String,
    pub parent_key: String,
    /// Joins the junction table (`{parent}`) to the target table (`{child}`).
    pub sql_join: JoinCondition,
}

/// A many-to-many relation through an intermediate table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JunctionConfig {
    pub sql_table: Thunk<String>,
    /// Parent to junction, then junction to target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_joins: Option<[JoinCondition; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_batch: Option<JunctionBatchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<UniqueKey>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<WhereCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Thunk<OrderBySpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<Thunk<SortKeySpec>>,
    /// Fields of the junction table exposed on the target type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Thunk<BTreeMap<String, FieldConfig>>>,
}

/// Metadata on a single field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_expr: Option<SqlExpression>,
    /// Columns needed by the field resolver without being selected as the field itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_deps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_join: Option<JoinCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_batch: Option<BatchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction: Option<JunctionConfig>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<WhereCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Thunk<OrderBySpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<Thunk<SortKeySpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Thunk<u64>>,
    pub sql_paginate: bool,
    pub ignore_table: bool,
    pub ignore_all: bool,
}

impl FieldConfig {
    /// Overlay the options set in `other` on top of these.
    pub fn merged_with(&self, other: &FieldConfig) -> FieldConfig {
        FieldConfig {
            sql_column: other.sql_column.clone().or_else(|| self.sql_column.clone()),
            sql_expr: other.sql_expr.clone().or_else(|| self.sql_expr.clone()),
            sql_deps: other.sql_deps.clone().or_else(|| self.sql_deps.clone()),
            sql_join: other.sql_join.clone().or_else(|| self.sql_join.clone()),
            sql_batch: other.sql_batch.clone().or_else(|| self.sql_batch.clone()),
            junction: other.junction.clone().or_else(|| self.junction.clone()),
            where_: other.where_.clone().or_else(|| self.where_.clone()),
            order_by: other.order_by.clone().or_else(|| self.order_by.clone()),
            sort_key: other.sort_key.clone().or_else(|| self.sort_key.clone()),
            limit: other.limit.clone().or_else(|| self.limit.clone()),
            sql_paginate: other.sql_paginate || self.sql_paginate,
            ignore_table: other.ignore_table || self.ignore_table,
            ignore_all: other.ignore_all || self.ignore_all,
        }
    }
}

/// A single ordered column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrderingSpec {
    pub column: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "ASC".to_string()
}

/// The accepted forms of an `orderBy` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OrderBySpec {
    /// A single column, ascending.
    Column(String),
    /// Column to direction, in priority order.
    Mapping(IndexMap<String, String>),
    List(Vec<OrderingSpec>),
}

/// The accepted forms of a `sortKey` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SortKeySpec {
    /// One direction applied to every key column.
    Key {
        order: String,
        key: SingleOrList<String>,
    },
    List(Vec<OrderingSpec>),
}

impl SortKeySpec {
    /// The sort key column names.
    pub fn columns(&self) -> Vec<String> {
        match self {
            SortKeySpec::Key { key, .. } => key.iter().cloned().collect(),
            SortKeySpec::List(list) => list.iter().map(|o| o.column.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_config_deserializes_from_camel_case() {
        let config: FieldConfig = serde_json::from_value(serde_json::json!({
            "sqlBatch": {"thisKey": "author_id", "parentKey": "id"},
            "orderBy": {"created_at": "desc", "id": "asc"},
            "sortKey": {"order": "asc", "key": ["created_at", "id"]},
            "sqlPaginate": true
        }))
        .unwrap();

        assert_eq!(
            config.sql_batch,
            Some(BatchConfig {
                this_key: "author_id".to_string(),
                parent_key: "id".to_string()
            })
        );
        assert!(config.sql_paginate);
        assert!(!config.ignore_table);
        match config.order_by {
            Some(Thunk::Value(OrderBySpec::Mapping(mapping))) => {
                assert_eq!(
                    mapping.keys().collect::<Vec<_>>(),
                    vec!["created_at", "id"]
                );
            }
            other => panic!("unexpected order by: {other:?}"),
        }
        match config.sort_key {
            Some(Thunk::Value(sort_key)) => {
                assert_eq!(sort_key.columns(), vec!["created_at", "id"]);
            }
            other => panic!("unexpected sort key: {other:?}"),
        }
    }

    #[test]
    fn include_overlays_field_options() {
        let base = FieldConfig {
            sql_column: Some("name".to_string()),
            ..FieldConfig::default()
        };
        let include = FieldConfig {
            sql_column: Some("relation_kind".to_string()),
            ignore_all: true,
            ..FieldConfig::default()
        };
        let merged = base.merged_with(&include);
        assert_eq!(merged.sql_column.as_deref(), Some("relation_kind"));
        assert!(merged.ignore_all);
    }
}
