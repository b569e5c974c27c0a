//! Compile a selection tree into a SQL AST.

mod fields;
pub mod pruning;
mod selections;
pub mod sorting;
mod tables;

use std::collections::BTreeMap;

use query_engine_metadata::metadata;
use query_engine_sql::sql;

use super::aliases::AliasNamespace;
use super::error::{ConfigurationError, Error, RequestValidationError};
use super::sql_ast::SqlAstNode;

/// Compile the field a request selects into a SQL AST rooted at a table.
pub fn compile(
    schema: &metadata::Schema,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    namespace: &mut AliasNamespace,
) -> Result<SqlAstNode, Error> {
    let parent_type = schema
        .lookup_type(&request.parent_type)
        .ok_or_else(|| ConfigurationError::UnknownType(request.parent_type.clone()))?;
    compile_root(
        schema,
        request,
        context,
        namespace,
        &request.parent_type,
        parent_type,
    )
}

/// How `get_node` finds its row.
pub enum NodeCondition {
    /// The unique key value, or one value per column of a composite unique key.
    Key(serde_json::Value),
    Where(metadata::WhereCondition),
}

/// Compile a request for the single row of `type_name` matching `condition`.
pub fn compile_node(
    schema: &metadata::Schema,
    type_name: &str,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    condition: NodeCondition,
    dialect: &dyn sql::dialect::Dialect,
    namespace: &mut AliasNamespace,
) -> Result<SqlAstNode, Error> {
    let definition = schema
        .lookup_type(type_name)
        .ok_or_else(|| ConfigurationError::UnknownType(type_name.to_string()))?;
    let table = definition
        .table
        .as_ref()
        .ok_or_else(|| ConfigurationError::NotATable(type_name.to_string()))?;

    let where_ = match condition {
        NodeCondition::Where(where_) => where_,
        NodeCondition::Key(value) => {
            unique_key_condition(type_name, &table.unique_key, &value, dialect)?
        }
    };

    let field_name = request
        .field_nodes
        .first()
        .map(|field| field.name.clone())
        .ok_or(RequestValidationError::NoFields)?;

    // a stand-in parent with a single field pointing at the requested row
    let parent_type = metadata::TypeDefinition {
        kind: metadata::TypeKind::Object,
        fields: BTreeMap::from([(
            field_name,
            metadata::FieldDefinition {
                r#type: metadata::TypeRef::Named(type_name.to_string()),
                config: metadata::FieldConfig {
                    where_: Some(where_),
                    ..metadata::FieldConfig::default()
                },
            },
        )]),
        interfaces: vec![],
        possible_types: vec![],
        table: None,
    };

    compile_root(
        schema,
        request,
        context,
        namespace,
        &request.parent_type,
        &parent_type,
    )
}

fn compile_root(
    schema: &metadata::Schema,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    namespace: &mut AliasNamespace,
    parent_type_name: &str,
    parent_type: &metadata::TypeDefinition,
) -> Result<SqlAstNode, Error> {
    let field = merge_field_nodes(&request.field_nodes)?;

    let mut compiler = Compiler {
        schema,
        fragments: &request.fragments,
        context,
        namespace: &mut *namespace,
    };
    let scope = selections::ParentScope {
        type_name: parent_type_name,
        type_definition: parent_type,
        junction: None,
    };
    let mut root = compiler.populate(&field, &scope, 0, None, None)?;

    match root.as_table_mut() {
        Some(table) => pruning::prune(table, namespace),
        None => {
            let type_name = parent_type
                .lookup_field(&field.name)
                .map_or_else(|| field.name.clone(), |f| f.r#type.named_type().to_string());
            return Err(ConfigurationError::NotATable(type_name).into());
        }
    }

    tracing::debug!(sql_ast = ?root, "SQL_AST");
    Ok(root)
}

/// Merge every occurrence of the requested field into one, concatenating their selections.
fn merge_field_nodes(field_nodes: &[metadata::Field]) -> Result<metadata::Field, Error> {
    let mut nodes = field_nodes.iter();
    let mut merged = nodes.next().cloned().ok_or(RequestValidationError::NoFields)?;
    for node in nodes {
        merged.selections.extend(node.selections.iter().cloned());
    }
    Ok(merged)
}

/// The table behind a unique key equal to `value`.
fn unique_key_condition(
    type_name: &str,
    unique_key: &metadata::UniqueKey,
    value: &serde_json::Value,
    dialect: &dyn sql::dialect::Dialect,
) -> Result<metadata::WhereCondition, Error> {
    let values: Vec<&serde_json::Value> = match (unique_key, value) {
        (metadata::SingleOrList::Single(_), value) => vec![value],
        (metadata::SingleOrList::List(keys), serde_json::Value::Array(values))
            if keys.len() == values.len() =>
        {
            values.iter().collect()
        }
        (metadata::SingleOrList::List(keys), other) => {
            return Err(ConfigurationError::CompositeKeyMismatch {
                type_name: type_name.to_string(),
                expected: keys.len(),
                found: other.as_array().map_or(1, Vec::len),
            }
            .into())
        }
    };

    let terms: Vec<(String, String)> = unique_key
        .iter()
        .zip(values)
        .map(|(column, value)| {
            (
                dialect.quote(column),
                sql::ast::Value::from_json(value).to_sql_string(dialect),
            )
        })
        .collect();

    Ok(metadata::WhereCondition::computed(move |table, _, _| {
        Some(
            terms
                .iter()
                .map(|(column, literal)| format!("{table}.{column} = {literal}"))
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }))
}

/// State shared while compiling one request.
pub(crate) struct Compiler<'a> {
    schema: &'a metadata::Schema,
    fragments: &'a BTreeMap<String, metadata::Fragment>,
    context: &'a metadata::Context,
    namespace: &'a mut AliasNamespace,
}
