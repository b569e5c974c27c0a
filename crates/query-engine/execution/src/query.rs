//! The whole pipeline: compile, run the root statement, shape its rows, then fetch the
//! tables behind batch boundaries.

use tracing::{info_span, Instrument};

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_translation::translation::aliases::AliasNamespace;
use query_engine_translation::translation::error::ConfigurationError;
use query_engine_translation::translation::query::{self as compiler, NodeCondition};
use query_engine_translation::translation::shape::{define_object_shape, ObjectShape};
use query_engine_translation::translation::sql_ast::{Relation, SqlAstNode, TableNode};
use query_engine_translation::translation::stringify;

use crate::batch;
use crate::connections::array_to_connection;
use crate::error::Error;
use crate::executor::{validate_rows, Executor};
use crate::hydration::{Hydrator, NestHydrator, Row};
use crate::unions::resolve_unions;

/// How statements are written and rows shaped.
#[derive(Clone, Copy)]
pub struct Options<'a> {
    pub dialect: &'a dyn Dialect,
    /// Use the shortest aliases possible.
    pub minify: bool,
    pub hydrator: &'a dyn Hydrator,
}

impl<'a> Options<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Options<'a> {
        Options {
            dialect,
            minify: false,
            hydrator: &NestHydrator,
        }
    }

    #[must_use]
    pub fn minified(self, minify: bool) -> Options<'a> {
        Options { minify, ..self }
    }
}

/// Fetch the data of the field a request selects.
pub async fn run(
    schema: &metadata::Schema,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    executor: &dyn Executor,
    options: &Options<'_>,
) -> Result<serde_json::Value, Error> {
    let root = info_span!("Compile query").in_scope(|| {
        let mut namespace = AliasNamespace::new(options.minify);
        compiler::compile(schema, request, context, &mut namespace).and_then(root_table)
    })?;

    let Some(data) = fetch(&root, context, executor, options).await? else {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    };

    // a row whose batched field found nothing does not belong in the list
    Ok(match data {
        serde_json::Value::Array(rows) => {
            let batched: Vec<&str> = root
                .children
                .iter()
                .filter_map(SqlAstNode::as_table)
                .filter(|child| matches!(child.relation, Some(Relation::Batch(_))))
                .map(|child| child.field_name.as_str())
                .collect();
            serde_json::Value::Array(
                rows.into_iter()
                    .filter(|row| {
                        batched
                            .iter()
                            .all(|field| row.get(*field).is_some_and(|value| !value.is_null()))
                    })
                    .collect(),
            )
        }
        other => other,
    })
}

/// Fetch the single object of `type_name` matching `condition`. The object gets a
/// `__typename` property naming its type.
pub async fn get_node(
    schema: &metadata::Schema,
    type_name: &str,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    condition: NodeCondition,
    executor: &dyn Executor,
    options: &Options<'_>,
) -> Result<serde_json::Value, Error> {
    let root = info_span!("Compile node query").in_scope(|| {
        let mut namespace = AliasNamespace::new(options.minify);
        compiler::compile_node(
            schema,
            type_name,
            request,
            context,
            condition,
            options.dialect,
            &mut namespace,
        )
        .and_then(root_table)
    })?;

    let data = fetch(&root, context, executor, options).await?;
    Ok(match data {
        Some(serde_json::Value::Object(mut object)) => {
            object.insert(
                "__typename".to_string(),
                serde_json::Value::String(type_name.to_string()),
            );
            serde_json::Value::Object(object)
        }
        Some(other) => other,
        None => serde_json::Value::Null,
    })
}

/// The pretty-printed statement a request starts with.
pub fn explain(
    schema: &metadata::Schema,
    request: &metadata::QueryRequest,
    context: &metadata::Context,
    options: &Options<'_>,
) -> Result<String, Error> {
    let mut namespace = AliasNamespace::new(options.minify);
    let root = root_table(compiler::compile(
        schema,
        request,
        context,
        &mut namespace,
    )?)?;
    let sql = stringify::to_sql(&root, context, options.dialect, None)?;
    Ok(sqlformat::format(
        &sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    ))
}

fn root_table(
    node: SqlAstNode,
) -> Result<TableNode, query_engine_translation::translation::error::Error> {
    match node {
        SqlAstNode::Table(table) | SqlAstNode::Union(table) => Ok(table),
        other => Err(ConfigurationError::NotATable(
            other.field_name().unwrap_or_default().to_string(),
        )
        .into()),
    }
}

/// Run the root statement and every batch after it. None when there is nothing to select.
async fn fetch(
    root: &TableNode,
    context: &metadata::Context,
    executor: &dyn Executor,
    options: &Options<'_>,
) -> Result<Option<serde_json::Value>, Error> {
    let sql = stringify::to_sql(root, context, options.dialect, None)?;
    if sql.is_empty() {
        return Ok(None);
    }
    tracing::debug!(sql = %sql, "SQL");

    let shape = define_object_shape(root);
    log_shape(&shape);

    let rows = execute(executor, &sql).await?;
    let mut data = async {
        let mut data = options.hydrator.nest(&rows, &shape);
        resolve_unions(&mut data, root);
        tracing::debug!(data = %data, "SHAPED_DATA");
        array_to_connection(data, root)
    }
    .instrument(info_span!("Shape rows"))
    .await?;

    batch::next_batch(root, &mut data, context, executor, options)
        .instrument(info_span!("Fetch batches"))
        .await?;

    Ok(Some(data))
}

/// Run one statement and check its rows.
pub(crate) async fn execute(executor: &dyn Executor, sql: &str) -> Result<Vec<Row>, Error> {
    let result = executor
        .execute(sql)
        .instrument(info_span!("Execute statement"))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "The executor failed");
            Error::External(err)
        })?;
    let rows = validate_rows(result)?;
    tracing::debug!(
        rows = ?&rows[..rows.len().min(8)],
        count = rows.len(),
        "RAW_DATA"
    );
    Ok(rows)
}

pub(crate) fn log_shape(shape: &ObjectShape) {
    tracing::debug!(
        shape = %serde_json::to_value(shape).unwrap_or_default(),
        "SHAPE_DEFINITION"
    );
}
