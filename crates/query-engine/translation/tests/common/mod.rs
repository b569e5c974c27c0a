use query_engine_metadata::metadata;
use query_engine_sql::sql;
use query_engine_translation::translation::aliases::AliasNamespace;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::query;
use query_engine_translation::translation::sql_ast::TableNode;
use query_engine_translation::translation::stringify;

/// Compile a request against the blog schema.
pub fn compile(request: &metadata::QueryRequest, minify: bool) -> Result<TableNode, Error> {
    compile_with(&tests_common::fixtures::blog_schema(), request, minify)
}

pub fn compile_with(
    schema: &metadata::Schema,
    request: &metadata::QueryRequest,
    minify: bool,
) -> Result<TableNode, Error> {
    tests_common::logging::init();
    let mut namespace = AliasNamespace::new(minify);
    let root = query::compile(schema, request, &serde_json::Value::Null, &mut namespace)?;
    Ok(root.into_table().expect("the root compiles to a table"))
}

/// The PostgreSQL statement fetching `root`, for the given batch of parent keys.
pub fn render(root: &TableNode, batch_scope: Option<&[serde_json::Value]>) -> Result<String, Error> {
    let scope: Option<Vec<sql::ast::Value>> =
        batch_scope.map(|values| values.iter().map(sql::ast::Value::from_json).collect());
    stringify::to_sql(
        root,
        &serde_json::Value::Null,
        &sql::dialect::Postgres,
        scope.as_deref(),
    )
}

/// Compile and render a request for the blog schema in plain mode.
pub fn translate(request: &metadata::QueryRequest) -> Result<String, Error> {
    render(&compile(request, false)?, None)
}

/// Every table alias of the tree, junction aliases included.
pub fn table_aliases(node: &TableNode) -> Vec<String> {
    let mut aliases = vec![node.alias.clone()];
    if let Some(junction) = node.junction() {
        aliases.push(junction.alias.clone());
    }
    for child in node.table_children() {
        aliases.extend(table_aliases(child));
    }
    aliases
}
