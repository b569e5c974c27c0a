//! Render the SQL AST into one SQL statement, stopping at tables fetched in batches.

pub mod pagination;

use std::collections::HashSet;

use query_engine_metadata::metadata;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::{
    BinaryArrayOperator, ColumnAlias, ColumnName, Expression, From, Join, LeftOuterJoin,
    OrderByElement, TableAlias, TableClause, TableReference, Value,
};
use query_engine_sql::sql::dialect::{BatchValues, Dialect, PageSelect};
use query_engine_sql::sql::helpers;

use super::error::{ConfigurationError, Error};
use super::query::sorting::directed;
use super::sql_ast::{ColumnNode, JunctionFetch, Ordering, Relation, SqlAstNode, TableNode};
use pagination::{interpret_keyset, interpret_offset, PageArguments};

/// Build the statement fetching `root` and everything joined to it.
///
/// `batch_scope` holds the parent key values when `root` is a table fetched in batches.
/// Returns None when there is nothing to select.
pub fn stringify(
    root: &TableNode,
    context: &metadata::Context,
    dialect: &dyn Dialect,
    batch_scope: Option<&[Value]>,
) -> Result<Option<sql::ast::Select>, Error> {
    if let Some(Relation::DirectJoin(_)) = root.relation {
        return Err(ConfigurationError::RootJoin(root.field_name.clone()).into());
    }

    let mut stringifier = Stringifier {
        context,
        dialect,
        batch_scope: batch_scope.unwrap_or_default(),
        selections: vec![],
        tables: vec![],
        wheres: vec![],
        orders: vec![],
    };
    stringifier.table(None, root, &[])?;
    stringifier.assemble(root)
}

/// Render the statement fetching `root`; an empty string when there is nothing to select.
pub fn to_sql(
    root: &TableNode,
    context: &metadata::Context,
    dialect: &dyn Dialect,
    batch_scope: Option<&[Value]>,
) -> Result<String, Error> {
    Ok(stringify(root, context, dialect, batch_scope)?
        .map(|select| select.to_sql_string(dialect))
        .unwrap_or_default())
}

/// The path prefix of the column aliases of a table's children. The root table of a
/// statement contributes nothing.
pub fn join_prefix(prefix: &[&str]) -> String {
    prefix
        .iter()
        .skip(1)
        .map(|alias| format!("{alias}__"))
        .collect()
}

struct Stringifier<'s> {
    context: &'s metadata::Context,
    dialect: &'s dyn Dialect,
    batch_scope: &'s [Value],
    selections: Vec<(ColumnAlias, Expression)>,
    tables: Vec<TableClause>,
    wheres: Vec<Expression>,
    orders: Vec<OrderByElement>,
}

impl Stringifier<'_> {
    fn quote(&self, identifier: &str) -> String {
        self.dialect.quote(identifier)
    }

    fn node(&mut self, parent: &TableNode, node: &SqlAstNode, prefix: &[&str]) -> Result<(), Error> {
        let parent_table = |from_other_table: &Option<String>| {
            helpers::make_table_alias(
                from_other_table
                    .clone()
                    .unwrap_or_else(|| parent.alias.clone()),
            )
        };
        let column_alias =
            |alias: &str| helpers::make_column_alias(format!("{}{alias}", join_prefix(prefix)));

        match node {
            SqlAstNode::Table(table) | SqlAstNode::Union(table) => {
                self.table(Some(parent), table, prefix)?;
            }
            SqlAstNode::Column(column) => {
                self.selections.push(helpers::make_column(
                    &parent_table(&column.from_other_table),
                    &column.name,
                    column_alias(&column.alias),
                ));
            }
            SqlAstNode::ColumnDeps(deps) => {
                let table = parent_table(&deps.from_other_table);
                for (name, alias) in &deps.columns {
                    self.selections
                        .push(helpers::make_column(&table, name, column_alias(alias)));
                }
            }
            SqlAstNode::Composite(composite) => {
                self.selections.push((
                    column_alias(&composite.alias),
                    Expression::CompositeKey {
                        table: parent_table(&composite.from_other_table),
                        columns: composite
                            .names
                            .iter()
                            .map(|name| ColumnName(name.clone()))
                            .collect(),
                    },
                ));
            }
            SqlAstNode::Expression(expression) => {
                let table = self.quote(&parent_table(&expression.from_other_table).name);
                let sql = expression
                    .sql_expr
                    .build(&table, &expression.args, self.context);
                self.selections
                    .push((column_alias(&expression.alias), Expression::RawSql(sql)));
            }
            SqlAstNode::Noop => {}
        }
        Ok(())
    }

    /// Add the clauses of a table, then its children unless they belong to a later statement.
    fn table(
        &mut self,
        parent: Option<&TableNode>,
        node: &TableNode,
        prefix: &[&str],
    ) -> Result<(), Error> {
        self.table_clauses(parent, node, prefix)?;

        if !node.is_batch_boundary() || parent.is_none() {
            let mut child_prefix = prefix.to_vec();
            child_prefix.push(&node.alias);
            for children in node.typed_children.values() {
                for child in children {
                    self.node(node, child, &child_prefix)?;
                }
            }
            for child in &node.children {
                self.node(node, child, &child_prefix)?;
            }
        }
        Ok(())
    }

    fn table_clauses(
        &mut self,
        parent: Option<&TableNode>,
        node: &TableNode,
        prefix: &[&str],
    ) -> Result<(), Error> {
        let node_alias = helpers::make_table_alias(node.alias.clone());
        let fetched_here = !node.is_batch_boundary() || parent.is_none();
        let junction = node.junction();

        if !node.paginate && fetched_here {
            if let Some(junction) = junction {
                self.push_where(&junction.where_, &junction.alias, &node.args);
            }
            self.push_where(&node.where_, &node.alias, &node.args);
        }

        if fetched_here {
            let backwards = node.args.get("last").is_some_and(|last| !last.is_null());
            if let Some(junction) = junction {
                if let Some(order_by) = &junction.order_by {
                    self.push_orders(order_by, &junction.alias);
                }
            }
            if let Some(order_by) = &node.order_by {
                self.push_orders(order_by, &node.alias);
            }
            if let Some(junction) = junction {
                if let Some(sort_key) = &junction.sort_key {
                    self.push_orders(&directed(sort_key, backwards), &junction.alias);
                }
            }
            if let Some(sort_key) = &node.sort_key {
                self.push_orders(&directed(sort_key, backwards), &node.alias);
            }
        }

        let paged = node.paginate || node.limit.is_some();
        let quoted_node = self.quote(&node.alias);

        match &node.relation {
            Some(Relation::DirectJoin(sql_join)) => {
                let parent =
                    parent.ok_or_else(|| ConfigurationError::RootJoin(node.field_name.clone()))?;
                let join_condition = sql_join.build(
                    &self.quote(&parent.alias),
                    &quoted_node,
                    &node.args,
                    self.context,
                );
                if paged {
                    let mut predicates = vec![Expression::RawSql(join_condition.clone())];
                    predicates.extend(self.build_where(&node.where_, &node.alias, &node.args));
                    let page = self.page(node, &node.name, &node.alias, predicates, None)?;
                    let clauses = self
                        .dialect
                        .joined_one_to_many(page, Expression::RawSql(join_condition))?;
                    self.tables.extend(clauses);
                } else {
                    self.tables.push(TableClause::Join(Join::LeftOuterJoin(LeftOuterJoin {
                        reference: TableReference(node.name.clone()),
                        alias: node_alias,
                        on: Expression::RawSql(join_condition),
                    })));
                }
            }

            Some(Relation::Junction(junction)) => match &junction.fetch {
                JunctionFetch::Batch {
                    sql_join,
                    this_key,
                    parent_key,
                } => {
                    if let Some(parent) = parent {
                        self.push_parent_key(parent, parent_key, prefix);
                    } else {
                        let join_condition = sql_join.build(
                            &self.quote(&junction.alias),
                            &quoted_node,
                            &node.args,
                            self.context,
                        );
                        let target = LeftOuterJoin {
                            reference: TableReference(node.name.clone()),
                            alias: node_alias,
                            on: Expression::RawSql(join_condition),
                        };
                        if paged {
                            let mut predicates = vec![];
                            predicates.extend(self.build_where(
                                &junction.where_,
                                &junction.alias,
                                &node.args,
                            ));
                            predicates.extend(self.build_where(&node.where_, &node.alias, &node.args));
                            let extra_join = needs_target_inside(node).then(|| target.clone());
                            let page = self.page(
                                node,
                                &junction.sql_table,
                                &junction.alias,
                                predicates,
                                extra_join,
                            )?;
                            let clauses = self.dialect.batched_many_to_many(
                                page,
                                BatchValues {
                                    values: self.batch_scope.to_vec(),
                                    parent_key: ColumnName(parent_key.name.clone()),
                                    this_key: ColumnName(this_key.name.clone()),
                                },
                            )?;
                            self.tables.extend(clauses);
                        } else {
                            self.tables.push(TableClause::From(From::Table {
                                reference: TableReference(junction.sql_table.clone()),
                                alias: helpers::make_table_alias(junction.alias.clone()),
                            }));
                            let in_scope = self.in_batch_scope(&junction.alias, &this_key.name);
                            self.wheres.push(in_scope);
                        }
                        self.tables.push(TableClause::Join(Join::LeftOuterJoin(target)));
                    }
                }
                JunctionFetch::Joins([to_junction, to_target]) => {
                    let parent =
                        parent.ok_or_else(|| ConfigurationError::RootJoin(node.field_name.clone()))?;
                    let quoted_junction = self.quote(&junction.alias);
                    let junction_condition = to_junction.build(
                        &self.quote(&parent.alias),
                        &quoted_junction,
                        &node.args,
                        self.context,
                    );
                    let target_condition =
                        to_target.build(&quoted_junction, &quoted_node, &node.args, self.context);
                    let target = LeftOuterJoin {
                        reference: TableReference(node.name.clone()),
                        alias: node_alias,
                        on: Expression::RawSql(target_condition),
                    };
                    if paged {
                        let mut predicates = vec![Expression::RawSql(junction_condition.clone())];
                        predicates.extend(self.build_where(
                            &junction.where_,
                            &junction.alias,
                            &node.args,
                        ));
                        predicates.extend(self.build_where(&node.where_, &node.alias, &node.args));
                        let extra_join = needs_target_inside(node).then(|| target.clone());
                        let page = self.page(
                            node,
                            &junction.sql_table,
                            &junction.alias,
                            predicates,
                            extra_join,
                        )?;
                        let clauses = self
                            .dialect
                            .joined_many_to_many(page, Expression::RawSql(junction_condition))?;
                        self.tables.extend(clauses);
                    } else {
                        self.tables.push(TableClause::Join(Join::LeftOuterJoin(LeftOuterJoin {
                            reference: TableReference(junction.sql_table.clone()),
                            alias: helpers::make_table_alias(junction.alias.clone()),
                            on: Expression::RawSql(junction_condition),
                        })));
                    }
                    self.tables.push(TableClause::Join(Join::LeftOuterJoin(target)));
                }
            },

            Some(Relation::Batch(keys)) => {
                if let Some(parent) = parent {
                    self.push_parent_key(parent, &keys.parent_key, prefix);
                } else if paged {
                    let predicates: Vec<Expression> =
                        self.build_where(&node.where_, &node.alias, &node.args).into_iter().collect();
                    let page = self.page(node, &node.name, &node.alias, predicates, None)?;
                    let clauses = self.dialect.batched_one_to_many(
                        page,
                        BatchValues {
                            values: self.batch_scope.to_vec(),
                            parent_key: ColumnName(keys.parent_key.name.clone()),
                            this_key: ColumnName(keys.this_key.name.clone()),
                        },
                    )?;
                    self.tables.extend(clauses);
                } else {
                    self.tables.push(TableClause::From(From::Table {
                        reference: TableReference(node.name.clone()),
                        alias: node_alias,
                    }));
                    let in_scope = self.in_batch_scope(&node.alias, &keys.this_key.name);
                    self.wheres.push(in_scope);
                }
            }

            None => {
                if paged {
                    let predicates: Vec<Expression> =
                        self.build_where(&node.where_, &node.alias, &node.args).into_iter().collect();
                    let page = self.page(node, &node.name, &node.alias, predicates, None)?;
                    let clauses = self.dialect.paginate_at_root(page)?;
                    self.tables.extend(clauses);
                } else {
                    self.tables.push(TableClause::From(From::Table {
                        reference: TableReference(node.name.clone()),
                        alias: node_alias,
                    }));
                }
            }
        }
        Ok(())
    }

    /// One page of `node`, selected from `table` (the node's own table or its junction).
    fn page(
        &self,
        node: &TableNode,
        table: &str,
        alias: &str,
        mut predicates: Vec<Expression>,
        extra_join: Option<LeftOuterJoin>,
    ) -> Result<PageSelect, Error> {
        let arguments = PageArguments::of(node)?;
        let junction_alias = || {
            helpers::make_table_alias(
                node.junction()
                    .map_or_else(|| node.alias.clone(), |junction| junction.alias.clone()),
            )
        };
        let owner = |own: bool| {
            if own {
                helpers::make_table_alias(node.alias.clone())
            } else {
                junction_alias()
            }
        };

        let parameters = if let Some(sort_key) = node.effective_sort_key() {
            interpret_keyset(&arguments, sort_key, &owner(node.sort_key.is_some()))?
        } else if let Some(order_by) = node.effective_order_by() {
            interpret_offset(
                &arguments,
                order_by,
                &owner(node.order_by.is_some()),
                node.paginate,
            )?
        } else {
            return Err(ConfigurationError::MissingSortKey(node.field_name.clone()).into());
        };
        predicates.extend(parameters.seek);

        Ok(PageSelect {
            table: TableReference(table.to_string()),
            alias: helpers::make_table_alias(alias.to_string()),
            extra_join,
            predicates,
            order_by: parameters.order_by,
            limit: parameters.limit,
            offset: parameters.offset,
        })
    }

    fn build_where(
        &self,
        where_: &Option<metadata::WhereCondition>,
        alias: &str,
        args: &metadata::Arguments,
    ) -> Option<Expression> {
        where_
            .as_ref()
            .and_then(|where_| where_.build(&self.quote(alias), args, self.context))
            .map(Expression::RawSql)
    }

    fn push_where(
        &mut self,
        where_: &Option<metadata::WhereCondition>,
        alias: &str,
        args: &metadata::Arguments,
    ) {
        if let Some(condition) = self.build_where(where_, alias, args) {
            self.wheres.push(condition);
        }
    }

    fn push_orders(&mut self, orderings: &[Ordering], alias: &str) {
        let table = helpers::make_table_alias(alias.to_string());
        self.orders
            .extend(pagination::order_by(orderings, &table).elements);
    }

    /// A table fetched later only needs its parent's key, to be matched against.
    fn push_parent_key(&mut self, parent: &TableNode, parent_key: &ColumnNode, prefix: &[&str]) {
        self.selections.push(helpers::make_column(
            &helpers::make_table_alias(parent.alias.clone()),
            &parent_key.name,
            helpers::make_column_alias(format!("{}{}", join_prefix(prefix), parent_key.alias)),
        ));
    }

    fn in_batch_scope(&self, alias: &str, column: &str) -> Expression {
        Expression::BinaryArrayOperation {
            left: Box::new(helpers::column_expr(
                &TableAlias {
                    name: alias.to_string(),
                },
                column,
            )),
            operator: BinaryArrayOperator::In,
            right: self
                .batch_scope
                .iter()
                .cloned()
                .map(Expression::Value)
                .collect(),
        }
    }

    fn assemble(self, root: &TableNode) -> Result<Option<sql::ast::Select>, Error> {
        let mut seen = HashSet::new();
        let selections: Vec<(ColumnAlias, Expression)> = self
            .selections
            .into_iter()
            .filter(|(alias, expression)| {
                seen.insert(sql::convert::select_item_to_string(
                    self.dialect,
                    alias,
                    expression,
                ))
            })
            .collect();
        if selections.is_empty() {
            return Ok(None);
        }

        let mut select = helpers::simple_select(selections);
        if !helpers::place_table_clauses(&mut select, self.tables) {
            return Err(ConfigurationError::SecondFromClause(root.field_name.clone()).into());
        }
        select.where_ = sql::ast::Where(helpers::conjunction(self.wheres));
        select.order_by = sql::ast::OrderBy {
            elements: self.orders,
        };
        Ok(Some(select))
    }
}

/// Whether the target of a paginated many-to-many relation has to be joined inside the
/// page, for its columns to filter or order the junction rows.
fn needs_target_inside(node: &TableNode) -> bool {
    node.where_.is_some() || node.order_by.is_some() || node.sort_key.is_some()
}
