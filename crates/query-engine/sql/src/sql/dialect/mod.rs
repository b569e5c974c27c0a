//! SQL dialects: identifier quoting, literal quoting and the forms paginated relations take.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use std::fmt;

use super::ast::*;
use super::helpers;
use super::string::ansi_string_literal;

/// The column carrying the total row count of an offset paginated relation.
pub const TOTAL_COLUMN: &str = "$total";

/// The alias of the literal relation holding a batch's parent keys.
pub const BATCH_VALUES_ALIAS: &str = "temp";

/// Errors raised by a dialect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("the {dialect} dialect does not support {form} pagination")]
    PaginationNotSupported {
        dialect: &'static str,
        form: &'static str,
    },
}

/// One page of a relation: everything needed to select it, before deciding
/// where in the statement it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSelect {
    pub table: TableReference,
    pub alias: TableAlias,
    /// Another table joined inside the page, so its columns can filter or order it.
    pub extra_join: Option<LeftOuterJoin>,
    pub predicates: Vec<Expression>,
    pub order_by: OrderBy,
    pub limit: LimitValue,
    /// Offset paging; the page then also carries the total row count.
    pub offset: Option<u64>,
}

impl PageSelect {
    /// `SELECT "alias".* [, count(*) OVER () AS "$total"] FROM table AS "alias" ...`
    pub fn into_select(self) -> Select {
        let star = SelectList::SelectStarFrom(self.alias.clone());
        let select_list = match self.offset {
            None => star,
            Some(_) => SelectList::SelectListComposite(
                Box::new(star),
                Box::new(SelectList::SelectList(vec![(
                    helpers::make_column_alias(TOTAL_COLUMN.to_string()),
                    Expression::WindowCount,
                )])),
            ),
        };
        Select {
            select_list,
            from: Some(From::Table {
                reference: self.table,
                alias: self.alias,
            }),
            joins: self.extra_join.map(Join::LeftOuterJoin).into_iter().collect(),
            where_: Where(helpers::conjunction(self.predicates)),
            order_by: self.order_by,
            limit: Limit {
                limit: Some(self.limit),
                offset: self.offset,
            },
        }
    }
}

/// The parent keys a batched relation is fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValues {
    pub values: Vec<Value>,
    /// The parent's key column, naming the literal relation's only column.
    pub parent_key: ColumnName,
    /// The key column of the paged table matched against the parent keys.
    pub this_key: ColumnName,
}

/// A SQL dialect.
///
/// The pagination hooks receive one page of a relation and return the FROM and JOIN
/// clauses realizing it. The provided implementations use lateral joins.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote(&self, identifier: &str) -> String;

    fn quote_string(&self, value: &str) -> String {
        ansi_string_literal(value)
    }

    /// Combine the qualified columns of a composite key into one value.
    fn composite_key(&self, columns: &[String]) -> String;

    /// The LIMIT value meaning "no limit".
    fn unlimited(&self) -> &'static str;

    /// Written before each row of a VALUES list.
    fn values_row_prefix(&self) -> &'static str {
        ""
    }

    /// A paginated relation at the top of the statement.
    fn paginate_at_root(&self, page: PageSelect) -> Result<Vec<TableClause>, Error> {
        let alias = page.alias.clone();
        Ok(vec![TableClause::From(From::Select {
            select: Box::new(page.into_select()),
            alias,
        })])
    }

    /// A paginated relation joined to its parent.
    fn joined_one_to_many(
        &self,
        page: PageSelect,
        join_condition: Expression,
    ) -> Result<Vec<TableClause>, Error> {
        Ok(vec![lateral_join(page, join_condition, true)])
    }

    /// The junction table of a paginated many-to-many relation, joined to the parent.
    fn joined_many_to_many(
        &self,
        page: PageSelect,
        join_condition: Expression,
    ) -> Result<Vec<TableClause>, Error> {
        Ok(vec![lateral_join(page, join_condition, true)])
    }

    /// A paginated relation fetched for a batch of parent keys.
    fn batched_one_to_many(
        &self,
        page: PageSelect,
        batch: BatchValues,
    ) -> Result<Vec<TableClause>, Error> {
        Ok(batched_lateral_join(page, batch, false))
    }

    /// The junction table of a paginated many-to-many relation, fetched for a batch of parent keys.
    fn batched_many_to_many(
        &self,
        page: PageSelect,
        batch: BatchValues,
    ) -> Result<Vec<TableClause>, Error> {
        Ok(batched_lateral_join(page, batch, true))
    }
}

fn lateral_join(page: PageSelect, on: Expression, left: bool) -> TableClause {
    let join = LateralJoin {
        alias: page.alias.clone(),
        select: Box::new(page.into_select()),
        on,
    };
    TableClause::Join(if left {
        Join::LeftOuterJoinLateral(join)
    } else {
        Join::InnerJoinLateral(join)
    })
}

/// `FROM (VALUES ...) AS "temp"("parent_key") JOIN LATERAL (page) ON page.this_key = temp.parent_key`
///
/// The page is correlated to the parent key too, so each parent key gets its own page.
fn batched_lateral_join(mut page: PageSelect, batch: BatchValues, left: bool) -> Vec<TableClause> {
    let values_alias = helpers::make_table_alias(BATCH_VALUES_ALIAS.to_string());
    let on = helpers::equals(
        helpers::column_expr(&page.alias, &batch.this_key.0),
        helpers::column_expr(&values_alias, &batch.parent_key.0),
    );
    page.predicates.insert(0, on.clone());
    vec![
        TableClause::From(From::Values {
            rows: batch.values,
            alias: values_alias,
            column: batch.parent_key,
        }),
        lateral_join(page, on, left),
    ]
}

/// Wrap an identifier in `quote`, doubling the quote character inside it.
pub fn quote_with(identifier: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!(
        "{quote}{}{quote}",
        identifier.replace(quote, &doubled)
    )
}
