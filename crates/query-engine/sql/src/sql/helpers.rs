//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    true_expr()
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// AND together a list of predicates. An empty list is `true`.
pub fn conjunction(predicates: Vec<Expression>) -> Expression {
    predicates
        .into_iter()
        .filter(|predicate| *predicate != true_expr())
        .reduce(|left, right| Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        })
        .unwrap_or_else(true_expr)
}

// Aliasing //

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: String) -> TableAlias {
    TableAlias { name }
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// A column of an aliased table.
pub fn column_expr(table: &TableAlias, name: &str) -> Expression {
    Expression::ColumnReference(ColumnReference {
        table: table.clone(),
        name: ColumnName(name.to_string()),
    })
}

/// Generate a column expression refering to a specific table.
pub fn make_column(table: &TableAlias, name: &str, alias: ColumnAlias) -> (ColumnAlias, Expression) {
    (alias, column_expr(table, name))
}

/// `left = right`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        select_list: SelectList::SelectList(select_list),
        from: None,
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a `SELECT "alias".*` from a single table.
pub fn star_select(from: From) -> Select {
    let alias = match &from {
        From::Table { alias, .. } | From::Select { alias, .. } | From::Values { alias, .. } => {
            alias.clone()
        }
    };
    Select {
        select_list: SelectList::SelectStarFrom(alias),
        from: Some(from),
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Put FROM and JOIN clauses in place, in order. Returns false when a second FROM
/// clause shows up.
pub fn place_table_clauses(select: &mut Select, clauses: Vec<TableClause>) -> bool {
    for clause in clauses {
        match clause {
            TableClause::From(from) => {
                if select.from.is_some() {
                    return false;
                }
                select.from = Some(from);
            }
            TableClause::Join(join) => select.joins.push(join),
        }
    }
    true
}
