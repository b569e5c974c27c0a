//! Keyset and offset pagination: the ordering, limit, offset and seek predicate of a page.

use query_engine_sql::sql::ast::{
    BinaryOperator, Expression, LimitValue, OrderBy, OrderByDirection, OrderByElement, TableAlias,
    Value,
};
use query_engine_sql::sql::helpers;

use crate::translation::cursor;
use crate::translation::error::RequestValidationError;
use crate::translation::query::sorting::directed;
use crate::translation::sql_ast::{Ordering, TableNode};

/// The connection arguments of a paginated (or limited) field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageArguments {
    pub first: Option<u64>,
    pub last: Option<u64>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl PageArguments {
    /// A `limit` on a field that is not paginated acts as `first`.
    pub fn of(node: &TableNode) -> Result<PageArguments, RequestValidationError> {
        let first = if node.paginate {
            count_argument(&node.args, "first")?
        } else {
            node.limit
        };
        Ok(PageArguments {
            first,
            last: count_argument(&node.args, "last")?,
            after: cursor_argument(&node.args, "after")?,
            before: cursor_argument(&node.args, "before")?,
        })
    }
}

fn count_argument(
    args: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<Option<u64>, RequestValidationError> {
    let invalid = |value: &serde_json::Value| RequestValidationError::InvalidPageSize {
        argument: name.to_string(),
        value: value.to_string(),
    };
    match args.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(number)) => {
            number.as_u64().map(Some).ok_or_else(|| invalid(&args[name]))
        }
        Some(serde_json::Value::String(string)) => string
            .parse()
            .map(Some)
            .map_err(|_| invalid(&args[name])),
        Some(other) => Err(invalid(other)),
    }
}

fn cursor_argument(
    args: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<Option<String>, RequestValidationError> {
    match args.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(cursor)) => Ok(Some(cursor.clone())),
        Some(other) => Err(RequestValidationError::MalformedCursor(other.to_string())),
    }
}

/// Everything needed to select one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageParameters {
    pub order_by: OrderBy,
    pub limit: LimitValue,
    /// Only offset pagination has one.
    pub offset: Option<u64>,
    /// Keyset pagination past a cursor.
    pub seek: Option<Expression>,
}

/// Page through a sort key. One row more than requested is fetched to tell whether
/// another page follows.
pub fn interpret_keyset(
    arguments: &PageArguments,
    sort_key: &[Ordering],
    table: &TableAlias,
) -> Result<PageParameters, RequestValidationError> {
    let orderings = directed(sort_key, arguments.last.is_some());
    let columns: Vec<&str> = orderings.iter().map(|o| o.column.as_str()).collect();

    let mut limit = LimitValue::Unlimited;
    let mut seek = None;
    if let Some(first) = arguments.first {
        limit = LimitValue::Count(one_more("first", first)?);
        if let Some(after) = &arguments.after {
            let values = cursor::decode_sort_key(after, &columns)?;
            seek = Some(seek_predicate(&values, &orderings, table));
        }
        if arguments.before.is_some() {
            return Err(RequestValidationError::BeforeWithFirst);
        }
    } else if let Some(last) = arguments.last {
        limit = LimitValue::Count(one_more("last", last)?);
        if let Some(before) = &arguments.before {
            let values = cursor::decode_sort_key(before, &columns)?;
            seek = Some(seek_predicate(&values, &orderings, table));
        }
        if arguments.after.is_some() {
            return Err(RequestValidationError::AfterWithLast);
        }
    }

    Ok(PageParameters {
        order_by: order_by(&orderings, table),
        limit,
        offset: None,
        seek,
    })
}

/// The page size plus the row telling whether another page follows.
fn one_more(argument: &str, count: u64) -> Result<u64, RequestValidationError> {
    count
        .checked_add(1)
        .ok_or_else(|| RequestValidationError::InvalidPageSize {
            argument: argument.to_string(),
            value: count.to_string(),
        })
}

/// Page through an ordering by row number. Cursors are offsets.
pub fn interpret_offset(
    arguments: &PageArguments,
    order_by_columns: &[Ordering],
    table: &TableAlias,
    probe_next_page: bool,
) -> Result<PageParameters, RequestValidationError> {
    if arguments.last.is_some() {
        return Err(RequestValidationError::BackwardOffsetPagination);
    }

    let limit = match arguments.first {
        Some(first) if probe_next_page => LimitValue::Count(one_more("first", first)?),
        Some(first) => LimitValue::Count(first),
        None => LimitValue::Unlimited,
    };
    let offset = match &arguments.after {
        Some(after) => cursor::decode_offset(after)?
            .checked_add(1)
            .ok_or_else(|| RequestValidationError::MalformedCursor(after.clone()))?,
        None => 0,
    };

    Ok(PageParameters {
        order_by: order_by(order_by_columns, table),
        limit,
        offset: Some(offset),
        seek: None,
    })
}

pub fn order_by(orderings: &[Ordering], table: &TableAlias) -> OrderBy {
    OrderBy {
        elements: orderings
            .iter()
            .map(|ordering| OrderByElement {
                target: helpers::column_expr(table, &ordering.column),
                direction: ordering.direction,
            })
            .collect(),
    }
}

/// The rows strictly past the cursor `values` in the order of `orderings`:
/// `a > 1 OR (a = 1 AND (b > 2 OR (b = 2 AND c > 3)))`.
pub fn seek_predicate(
    values: &serde_json::Map<String, serde_json::Value>,
    orderings: &[Ordering],
    table: &TableAlias,
) -> Expression {
    let compare = |ordering: &Ordering, operator: BinaryOperator| Expression::BinaryOperation {
        left: Box::new(helpers::column_expr(table, &ordering.column)),
        operator,
        right: Box::new(Expression::Value(Value::from_json(
            values.get(&ordering.column).unwrap_or(&serde_json::Value::Null),
        ))),
    };
    let past = |ordering: &Ordering| match ordering.direction {
        OrderByDirection::Desc => BinaryOperator::LessThan,
        OrderByDirection::Asc => BinaryOperator::GreaterThan,
    };

    let Some((last, rest)) = orderings.split_last() else {
        return helpers::true_expr();
    };
    rest.iter()
        .rev()
        .fold(compare(last, past(last)), |inner, ordering| Expression::Or {
            left: Box::new(compare(ordering, past(ordering))),
            right: Box::new(Expression::And {
                left: Box::new(compare(ordering, BinaryOperator::Equals)),
                right: Box::new(inner),
            }),
        })
}
