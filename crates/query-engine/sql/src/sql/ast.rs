//! Type definitions of a SQL AST representation.

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: Option<From>,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    SelectList(Vec<(ColumnAlias, Expression)>),
    SelectStarFrom(TableAlias),
    SelectListComposite(Box<SelectList>, Box<SelectList>),
}

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a table reference
    Table {
        reference: TableReference,
        alias: TableAlias,
    },
    /// Select from a subquery
    Select {
        select: Box<Select>,
        alias: TableAlias,
    },
    /// A single column relation of literal rows: `(VALUES (1), (2)) AS "temp"("id")`
    Values {
        rows: Vec<Value>,
        alias: TableAlias,
        column: ColumnName,
    },
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// LEFT JOIN of a table
    LeftOuterJoin(LeftOuterJoin),
    /// LEFT JOIN LATERAL of a subquery
    LeftOuterJoinLateral(LateralJoin),
    /// JOIN LATERAL of a subquery
    InnerJoinLateral(LateralJoin),
}

/// A LEFT OUTER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct LeftOuterJoin {
    pub reference: TableReference,
    pub alias: TableAlias,
    pub on: Expression,
}

/// A lateral join of a subquery correlated to the tables before it
#[derive(Debug, Clone, PartialEq)]
pub struct LateralJoin {
    pub select: Box<Select>,
    pub alias: TableAlias,
    pub on: Expression,
}

/// Either side of the clauses following SELECT's list: a FROM or a JOIN.
#[derive(Debug, Clone, PartialEq)]
pub enum TableClause {
    From(From),
    Join(Join),
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

impl OrderByDirection {
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            OrderByDirection::Asc => OrderByDirection::Desc,
            OrderByDirection::Desc => OrderByDirection::Asc,
        }
    }
}

/// LIMIT and OFFSET clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<LimitValue>,
    pub offset: Option<u64>,
}

/// The row count of a LIMIT clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitValue {
    Count(u64),
    /// The dialect's way of saying "no limit", needed when an OFFSET follows.
    Unlimited,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// OR clause
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A binary operation on a scalar expression and an array of scalar expressions
    BinaryArrayOperation {
        left: Box<Expression>,
        operator: BinaryArrayOperator,
        right: Vec<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnReference),
    /// The columns of a composite key, concatenated the way the dialect does it
    CompositeKey {
        table: TableAlias,
        columns: Vec<ColumnName>,
    },
    /// `count(*) OVER ()`: the number of rows in the result, on every row
    WindowCount,
    /// An irreducible value
    Value(Value),
    /// SQL produced by a user-supplied builder, opaque to us
    RawSql(String),
}

/// Represents the name of a binary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    GreaterThan,
    LessThan,
}

/// A binary operator when the rhs is an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryArrayOperator {
    In,
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Arrays and objects, written as their JSON text
    Json(serde_json::Value),
}

impl Value {
    /// Convert a JSON value to a SQL literal.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }
}

/// A reference to a table, for example in a FROM clause: a table name or any
/// parenthesized relation, written verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableReference(pub String);

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub table: TableAlias,
    pub name: ColumnName,
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
