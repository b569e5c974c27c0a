//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::dialect::Dialect;
use super::helpers;
use super::string::SQL;

// Convert to SQL strings

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" ");
            from.to_sql(sql);
        }

        for join in &self.joins {
            sql.append_syntax(" ");
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }

    /// Render the statement for a dialect.
    pub fn to_sql_string(&self, dialect: &dyn Dialect) -> String {
        let mut sql = SQL::new(dialect);
        self.to_sql(&mut sql);
        sql.sql
    }
}

/// Render one `expression AS "alias"` item of a select list.
pub fn select_item_to_string(
    dialect: &dyn Dialect,
    alias: &ColumnAlias,
    expression: &Expression,
) -> String {
    let mut sql = SQL::new(dialect);
    expression.to_sql(&mut sql);
    sql.append_syntax(" AS ");
    alias.to_sql(&mut sql);
    sql.sql
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::SelectList(select_list) => {
                for (index, (col, expr)) in select_list.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    expr.to_sql(sql);
                    sql.append_syntax(" AS ");
                    col.to_sql(sql);
                }
            }
            SelectList::SelectStarFrom(table_alias) => {
                table_alias.to_sql(sql);
                sql.append_syntax(".*");
            }
            SelectList::SelectListComposite(select_list1, select_list2) => {
                select_list1.to_sql(sql);
                sql.append_syntax(", ");
                select_list2.to_sql(sql);
            }
        }
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Values {
                rows,
                alias,
                column,
            } => {
                let row_prefix = sql.dialect().values_row_prefix();
                sql.append_syntax("(VALUES ");
                for (index, row) in rows.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    sql.append_syntax(row_prefix);
                    sql.append_syntax("(");
                    row.to_sql(sql);
                    sql.append_syntax(")");
                }
                sql.append_syntax(") AS ");
                alias.to_sql(sql);
                sql.append_syntax("(");
                column.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Join::LeftOuterJoin(LeftOuterJoin {
                reference,
                alias,
                on,
            }) => {
                sql.append_syntax("LEFT JOIN ");
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
                sql.append_syntax(" ON ");
                on.to_sql(sql);
            }
            Join::LeftOuterJoinLateral(join) => {
                sql.append_syntax("LEFT JOIN LATERAL ");
                join.to_sql(sql);
            }
            Join::InnerJoinLateral(join) => {
                sql.append_syntax("JOIN LATERAL ");
                join.to_sql(sql);
            }
        }
    }
}

impl LateralJoin {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("(");
        self.select.to_sql(sql);
        sql.append_syntax(") AS ");
        self.alias.to_sql(sql);
        sql.append_syntax(" ON ");
        self.on.to_sql(sql);
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            // the top level conjunction is written without parentheses
            for (index, conjunct) in expression.conjuncts().into_iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(" AND ");
                }
                conjunct.to_sql(sql);
            }
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, element) in self.elements.iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(", ");
                }
                element.to_sql(sql);
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        let limit = match (self.limit, self.offset) {
            (None, None) => return,
            (Some(limit), _) => limit,
            (None, Some(_)) => LimitValue::Unlimited,
        };
        sql.append_syntax(" LIMIT ");
        match limit {
            LimitValue::Count(count) => sql.append_syntax(&count.to_string()),
            LimitValue::Unlimited => {
                let unlimited = sql.dialect().unlimited();
                sql.append_syntax(unlimited);
            }
        }
        if let Some(offset) = self.offset {
            sql.append_syntax(" OFFSET ");
            sql.append_syntax(&offset.to_string());
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
            }
            Expression::BinaryArrayOperation {
                left,
                operator,
                right,
            } => {
                if right.is_empty() {
                    // nothing is a member of the empty set
                    sql.append_syntax("FALSE");
                    return;
                }
                left.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax("(");
                for (index, item) in right.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    item.to_sql(sql);
                }
                sql.append_syntax(")");
            }
            Expression::CompositeKey { table, columns } => {
                let dialect = sql.dialect();
                let qualified: Vec<String> = columns
                    .iter()
                    .map(|ColumnName(column)| {
                        format!("{}.{}", dialect.quote(&table.name), dialect.quote(column))
                    })
                    .collect();
                sql.append_syntax(&dialect.composite_key(&qualified));
            }
            Expression::WindowCount => sql.append_syntax("count(*) OVER ()"),
            Expression::RawSql(raw) => sql.append_syntax(raw),
        }
    }

    /// The operands of a top level chain of ANDs, or the expression itself.
    pub fn conjuncts(&self) -> Vec<&Expression> {
        match self {
            Expression::And { left, right } => {
                let mut conjuncts = left.conjuncts();
                conjuncts.extend(right.conjuncts());
                conjuncts
            }
            other => vec![other],
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
        }
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("TRUE"),
            Value::Bool(false) => sql.append_syntax("FALSE"),
            Value::Number(number) => sql.append_syntax(&number.to_string()),
            Value::String(string) => sql.append_string_literal(string),
            Value::Json(json) => sql.append_string_literal(&json.to_string()),
        }
    }

    /// Render the literal for a dialect.
    pub fn to_sql_string(&self, dialect: &dyn Dialect) -> String {
        let mut sql = SQL::new(dialect);
        self.to_sql(&mut sql);
        sql.sql
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        let TableReference(reference) = self;
        sql.append_syntax(reference);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.table.to_sql(sql);
        sql.append_syntax(".");
        self.name.to_sql(sql);
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ColumnName(name) = self;
        sql.append_identifier(name);
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{Postgres, Sqlite};
    use crate::sql::helpers;

    fn posts() -> TableAlias {
        helpers::make_table_alias("posts".to_string())
    }

    #[test]
    fn renders_a_select_with_joins_and_filters() {
        let users = helpers::make_table_alias("users".to_string());
        let mut select = helpers::simple_select(vec![
            helpers::make_column(&users, "id", helpers::make_column_alias("id".to_string())),
            helpers::make_column(
                &posts(),
                "body",
                helpers::make_column_alias("posts__body".to_string()),
            ),
        ]);
        select.from = Some(From::Table {
            reference: TableReference("accounts".to_string()),
            alias: users.clone(),
        });
        select.joins.push(Join::LeftOuterJoin(LeftOuterJoin {
            reference: TableReference("posts".to_string()),
            alias: posts(),
            on: Expression::RawSql("\"users\".\"id\" = \"posts\".\"author_id\"".to_string()),
        }));
        select.where_ = Where(helpers::conjunction(vec![
            Expression::RawSql("\"users\".\"active\"".to_string()),
            Expression::BinaryArrayOperation {
                left: Box::new(helpers::column_expr(&users, "id")),
                operator: BinaryArrayOperator::In,
                right: vec![
                    Expression::Value(Value::from_json(&serde_json::json!(1))),
                    Expression::Value(Value::from_json(&serde_json::json!(2))),
                ],
            },
        ]));
        select.order_by.elements.push(OrderByElement {
            target: helpers::column_expr(&users, "id"),
            direction: OrderByDirection::Desc,
        });

        similar_asserts::assert_eq!(
            select.to_sql_string(&Postgres),
            "SELECT \"users\".\"id\" AS \"id\", \"posts\".\"body\" AS \"posts__body\" \
             FROM accounts AS \"users\" \
             LEFT JOIN posts AS \"posts\" ON \"users\".\"id\" = \"posts\".\"author_id\" \
             WHERE \"users\".\"active\" AND \"users\".\"id\" IN (1, 2) \
             ORDER BY \"users\".\"id\" DESC"
        );
    }

    #[test]
    fn offset_without_count_uses_the_unlimited_sentinel() {
        let mut select = helpers::star_select(From::Table {
            reference: TableReference("posts".to_string()),
            alias: posts(),
        });
        select.limit.offset = Some(5);
        assert_eq!(
            select.to_sql_string(&Sqlite),
            "SELECT \"posts\".* FROM posts AS \"posts\" LIMIT -1 OFFSET 5"
        );
        assert_eq!(
            select.to_sql_string(&Postgres),
            "SELECT \"posts\".* FROM posts AS \"posts\" LIMIT ALL OFFSET 5"
        );
    }

    #[test]
    fn literals_are_quoted() {
        let render = |value: serde_json::Value| Value::from_json(&value).to_sql_string(&Postgres);
        assert_eq!(render(serde_json::json!(null)), "NULL");
        assert_eq!(render(serde_json::json!(true)), "TRUE");
        assert_eq!(render(serde_json::json!(4.5)), "4.5");
        assert_eq!(render(serde_json::json!("O'Brien")), "'O''Brien'");
        assert_eq!(render(serde_json::json!("a\\b")), " E'a\\\\b'");
        assert_eq!(render(serde_json::json!([1, 2])), "'[1,2]'");
    }
}
