//! MySQL 8 and MariaDB.

use super::{quote_with, Dialect};
use crate::sql::string::backslash_string_literal;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql8"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '`')
    }

    fn quote_string(&self, value: &str) -> String {
        backslash_string_literal(value).0
    }

    fn composite_key(&self, columns: &[String]) -> String {
        format!("CONCAT({})", columns.join(", "))
    }

    fn unlimited(&self) -> &'static str {
        "18446744073709551615"
    }

    fn values_row_prefix(&self) -> &'static str {
        "ROW"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::*;
    use crate::sql::helpers;

    #[test]
    fn quotes_with_backticks_and_rows() {
        let select = helpers::star_select(From::Values {
            rows: vec![Value::String("a\\b".to_string())],
            alias: helpers::make_table_alias("temp".to_string()),
            column: ColumnName("id".to_string()),
        });
        assert_eq!(
            select.to_sql_string(&MySql),
            "SELECT `temp`.* FROM (VALUES ROW('a\\\\b')) AS `temp`(`id`)"
        );
    }
}
