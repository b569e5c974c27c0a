//! PostgreSQL.

use super::{quote_with, Dialect};
use crate::sql::string::backslash_string_literal;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "pg"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn quote_string(&self, value: &str) -> String {
        match backslash_string_literal(value) {
            (escaped, true) => format!(" E{escaped}"),
            (escaped, false) => escaped,
        }
    }

    fn composite_key(&self, columns: &[String]) -> String {
        format!("NULLIF(CONCAT({}), '')", columns.join(", "))
    }

    fn unlimited(&self) -> &'static str {
        "ALL"
    }
}
