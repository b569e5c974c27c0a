//! Type definitions of a low-level SQL string representation.

use super::dialect::Dialect;

/// A SQL text being written for a particular dialect.
pub struct SQL<'d> {
    pub sql: String,
    dialect: &'d dyn Dialect,
}

impl<'d> SQL<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> SQL<'d> {
        SQL {
            sql: String::new(),
            dialect,
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn append_identifier(&mut self, identifier: &str) {
        let quoted = self.dialect.quote(identifier);
        self.sql.push_str(&quoted);
    }

    pub fn append_string_literal(&mut self, value: &str) {
        let quoted = self.dialect.quote_string(value);
        self.sql.push_str(&quoted);
    }
}

/// Quote a string literal the ANSI way, doubling single quotes.
pub fn ansi_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a string literal, doubling single quotes and backslashes.
/// Returns whether a backslash was escaped.
pub fn backslash_string_literal(value: &str) -> (String, bool) {
    let mut escaped = String::with_capacity(value.len() + 2);
    let mut has_backslash = false;
    escaped.push('\'');
    for c in value.chars() {
        match c {
            '\'' => escaped.push_str("''"),
            '\\' => {
                escaped.push_str("\\\\");
                has_backslash = true;
            }
            c => escaped.push(c),
        }
    }
    escaped.push('\'');
    (escaped, has_backslash)
}
