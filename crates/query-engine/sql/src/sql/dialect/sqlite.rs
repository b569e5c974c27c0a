//! SQLite. Lacks lateral joins, so only the top level relation can be paginated.

use super::{quote_with, BatchValues, Dialect, Error, PageSelect};
use crate::sql::ast::{Expression, TableClause};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Sqlite {
    fn unsupported(&self, form: &'static str) -> Result<Vec<TableClause>, Error> {
        Err(Error::PaginationNotSupported {
            dialect: self.name(),
            form,
        })
    }
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn composite_key(&self, columns: &[String]) -> String {
        columns.join(" || ")
    }

    fn unlimited(&self) -> &'static str {
        "-1"
    }

    fn joined_one_to_many(
        &self,
        _page: PageSelect,
        _join_condition: Expression,
    ) -> Result<Vec<TableClause>, Error> {
        self.unsupported("joined one-to-many")
    }

    fn joined_many_to_many(
        &self,
        _page: PageSelect,
        _join_condition: Expression,
    ) -> Result<Vec<TableClause>, Error> {
        self.unsupported("joined many-to-many")
    }

    fn batched_one_to_many(
        &self,
        _page: PageSelect,
        _batch: BatchValues,
    ) -> Result<Vec<TableClause>, Error> {
        self.unsupported("batched one-to-many")
    }

    fn batched_many_to_many(
        &self,
        _page: PageSelect,
        _batch: BatchValues,
    ) -> Result<Vec<TableClause>, Error> {
        self.unsupported("batched many-to-many")
    }
}
