//! Translate a selection tree into a SQL AST, and the SQL AST into SQL statements.

pub mod aliases;
pub mod cursor;
pub mod error;
pub mod query;
pub mod shape;
pub mod sql_ast;
pub mod stringify;
