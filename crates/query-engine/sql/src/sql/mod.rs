//! Building and rendering SQL statements.

pub mod ast;
pub mod convert;
pub mod dialect;
pub mod helpers;
pub mod string;
