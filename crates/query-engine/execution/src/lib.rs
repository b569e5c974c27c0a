//! Run compiled statements through an executor and shape the rows into nested data.

pub mod batch;
pub mod connections;
pub mod error;
pub mod executor;
pub mod hydration;
pub mod query;
pub mod unions;
