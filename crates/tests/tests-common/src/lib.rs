//! Fixtures and helpers shared by the integration tests of every crate.

pub mod fixtures;
pub mod logging;
