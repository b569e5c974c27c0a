//! Common functions used across test cases.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use joinery::Joinery;
use joinery_configuration::environment::Variable;
use joinery_configuration::{write_parsed_configuration, DialectName, ParsedConfiguration};
use query_engine_execution::executor::Executor;

/// Write a configuration directory for the blog schema and load it back.
pub async fn create_joinery(minify: bool) -> (tempfile::TempDir, Joinery) {
    tests_common::logging::init();
    let dir = tempfile::tempdir().expect("tempfile::tempdir");

    let mut configuration = ParsedConfiguration::initial();
    configuration.dialect = DialectName::Postgres;
    configuration.minify = minify;
    configuration.schema = tests_common::fixtures::blog_schema();
    write_parsed_configuration(configuration, dir.path())
        .await
        .expect("write_parsed_configuration");

    let joinery = Joinery::from_directory(dir.path(), HashMap::<Variable, String>::new())
        .await
        .expect("Joinery::from_directory");
    (dir, joinery)
}

/// Answers every statement with the same rows.
pub struct StaticExecutor {
    rows: serde_json::Value,
    statements: Mutex<Vec<String>>,
}

impl StaticExecutor {
    pub fn new(rows: serde_json::Value) -> StaticExecutor {
        StaticExecutor {
            rows,
            statements: Mutex::new(vec![]),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for StaticExecutor {
    async fn execute(&self, sql: &str) -> anyhow::Result<serde_json::Value> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }
}
