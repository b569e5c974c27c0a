use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use query_engine_execution::executor::Executor;
use query_engine_execution::query::Options;
use query_engine_sql::sql;

/// Answers statements with prepared results, in order, and remembers what it was asked.
pub struct ScriptedExecutor {
    results: Mutex<VecDeque<serde_json::Value>>,
    statements: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(results: Vec<serde_json::Value>) -> ScriptedExecutor {
        tests_common::logging::init();
        ScriptedExecutor {
            results: Mutex::new(results.into()),
            statements: Mutex::new(vec![]),
        }
    }

    /// Every statement received so far.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> anyhow::Result<serde_json::Value> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no result left for: {sql}"))
    }
}

/// Fails every statement.
pub struct FailingExecutor;

#[async_trait]
impl Executor for FailingExecutor {
    async fn execute(&self, _sql: &str) -> anyhow::Result<serde_json::Value> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

pub fn postgres() -> Options<'static> {
    Options::new(&sql::dialect::Postgres)
}
