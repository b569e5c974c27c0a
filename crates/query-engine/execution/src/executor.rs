//! Where statements are run. The engine hands over SQL text and expects flat rows back.

use async_trait::async_trait;
use sqlx::Row;

use crate::error::Error;

/// Runs one SQL statement and returns its rows.
///
/// The result must be an array of row objects, or an object whose `rows` property is
/// such an array.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, sql: &str) -> anyhow::Result<serde_json::Value>;
}

/// Check the executor kept its side of the contract and take the rows out.
pub fn validate_rows(
    result: serde_json::Value,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, Error> {
    let rows = match result {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut object)
            if object.get("rows").is_some_and(serde_json::Value::is_array) =>
        {
            match object.remove("rows") {
                Some(serde_json::Value::Array(rows)) => rows,
                _ => vec![],
            }
        }
        other => return Err(Error::DataShape(other.to_string())),
    };

    rows.into_iter()
        .map(|row| match row {
            serde_json::Value::Object(row) => Ok(row),
            other => Err(Error::DataShape(other.to_string())),
        })
        .collect()
}

/// Runs statements against PostgreSQL, aggregating the rows to JSON in the database.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: sqlx::PgPool,
}

impl PostgresExecutor {
    pub fn new(pool: sqlx::PgPool) -> PostgresExecutor {
        PostgresExecutor { pool }
    }

    pub async fn connect(connection_uri: &str) -> Result<PostgresExecutor, sqlx::Error> {
        Ok(PostgresExecutor::new(
            sqlx::PgPool::connect(connection_uri).await?,
        ))
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    async fn execute(&self, sql: &str) -> anyhow::Result<serde_json::Value> {
        let wrapped = aggregate_rows(sql);
        let rows: serde_json::Value = sqlx::query(&wrapped)
            .map(|row: sqlx::postgres::PgRow| row.get(0))
            .fetch_one(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Wrap a statement so it yields a single JSON array of its rows.
fn aggregate_rows(sql: &str) -> String {
    format!("SELECT coalesce(json_agg(row_to_json(rows)), '[]') FROM ({sql}) AS rows")
}
