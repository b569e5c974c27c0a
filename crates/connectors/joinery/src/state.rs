//! Transient state used by the connector.
//!
//! This is initialized on demand: explaining a request needs no database.

use thiserror::Error;
use tracing::{info_span, Instrument};

use joinery_configuration::error::{MakeRuntimeConfigurationError, ParseConfigurationError};
use joinery_configuration::Configuration;
use query_engine_execution::executor::PostgresExecutor;

/// State for our connector.
pub struct State {
    pub executor: PostgresExecutor,
}

/// Create a connection pool and wrap it inside a connector State.
pub async fn create_state(configuration: &Configuration) -> Result<State, InitializationError> {
    let connection_uri = configuration
        .connection_uri
        .as_deref()
        .ok_or(InitializationError::MissingConnectionUri)?;

    let executor = PostgresExecutor::connect(connection_uri)
        .instrument(info_span!("Create connection pool"))
        .await
        .map_err(InitializationError::UnableToCreatePool)?;

    Ok(State { executor })
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(sqlx::Error),
    #[error("the configuration has no connection URI")]
    MissingConnectionUri,
    #[error("{0}")]
    ParseConfiguration(#[from] ParseConfigurationError),
    #[error("{0}")]
    MakeRuntimeConfiguration(#[from] MakeRuntimeConfigurationError),
}
