//! A configured compiler: what the binary and embedding programs talk to.

use std::path::Path;

use tracing::{info_span, Instrument};

use joinery_configuration::environment::Environment;
use joinery_configuration::{make_runtime_configuration, parse_configuration, Configuration};
use query_engine_execution::error::Error;
use query_engine_execution::executor::Executor;
use query_engine_execution::query::{self, Options};
use query_engine_metadata::metadata;
use query_engine_translation::translation::query::NodeCondition;

use crate::state::InitializationError;

#[derive(Debug)]
pub struct Joinery {
    configuration: Configuration,
}

impl Joinery {
    pub fn new(configuration: Configuration) -> Joinery {
        Joinery { configuration }
    }

    /// Read and resolve the configuration found in `configuration_dir`.
    pub async fn from_directory(
        configuration_dir: impl AsRef<Path>,
        environment: impl Environment,
    ) -> Result<Joinery, InitializationError> {
        let parsed = parse_configuration(configuration_dir)
            .instrument(info_span!("Parse configuration"))
            .await?;
        Ok(Joinery::new(make_runtime_configuration(parsed, environment)?))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn options(&self) -> Options<'static> {
        Options::new(self.configuration.dialect).minified(self.configuration.minify)
    }

    /// The pretty-printed statement the request starts with.
    pub fn explain(
        &self,
        request: &metadata::QueryRequest,
        context: &metadata::Context,
    ) -> Result<String, Error> {
        query::explain(&self.configuration.schema, request, context, &self.options())
    }

    pub async fn query(
        &self,
        executor: &dyn Executor,
        request: &metadata::QueryRequest,
        context: &metadata::Context,
    ) -> Result<serde_json::Value, Error> {
        query::run(
            &self.configuration.schema,
            request,
            context,
            executor,
            &self.options(),
        )
        .await
    }

    /// Fetch the object of `type_name` whose unique key is `key`.
    pub async fn node(
        &self,
        executor: &dyn Executor,
        type_name: &str,
        key: serde_json::Value,
        request: &metadata::QueryRequest,
        context: &metadata::Context,
    ) -> Result<serde_json::Value, Error> {
        query::get_node(
            &self.configuration.schema,
            type_name,
            request,
            context,
            NodeCondition::Key(key),
            executor,
            &self.options(),
        )
        .await
    }
}
