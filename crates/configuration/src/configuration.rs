//! Configuration for the connector.

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::Dialect;

use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, Secret};
use crate::version1::{ParsedConfiguration, CURRENT_VERSION};

/// The 'Configuration' type collects all the information necessary to serve queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration'.
#[derive(Debug)]
pub struct Configuration {
    pub schema: metadata::Schema,
    pub dialect: &'static dyn Dialect,
    pub minify: bool,
    /// Only needed to run statements, not to explain them.
    pub connection_uri: Option<String>,
}

/// Check the parsed configuration and resolve its secrets.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    if parsed_config.version != CURRENT_VERSION {
        return Err(MakeRuntimeConfigurationError::UnsupportedVersion(
            parsed_config.version,
            CURRENT_VERSION,
        ));
    }

    let connection_uri = match parsed_config.connection_uri {
        None => None,
        Some(ConnectionUri(Secret::Plain { value })) => Some(value),
        Some(ConnectionUri(Secret::FromEnvironment { variable })) => {
            Some(environment.read(&variable)?)
        }
    };

    Ok(Configuration {
        schema: parsed_config.schema,
        dialect: parsed_config.dialect.dialect(),
        minify: parsed_config.minify,
        connection_uri,
    })
}
