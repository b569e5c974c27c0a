//! The first version of the configuration format.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::{self, Dialect};

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::ConnectionUri;

pub const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as it is written in a configuration directory.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    /// The SQL dialect statements are written in.
    #[serde(default)]
    pub dialect: DialectName,
    /// Use the shortest aliases possible in generated statements.
    #[serde(default)]
    pub minify: bool,
    /// Connection string for a PostgreSQL database to run statements against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_uri: Option<ConnectionUri>,
    /// The types requests are compiled against.
    #[serde(default)]
    pub schema: metadata::Schema,
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        ParsedConfiguration {
            version: CURRENT_VERSION,
            dialect: DialectName::default(),
            minify: false,
            connection_uri: None,
            schema: metadata::Schema::empty(),
        }
    }
}

/// The SQL dialects statements can be written in.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    JsonSchema,
    enum_iterator::Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum DialectName {
    Postgres,
    Mysql,
    #[default]
    Sqlite,
}

impl DialectName {
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectName::Postgres => &dialect::Postgres,
            DialectName::Mysql => &dialect::MySql,
            DialectName::Sqlite => &dialect::Sqlite,
        }
    }
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    tracing::debug!(
        file = %configuration_file.display(),
        types = parsed_config.schema.types.len(),
        "Parsed configuration"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, along with its JSON schema.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_configuration_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut configuration = ParsedConfiguration::initial();
        configuration.dialect = DialectName::Postgres;
        configuration.connection_uri = Some("postgresql://localhost:5432/blog".into());
        configuration.schema = tests_common::fixtures::blog_schema();

        write_parsed_configuration(configuration, dir.path())
            .await
            .unwrap();
        let parsed = parse_configuration(dir.path()).await.unwrap();

        assert_eq!(parsed.version, CURRENT_VERSION);
        assert_eq!(parsed.dialect, DialectName::Postgres);
        assert_eq!(
            parsed.connection_uri,
            Some(ConnectionUri::from("postgresql://localhost:5432/blog"))
        );
        assert!(parsed.schema.lookup_type("User").is_some());
    }

    #[tokio::test]
    async fn the_written_schema_accepts_the_written_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut configuration = ParsedConfiguration::initial();
        configuration.schema = tests_common::fixtures::blog_schema();
        write_parsed_configuration(configuration, dir.path())
            .await
            .unwrap();

        let read = |name: &str| -> serde_json::Value {
            let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
            serde_json::from_str(&contents).unwrap()
        };
        let schema = jsonschema::JSONSchema::compile(&read(CONFIGURATION_JSONSCHEMA_FILENAME))
            .unwrap();
        assert!(schema.is_valid(&read(CONFIGURATION_FILENAME)));
        assert!(!schema.is_valid(&serde_json::json!({"version": 1, "dialect": "oracle"})));
    }

    #[tokio::test]
    async fn parse_errors_point_at_the_problem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIGURATION_FILENAME),
            "{\n  \"version\": 1,\n  \"minify\": maybe\n}\n",
        )
        .unwrap();

        match parse_configuration(dir.path()).await {
            Err(ParseConfigurationError::ParseError { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_directories_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let error = parse_configuration(dir.path().join("nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(error, ParseConfigurationError::IoErrorButStringified(_)));
    }

    #[test]
    fn every_dialect_has_an_implementation() {
        let names: Vec<&str> = enum_iterator::all::<DialectName>()
            .map(|name| name.dialect().name())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(DialectName::default(), DialectName::Sqlite);
    }
}
