use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use joinery::{create_state, Joinery};
use joinery_configuration::environment::ProcessEnvironment;
use joinery_configuration::{write_parsed_configuration, ParsedConfiguration};
use query_engine_metadata::metadata;

/// Compile GraphQL selections into SQL and run them.
#[derive(Parser)]
#[command(name = "joinery", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write an initial configuration directory.
    Init {
        #[arg(long, value_name = "DIR", env = "JOINERY_CONFIGURATION")]
        configuration: PathBuf,
    },
    /// Print the SQL statement a request starts with.
    Explain(RequestArgs),
    /// Run a request against the configured database and print the result.
    Query(RequestArgs),
    /// Fetch one object by its unique key.
    Node {
        #[command(flatten)]
        request: RequestArgs,
        /// The type of the object.
        #[arg(long = "type", value_name = "TYPE")]
        type_name: String,
        /// The unique key value, as JSON. Anything that is not JSON is taken as a string.
        #[arg(long)]
        id: String,
    },
    /// Print the JSON schema of the configuration file.
    Schema,
}

#[derive(Args)]
struct RequestArgs {
    #[arg(long, value_name = "DIR", env = "JOINERY_CONFIGURATION")]
    configuration: PathBuf,
    /// A JSON file holding the request.
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
    /// A JSON file holding the context handed to computed metadata.
    #[arg(long, value_name = "FILE")]
    context: Option<PathBuf>,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Init { configuration } => {
            write_parsed_configuration(ParsedConfiguration::initial(), &configuration).await?;
        }
        Command::Explain(args) => {
            let (joinery, request, context) = load(&args).await?;
            println!("{}", joinery.explain(&request, &context)?);
        }
        Command::Query(args) => {
            let (joinery, request, context) = load(&args).await?;
            let state = create_state(joinery.configuration()).await?;
            let data = joinery.query(&state.executor, &request, &context).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Node {
            request: args,
            type_name,
            id,
        } => {
            let (joinery, request, context) = load(&args).await?;
            let key = serde_json::from_str(&id).unwrap_or(serde_json::Value::String(id));
            let state = create_state(joinery.configuration()).await?;
            let data = joinery
                .node(&state.executor, &type_name, key, &request, &context)
                .await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Schema => {
            let schema = schemars::schema_for!(ParsedConfiguration);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

async fn load(
    args: &RequestArgs,
) -> anyhow::Result<(Joinery, metadata::QueryRequest, metadata::Context)> {
    let joinery = Joinery::from_directory(&args.configuration, ProcessEnvironment).await?;
    let request = read_json(&args.request).await?;
    let context = match &args.context {
        Some(path) => read_json(path).await?,
        None => serde_json::Value::Null,
    };
    Ok((joinery, request, context))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("unable to parse {}", path.display()))
}
