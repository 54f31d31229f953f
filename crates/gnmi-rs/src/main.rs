//! Command-line client issuing capability and get calls against local files.

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use gnmi_rs::ConfigOverrides;
use gnmi_rs::config::LayeredConfigOptions;
use gnmi_rs::core::{CallContext, GnmiServer, GnmiService};
use gnmi_rs::protocol::{
    Address, CapabilityRequest, Encoding, GetRequest, ModelDescriptor, Status,
};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line options for the gnmi-rs client.
#[derive(Parser)]
#[command(name = "gnmi-rs", version)]
struct Cli {
    /// Optional path to a gnmi.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Schema bundle path, overriding the config
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Initial data document path, overriding the config
    #[arg(long)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print supported models and encodings
    Capabilities,
    /// Retrieve one or more paths
    Get {
        /// Paths such as `access-profile/access-profile[id=default]/filter`
        #[arg(required = true)]
        paths: Vec<String>,
        /// Prefix joined in front of every path
        #[arg(long)]
        prefix: Option<String>,
        /// json, json_ietf or proto
        #[arg(long, default_value = "json_ietf")]
        encoding: String,
        /// Restrict the request to a model, given as name:organization:version
        #[arg(long = "use-model")]
        use_models: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting gnmi-rs (config_set={}, schema_set={}, data_set={})",
        cli.config.is_some(),
        cli.schema.is_some(),
        cli.data.is_some()
    );

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let overrides = ConfigOverrides {
        config: cli.config.clone(),
        schema_path: cli.schema.clone(),
        data_path: cli.data.clone(),
    };
    let config = gnmi_rs::load_server_config(LayeredConfigOptions::new(&cwd), &overrides)
        .context("failed to load config")?;
    let server = GnmiServer::from_config(&config).context("failed to start server")?;
    let ctx = CallContext::new();

    match cli.command {
        Command::Capabilities => {
            let response = server.capabilities(&ctx, CapabilityRequest::default()).await;
            print_outcome(response)
        }
        Command::Get {
            paths,
            prefix,
            encoding,
            use_models,
        } => {
            let request = build_get_request(&paths, prefix.as_deref(), &encoding, &use_models)?;
            debug!("issuing get (paths={})", request.paths.len());
            let response = server.get(&ctx, request).await;
            print_outcome(response)
        }
    }
}

fn build_get_request(
    paths: &[String],
    prefix: Option<&str>,
    encoding: &str,
    use_models: &[String],
) -> anyhow::Result<GetRequest> {
    let encoding = encoding.parse::<Encoding>().map_err(|err| anyhow!(err))?;
    let prefix = prefix
        .map(|text| text.parse::<Address>())
        .transpose()
        .context("invalid prefix")?;
    let paths = paths
        .iter()
        .map(|text| text.parse::<Address>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid path")?;
    let use_models = use_models
        .iter()
        .map(String::as_str)
        .map(parse_model)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(GetRequest {
        prefix,
        paths,
        encoding,
        use_models,
    })
}

/// Parse `name:organization:version`.
fn parse_model(text: &str) -> anyhow::Result<ModelDescriptor> {
    let mut parts = text.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(organization), Some(version)) if !name.is_empty() => {
            Ok(ModelDescriptor::new(name, organization, version))
        }
        _ => bail!("model {text:?} must be written as name:organization:version"),
    }
}

fn print_outcome<T: Serialize>(outcome: Result<T, Status>) -> anyhow::Result<ExitCode> {
    match outcome {
        Ok(response) => {
            let rendered =
                serde_json::to_string_pretty(&response).context("failed to render response")?;
            println!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
        Err(status) => {
            eprintln!("{status}");
            let code = u8::try_from(status.code().value()).unwrap_or(1);
            Ok(ExitCode::from(code))
        }
    }
}
