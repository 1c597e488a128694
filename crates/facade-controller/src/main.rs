//! Facade controller - installs a CustomResourceDefinition for every Facade

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use kube::Client;

mod config;
mod error;
mod exit_codes;

use config::ControllerConfig;
use error::{CliError, Result};

#[derive(Parser, Debug)]
#[command(name = "facade-controller")]
#[command(version)]
#[command(about = "Turns Facade objects into installed CustomResourceDefinitions", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "FACADE_CONFIG")]
    config: Option<PathBuf>,

    /// Watch a single namespace instead of all namespaces
    #[arg(short, long, env = "FACADE_NAMESPACE")]
    namespace: Option<String>,

    /// API group for generated definitions
    #[arg(long)]
    default_group: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Config file values with flags applied on top
    fn resolve_config(&self) -> Result<ControllerConfig> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::load_from(path)?,
            None => ControllerConfig::default(),
        };
        if let Some(ns) = &self.namespace {
            config.namespace = Some(ns.clone());
        }
        if let Some(group) = &self.default_group {
            config.default_group = group.clone();
        }
        Ok(config)
    }
}

/// Log filter from `RUST_LOG` when set, otherwise from `--log-level`
fn log_filter(rust_log: Option<&str>, level: &str) -> Result<tracing_subscriber::EnvFilter> {
    let (directives, source) = match rust_log {
        Some(env) => (env, "RUST_LOG"),
        None => (level, "--log-level"),
    };
    tracing_subscriber::EnvFilter::from_str(directives)
        .map_err(|e| CliError::usage(format!("invalid {} '{}': {}", source, directives, e)))
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), level)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing(&cli.log_level, cli.log_format)?;

    let settings = cli.resolve_config()?.to_settings()?;
    tracing::debug!(config = ?cli.config, settings = ?settings, "Resolved configuration");

    let client = Client::try_default().await.map_err(|e| {
        CliError::kube_with_help(
            e.to_string(),
            "Set KUBECONFIG or run inside a cluster with a service account",
        )
    })?;

    facade_kube::run(client, settings).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };
    std::process::exit(code);
}
