mod config;

use aggregator::config::ValidationError;
use aggregator::credentials::Credentials;
use aggregator::errors::AggregatorError;
use aggregator::metrics_defs::ALL_METRICS;
use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::MetricType;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const METRICS_PREFIX: &str = "folio";

#[derive(Parser)]
#[command(name = "folio", about = "Personal status aggregation API")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the API and admin listeners
    Run(ConfigArgs),
    /// Load and validate the configuration, then exit
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, short, default_value = "folio.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("could not install metrics recorder: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Validate(args) => validate(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(args: &ConfigArgs) -> Result<Config, CliError> {
    let config = Config::from_file(&args.config)?;
    config.aggregator.validate()?;
    Ok(config)
}

fn validate(args: &ConfigArgs) -> Result<(), CliError> {
    load(args)?;

    let missing = Credentials::from_env().missing();
    if missing.is_empty() {
        println!("{}: ok", args.config.display());
    } else {
        println!(
            "{}: ok, but these variables are not set: {}",
            args.config.display(),
            missing.join(", ")
        );
    }
    Ok(())
}

fn run(args: &ConfigArgs) -> Result<(), CliError> {
    let config = load(args)?;

    // Keep the guard alive so buffered events are flushed on exit
    let _sentry = init_logging(&config.common.logging);

    if let Some(metrics) = &config.common.metrics {
        init_metrics(metrics)?;
    }

    let credentials = Credentials::from_env();
    tracing::info!(config = %args.config.display(), "starting folio");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(aggregator::run(config.aggregator, credentials))?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &logging.sentry_dsn {
        Some(dsn) => {
            let guard = sentry::init((
                dsn.as_str(),
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ));
            registry
                .with(sentry::integrations::tracing::layer())
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Gauge => metrics::describe_gauge!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "statsd metrics enabled"
    );
    Ok(())
}
