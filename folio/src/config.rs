use aggregator::config::Config as AggregatorConfig;
use serde::Deserialize;
use std::fs::File;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STATSD_PORT: u16 = 8125;

#[derive(Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    #[serde(default = "default_statsd_port")]
    pub statsd_port: u16,
}

fn default_statsd_port() -> u16 {
    DEFAULT_STATSD_PORT
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: DEFAULT_LOG_LEVEL.to_string(),
            sentry_dsn: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub aggregator: AggregatorConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
