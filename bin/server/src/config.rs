//! Command line interface.
//!
//! Settings are layered: defaults, then the TOML file, then environment
//! variables and flags.

use ::config::{Config, LogFormat};
use clap::Parser;
use std::{net::IpAddr, path::PathBuf};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "web3-search")]
#[command(about = "HTTP service for ERC20 token and native balance queries")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint url
    #[arg(long, env = "ETH_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Interface to listen on
    #[arg(long, env = "HOST")]
    pub host: Option<IpAddr>,

    /// HTTP port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Upper bound for a single query, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Prometheus exporter port
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Reject cross-origin requests
    #[arg(long)]
    pub no_cors: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Load the config file, if any, and apply overrides on top of it.
    pub fn load_config(&self) -> eyre::Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let config = self.apply(base);
        config.validate()?;

        Ok(config)
    }

    /// Overwrite every field of `config` that was given on the command line
    /// or through the environment.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if self.metrics_port.is_some() {
            config.metrics_port = self.metrics_port;
        }
        if self.no_cors {
            config.cors = false;
        }
        if self.log_json {
            config.log_format = LogFormat::Json;
        }

        config
    }
}
