use crate::config::toml_config::ProxyConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "listing-proxy")]
#[command(about = "Aggregates classifieds RSS feeds and serves deduplicated listings as JSON")]
pub struct CliConfig {
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Address to listen on, overrides [server] bind")]
    pub bind: Option<String>,

    #[arg(long, help = "Fetch once, write a snapshot and exit")]
    pub once: bool,

    #[arg(long, help = "Snapshot directory, overrides [output] path")]
    pub output_path: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Loads the file configuration (or defaults) and applies flag overrides.
    pub fn resolve(&self) -> Result<ProxyConfig> {
        let mut config = match &self.config {
            Some(path) => ProxyConfig::from_file(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }

        Ok(config)
    }
}
