pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ProxyConfig;

pub use adapters::{http::HttpFeedFetcher, storage::LocalStorage};
pub use crate::core::{aggregator::Aggregator, etl::EtlEngine, pipeline::ListingsPipeline};
pub use utils::error::{ProxyError, Result};
