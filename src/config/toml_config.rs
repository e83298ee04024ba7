use crate::adapters::http::DEFAULT_USER_AGENT;
use crate::domain::model::Search;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ProxyError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_searches")]
    pub searches: Vec<Search>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
            searches: default_searches(),
        }
    }
}

/// Snowboard searches polled when no configuration file is given.
pub fn default_searches() -> Vec<Search> {
    vec![
        Search::new(
            "eBay - YES Hel YES",
            "ebay",
            "https://www.ebay.com/sch/i.html?_nkw=YES+Hel+YES+snowboard&_sacat=0&LH_ItemCondition=3000&_sop=10&_rss=1",
        ),
        Search::new(
            "eBay - YES Hel YES 149",
            "ebay",
            "https://www.ebay.com/sch/i.html?_nkw=YES+Hel+YES+149+snowboard&_sacat=0&_sop=10&_rss=1",
        ),
        Search::new(
            "eBay - YES Women Snowboard",
            "ebay",
            "https://www.ebay.com/sch/i.html?_nkw=YES+women+snowboard&_sacat=0&LH_ItemCondition=3000&_sop=10&_rss=1",
        ),
        Search::new(
            "Craigslist Seattle - YES",
            "craigslist",
            "https://seattle.craigslist.org/search/sga?query=YES+snowboard&format=rss",
        ),
        Search::new(
            "Craigslist Seattle - Hel Yes",
            "craigslist",
            "https://seattle.craigslist.org/search/sga?query=Hel+Yes&format=rss",
        ),
        Search::new(
            "Craigslist Seattle - Snowboard 149",
            "craigslist",
            "https://seattle.craigslist.org/search/sga?query=snowboard+149&format=rss",
        ),
        Search::new(
            "Craigslist Portland - YES",
            "craigslist",
            "https://portland.craigslist.org/search/sga?query=YES+snowboard&format=rss",
        ),
        Search::new(
            "Craigslist Spokane - YES",
            "craigslist",
            "https://spokane.craigslist.org/search/sga?query=YES+snowboard&format=rss",
        ),
    ]
}

impl ProxyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ProxyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        validation::validate_bind_address("server.bind", &self.server.bind)
    }
}

impl ConfigProvider for ProxyConfig {
    fn searches(&self) -> &[Search] {
        &self.searches
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.http.user_agent
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }
}

impl Validate for ProxyConfig {
    fn validate(&self) -> Result<()> {
        self.bind_address()?;
        validation::validate_timeout("http.timeout_seconds", self.http.timeout_seconds)?;
        validation::validate_label("http.user_agent", &self.http.user_agent)?;
        validation::validate_label("output.path", &self.output.path)?;

        if self.searches.is_empty() {
            return Err(ProxyError::MissingConfigError {
                field: "searches".to_string(),
            });
        }

        for search in &self.searches {
            validation::validate_label("searches.name", &search.name)?;
            validation::validate_label("searches.source", &search.source)?;
            validation::validate_feed_url("searches.url", &search.url)?;
        }

        Ok(())
    }
}
