use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Seconds a fetched feed is served from cache; 0 disables caching
    #[serde(default = "default_revalidate")]
    pub revalidate: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    #[serde(default = "default_total_limit")]
    pub total_limit: usize,
    /// Largest feed body read, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    pub feeds: Vec<String>,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_revalidate() -> u64 {
    600
}

fn default_request_timeout() -> u64 {
    5
}

fn default_per_feed_limit() -> usize {
    30
}

fn default_total_limit() -> usize {
    20
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which no feed could ever be read.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be at least 1 second");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }
        Ok(())
    }

    /// Build a config for the given feeds with every other setting at its default.
    pub fn with_feeds<I, S>(feeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            listen: default_listen(),
            revalidate: default_revalidate(),
            request_timeout: default_request_timeout(),
            per_feed_limit: default_per_feed_limit(),
            total_limit: default_total_limit(),
            max_body_bytes: default_max_body_bytes(),
            feeds: feeds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
