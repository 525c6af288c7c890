use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::util::split_host_port;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PingConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 0 keeps probing until interrupted.
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Unset means the OS connect timeout applies.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    #[serde(default)]
    pub enable_latency_history: bool,
}

fn default_port() -> u16 {
    80
}

fn default_count() -> u64 {
    4
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            count: default_count(),
            delay_ms: default_delay_ms(),
            connect_timeout_ms: None,
            log_level: default_log_level(),
            log_json: false,
            json: false,
            metrics_addr: None,
            enable_latency_history: false,
        }
    }
}

impl PingConfig {
    pub async fn load_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        if !file_path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path.display()));
        }

        let content = fs::read_to_string(file_path).await?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut config: PingConfig = serde_json::from_str(content)?;
        let host = std::mem::take(&mut config.host);
        config.set_host(&host);
        Ok(config)
    }

    /// Takes `host` or `host:port`; an embedded port replaces the current one.
    pub fn set_host(&mut self, input: &str) {
        let (host, port) = split_host_port(input, self.port);
        self.host = host;
        self.port = port;
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow::anyhow!("Invalid log level: {}. Valid levels are: trace, debug, info, warn, error", self.log_level))
        }
    }

    /// Everything the prober assumes has already been checked.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow::anyhow!("No host specified"));
        }
        if self.port == 0 {
            return Err(anyhow::anyhow!("Invalid port: 0"));
        }
        if self.connect_timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("Connect timeout must be greater than 0 ms"));
        }
        self.get_tracing_level().map(|_| ())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}
