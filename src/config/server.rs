use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_idp_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_cache_ttl_minutes() -> u64 {
    720
}

fn default_ttl_refresh_minutes() -> u64 {
    10
}

fn default_notify_workers() -> usize {
    4
}

fn default_notify_queue() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the identity provider used for token validation.
    #[serde(default = "default_idp_url")]
    pub idp_url: String,

    /// Optional HTTP sink that receives delivered notifications.
    #[serde(default)]
    pub notify_url: Option<String>,

    /// How long a validated token stays in the principal cache.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    /// Minimum interval between background token TTL refreshes.
    #[serde(default = "default_ttl_refresh_minutes")]
    pub ttl_refresh_minutes: u64,

    /// Per-user cap on invitation notifications. 0 disables the cap.
    #[serde(default)]
    pub invite_rate_limit: u32,

    #[serde(default = "default_notify_workers")]
    pub notify_workers: usize,
    #[serde(default = "default_notify_queue")]
    pub notify_queue: usize,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| Error::Config(e.to_string()))
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("huddle.db")
    }

    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }

    #[must_use]
    pub fn ttl_refresh(&self) -> Duration {
        Duration::from_secs(self.ttl_refresh_minutes * 60)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            idp_url: default_idp_url(),
            notify_url: None,
            cache_ttl_minutes: default_cache_ttl_minutes(),
            ttl_refresh_minutes: default_ttl_refresh_minutes(),
            invite_rate_limit: 0,
            notify_workers: default_notify_workers(),
            notify_queue: default_notify_queue(),
        }
    }
}
