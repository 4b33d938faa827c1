use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration shared by the content server and the display client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub media_cache: MediaCacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Directory served under `/media`
    pub media_dir: String,
    /// Optional JSON file used to seed the content repository
    pub content_path: Option<String>,
    /// Idle interval after which the change stream sends a keep-alive comment
    pub keepalive_seconds: u64,
    /// Mailbox capacity of a single change stream subscription
    pub subscriber_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 9000,
            media_dir: "./media".to_string(),
            content_path: None,
            keepalive_seconds: 30,
            subscriber_capacity: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the content server, e.g. `http://127.0.0.1:9000`
    pub api_base: String,
    pub events_path: String,
    pub reconnect_backoff_ms: u64,
    /// No bytes for this long on the change stream counts as a dropped connection
    pub read_timeout_seconds: u64,
    /// Fallback config poll, independent of the change stream
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:9000".to_string(),
            events_path: "/events".to_string(),
            reconnect_backoff_ms: 3000,
            read_timeout_seconds: 65,
            poll_interval_seconds: 5,
            request_timeout_seconds: 7,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    #[must_use]
    pub const fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCacheConfig {
    /// Cache directory; defaults to `<tmp>/kiosk_cache`
    pub cache_dir: Option<String>,
    pub user_agent: String,
}

impl Default for MediaCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124 Safari/537.36"
                .to_string(),
        }
    }
}

impl MediaCacheConfig {
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .as_ref()
            .map_or_else(|| std::env::temp_dir().join("kiosk_cache"), PathBuf::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // KIOSK_SERVER__HTTP_PORT, KIOSK_CLIENT__API_BASE, ...
        builder = builder.add_source(
            Environment::with_prefix("KIOSK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Check values that would otherwise fail much later at runtime
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.http_port == 0 {
            errors.push("server.http_port must be non-zero".to_string());
        }
        if self.server.keepalive_seconds == 0 {
            errors.push("server.keepalive_seconds must be at least 1".to_string());
        }
        if self.server.subscriber_capacity == 0 {
            errors.push("server.subscriber_capacity must be at least 1".to_string());
        }
        if url::Url::parse(&self.client.api_base).is_err() {
            errors.push(format!(
                "client.api_base is not a valid URL: {}",
                self.client.api_base
            ));
        }
        if !self.client.events_path.starts_with('/') {
            errors.push("client.events_path must start with '/'".to_string());
        }
        if self.client.poll_interval_seconds == 0 {
            errors.push("client.poll_interval_seconds must be at least 1".to_string());
        }
        if self.client.read_timeout_seconds <= self.server.keepalive_seconds {
            errors.push(
                "client.read_timeout_seconds must exceed server.keepalive_seconds".to_string(),
            );
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
