//! Content server HTTP client
//!
//! Thin wrapper over the server's read endpoints. Callers decide what a failed
//! fetch means; nothing here substitutes defaults.

use async_trait::async_trait;
use kiosk_core::config::ClientConfig;
use kiosk_core::models::{KioskConfig, MenuNode, Page};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Where the display reads its content from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_config(&self) -> Result<KioskConfig>;
    async fn fetch_menu(&self) -> Result<Vec<MenuNode>>;
    async fn fetch_page(&self, slug: &str) -> Result<Page>;
}

/// Content server client
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.api_base(), config.request_timeout()))
    }

    pub fn with_client(client: Client, base_url: &str, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for a server path, adding the leading slash if missing
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        debug!(url = %url, "Fetching content");

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ContentSource for BackendClient {
    async fn fetch_config(&self) -> Result<KioskConfig> {
        self.get_json("/config").await
    }

    async fn fetch_menu(&self) -> Result<Vec<MenuNode>> {
        let mut menu: Vec<MenuNode> = self.get_json("/home/menu").await?;
        MenuNode::sort_tree(&mut menu);
        Ok(menu)
    }

    async fn fetch_page(&self, slug: &str) -> Result<Page> {
        let slug = slug.trim_matches('/');
        if slug.is_empty() {
            return Err(ClientError::InvalidConfig("Empty page slug".to_string()));
        }
        self.get_json(&format!("/pages/{slug}")).await
    }
}
