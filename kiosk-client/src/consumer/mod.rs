//! Change stream consumer
//!
//! Holds one long-lived connection to the server's `/events` stream and turns
//! each frame into a [`UiMessage::Change`]. The connection cycles through
//! `Connecting -> Connected -> Disconnected` and reconnects after a fixed
//! backoff for as long as the display is alive.

pub mod sse;

use kiosk_core::config::ClientConfig;
use kiosk_core::ChangeEvent;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::{UiHandle, UiMessage};
use crate::error::ClientError;
pub use sse::SseParser;

/// Change stream connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Why a single connection attempt ended
#[derive(Debug)]
enum StreamExit {
    /// Connected, then the stream ended or went silent
    Disconnected(ClientError),
    /// Never got a successful response
    ConnectFailed(ClientError),
    /// The display task is gone; nobody is left to notify
    UiClosed,
    Cancelled,
}

/// Reconnecting `/events` reader
pub struct EventConsumer {
    client: Client,
    url: String,
    backoff: Duration,
    read_timeout: Duration,
    handle: UiHandle,
    state: ConnectionState,
}

impl EventConsumer {
    pub fn new(config: &ClientConfig, handle: UiHandle) -> Result<Self, ClientError> {
        // No overall request timeout: the stream is expected to stay open
        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;
        let url = format!("{}{}", config.api_base(), config.events_path);
        Ok(Self::with_client(
            client,
            url,
            config.reconnect_backoff(),
            config.read_timeout(),
            handle,
        ))
    }

    #[must_use]
    pub fn with_client(
        client: Client,
        url: impl Into<String>,
        backoff: Duration,
        read_timeout: Duration,
        handle: UiHandle,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            backoff,
            read_timeout,
            handle,
            state: ConnectionState::Disconnected,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or the UI queue closes
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(url = %self.url, "Change stream consumer started");
        let mut parser = SseParser::new();

        loop {
            if cancel.is_cancelled() {
                info!("Change stream consumer cancelled");
                return;
            }

            if !self.transition(ConnectionState::Connecting) {
                info!("UI queue closed, stopping change stream consumer");
                return;
            }

            parser.reset();
            match self.run_connection(&mut parser, &cancel).await {
                StreamExit::UiClosed => {
                    info!("UI queue closed, stopping change stream consumer");
                    return;
                }
                StreamExit::Cancelled => {
                    info!("Change stream consumer cancelled");
                    return;
                }
                StreamExit::Disconnected(e) => {
                    warn!(
                        error = %e,
                        backoff_ms = self.backoff.as_millis(),
                        "Change stream dropped, reconnecting after backoff"
                    );
                }
                StreamExit::ConnectFailed(e) => {
                    warn!(
                        error = %e,
                        backoff_ms = self.backoff.as_millis(),
                        "Change stream connect failed, retrying after backoff"
                    );
                }
            }

            if !self.transition(ConnectionState::Disconnected) {
                info!("UI queue closed, stopping change stream consumer");
                return;
            }

            // Wait with cancellation support
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Change stream consumer cancelled during backoff");
                    return;
                }
                () = tokio::time::sleep(self.backoff) => {}
            }
        }
    }

    /// Record a state change and tell the display; `false` when the UI is gone
    fn transition(&mut self, next: ConnectionState) -> bool {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Change stream state");
            self.state = next;
        }
        self.handle.dispatch(UiMessage::Stream(next))
    }

    async fn run_connection(
        &mut self,
        parser: &mut SseParser,
        cancel: &CancellationToken,
    ) -> StreamExit {
        let request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();

        let response = tokio::select! {
            () = cancel.cancelled() => return StreamExit::Cancelled,
            result = timeout(self.read_timeout, request) => result,
        };

        let mut response = match response {
            Ok(Ok(response)) if response.status().is_success() => response,
            Ok(Ok(response)) => {
                return StreamExit::ConnectFailed(ClientError::Status {
                    status: response.status().as_u16(),
                    url: self.url.clone(),
                });
            }
            Ok(Err(e)) => return StreamExit::ConnectFailed(e.into()),
            Err(_) => return StreamExit::ConnectFailed(ClientError::ReadTimeout(self.read_timeout)),
        };

        if !self.transition(ConnectionState::Connected) {
            return StreamExit::UiClosed;
        }
        info!(url = %self.url, "Change stream connected");

        loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => return StreamExit::Cancelled,
                result = timeout(self.read_timeout, response.chunk()) => result,
            };

            let bytes = match chunk {
                Ok(Ok(Some(bytes))) => bytes,
                Ok(Ok(None)) => {
                    return StreamExit::Disconnected(ClientError::Network(
                        "stream ended by server".to_string(),
                    ));
                }
                Ok(Err(e)) => return StreamExit::Disconnected(e.into()),
                Err(_) => {
                    return StreamExit::Disconnected(ClientError::ReadTimeout(self.read_timeout))
                }
            };

            let frames = match parser.feed(&bytes) {
                Ok(frames) => frames,
                Err(e) => return StreamExit::Disconnected(e.into()),
            };
            for data in frames {
                match ChangeEvent::from_json(&data) {
                    Ok(event) => {
                        debug!(event_type = %event.event_type(), "Change event received");
                        if !self.handle.dispatch(UiMessage::Change(event)) {
                            return StreamExit::UiClosed;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, data = %data, "Dropping malformed change frame");
                    }
                }
            }
        }
    }
}
