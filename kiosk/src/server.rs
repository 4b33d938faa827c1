use anyhow::Result;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use kiosk_api::create_router;
use kiosk_core::repository::InMemoryContentRepository;
use kiosk_core::service::{ChangeBroadcaster, ContentService};
use kiosk_core::Config;

/// Open change streams never finish on their own
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config: Config) -> Result<()> {
    info!("Kiosk content server starting...");

    let repository = match &config.server.content_path {
        Some(path) => InMemoryContentRepository::from_file(path)?,
        None => {
            info!("No content file configured, starting with default content");
            InMemoryContentRepository::default()
        }
    };
    let broadcaster = ChangeBroadcaster::with_capacity(config.server.subscriber_capacity);
    let content = ContentService::new(Arc::new(repository), broadcaster);

    let app = create_router(content, &config.server);
    let address = config.http_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("HTTP server listening on {}", address);
    info!("Serving media from {}", config.server.media_dir);

    let shutdown = CancellationToken::new();
    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let mut serve = std::pin::pin!(serve.into_future());

    tokio::select! {
        result = &mut serve => result?,
        () = shutdown_signal() => {
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown.cancel();
            match tokio::time::timeout(DRAIN_TIMEOUT, serve).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    "Drain timeout reached after {}s with connections still open, proceeding with shutdown",
                    DRAIN_TIMEOUT.as_secs()
                ),
            }
        }
    }

    info!("Kiosk content server stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
