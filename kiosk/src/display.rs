//! Headless display
//!
//! Runs the full sync and attract pipeline with a renderer that only logs what
//! it would draw. Activity comes from stdin, one command per line:
//! `tap`, `key`, `touch`, `open <slug>`, `home`, `quit`.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kiosk_client::idle::AttractMedia;
use kiosk_client::media::{BlockMedia, MediaClient, VideoSource};
use kiosk_client::sync::ViewChange;
use kiosk_client::weather::{WeatherClient, WeatherReport};
use kiosk_client::{
    Activity, AttractSurface, BackendClient, ConnectionState, DisplayRuntime, EventConsumer,
    KioskView, UiHandle, UiMessage,
};
use kiosk_core::models::Page;
use kiosk_core::{Config, MediaCache};

use crate::server::shutdown_signal;

pub async fn run(config: Config) -> Result<()> {
    info!("Kiosk display starting...");
    info!("Content server: {}", config.client.api_base());

    let backend = BackendClient::new(&config.client)?;
    let weather = WeatherClient::new(backend.http().clone());
    let cache = MediaCache::new(&config.media_cache, config.client.api_base())?;
    info!("Media cache at {}", cache.cache_dir().display());

    let runtime = DisplayRuntime::new(
        Arc::new(backend),
        MediaClient::new(cache),
        Box::new(LogView),
        Box::new(LogSurface),
        config.client.poll_interval(),
    )
    .with_weather(weather);
    let handle = runtime.handle();

    let cancel = CancellationToken::new();
    let consumer = EventConsumer::new(&config.client, handle.clone())?.spawn(cancel.clone());
    let input = tokio::spawn(read_commands(handle, cancel.clone()));
    let display = tokio::spawn(runtime.run(cancel.clone()));

    tokio::select! {
        () = shutdown_signal() => info!("Shutdown signal received"),
        () = cancel.cancelled() => info!("Quit requested"),
    }
    cancel.cancel();

    // stdin reads cannot be interrupted
    input.abort();
    let (consumer, display) = tokio::join!(consumer, display);
    if let Err(e) = consumer.and(display) {
        warn!("Display task ended abnormally: {}", e);
    }

    info!("Kiosk display stopped");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Activity(Activity),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "tap" | "click" => Command::Activity(Activity::Pointer),
        "key" => Command::Activity(Activity::Key),
        "touch" => Command::Activity(Activity::Touch),
        "home" => Command::Activity(Activity::Home),
        "open" => Command::Activity(Activity::Navigate(words.next()?.to_string())),
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

async fn read_commands(handle: UiHandle, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed, no more input commands");
                return;
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                return;
            }
        };

        match parse_command(&line) {
            Some(Command::Activity(activity)) => {
                if !handle.dispatch(UiMessage::Activity(activity)) {
                    return;
                }
            }
            Some(Command::Quit) => {
                cancel.cancel();
                return;
            }
            None if line.trim().is_empty() => {}
            None => warn!(input = %line.trim(), "Unknown command"),
        }
    }
}

struct LogView;

impl KioskView for LogView {
    fn apply(&mut self, change: &ViewChange) {
        match change {
            ViewChange::Branding(branding) => info!(
                org_name = %branding.org_name,
                logo = ?branding.logo_path,
                "Header rebuilt"
            ),
            ViewChange::Theme(theme) => info!(
                theme = %theme.name,
                primary = %theme.primary,
                bg = %theme.bg,
                "Theme applied"
            ),
            ViewChange::Weather(state) => info!(show = state.show, city = ?state.city, "Weather widget updated"),
            ViewChange::Attract(config) => info!(
                asset = ?config.asset_ref,
                timeout_secs = config.idle_timeout_seconds,
                "Attract mode configured"
            ),
            ViewChange::Menu(menu) => info!(entries = menu.len(), "Menu rebuilt"),
        }
    }

    fn set_background(&mut self, path: Option<&Path>) {
        match path {
            Some(path) => info!(path = %path.display(), "Background image set"),
            None => info!("Background image cleared"),
        }
    }

    fn show_page(&mut self, page: &Page) {
        info!(slug = %page.slug, title = %page.title, blocks = page.blocks.len(), "Page shown");
    }

    fn show_home(&mut self) {
        info!("Home shown");
    }

    fn set_block_media(&mut self, slug: &str, block_id: i64, media: &BlockMedia) {
        match media {
            BlockMedia::Image(data) => info!(slug, block_id, bytes = data.len(), "Image block ready"),
            BlockMedia::Video(VideoSource::Local(path)) => {
                info!(slug, block_id, path = %path.display(), "Video block ready");
            }
            BlockMedia::Video(VideoSource::Stream(url)) => {
                info!(slug, block_id, url = %url, "Video block streaming");
            }
            BlockMedia::Pdf(path) => info!(slug, block_id, path = %path.display(), "PDF block ready"),
            BlockMedia::Unavailable => warn!(slug, block_id, "Block media unavailable"),
        }
    }

    fn set_weather(&mut self, report: Option<&WeatherReport>) {
        match report {
            Some(report) => info!(label = %report.label(), condition = ?report.condition(), "Weather shown"),
            None => info!("Weather hidden"),
        }
    }

    fn set_connection(&mut self, state: ConnectionState) {
        debug!(state = ?state, "Change stream state");
    }
}

struct LogSurface;

impl AttractSurface for LogSurface {
    fn show(&mut self, media: &AttractMedia) {
        info!(asset = %media.asset(), "Attract mode overlay shown");
    }

    fn hide(&mut self) {
        info!("Attract mode overlay hidden");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("tap"), Some(Command::Activity(Activity::Pointer)));
        assert_eq!(parse_command("  touch "), Some(Command::Activity(Activity::Touch)));
        assert_eq!(
            parse_command("open hours"),
            Some(Command::Activity(Activity::Navigate("hours".to_string())))
        );
        assert_eq!(parse_command("home"), Some(Command::Activity(Activity::Home)));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("open"), None);
        assert_eq!(parse_command("dance"), None);
    }
}
