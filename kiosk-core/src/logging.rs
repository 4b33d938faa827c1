//! Log output for the two kiosk processes
//!
//! The server logs request spans from the HTTP layer; the display is mostly
//! events and keeps its HTTP client libraries quiet unless `RUST_LOG` says
//! otherwise.

use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Which process is logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRole {
    /// `kiosk serve`
    Server,
    /// `kiosk display`
    Display,
}

impl LogRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Display => "display",
        }
    }

    /// Filter used when `RUST_LOG` is unset
    #[must_use]
    pub fn directives(self, level: Level) -> String {
        let level = level.as_str().to_ascii_lowercase();
        match self {
            Self::Server => format!("{level},tower_http={level},hyper=warn"),
            Self::Display => format!("{level},reqwest=warn,hyper=warn,hyper_util=warn"),
        }
    }

    const fn span_events(self) -> FmtSpan {
        match self {
            // closes of request spans carry the latency
            Self::Server => FmtSpan::CLOSE,
            Self::Display => FmtSpan::NONE,
        }
    }
}

/// Install the global subscriber: json or pretty, stdout or an appended file
pub fn init_logging(config: &LoggingConfig, role: LogRole) -> anyhow::Result<()> {
    let level = parse_log_level(&config.level)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(role.directives(level))?,
    };

    let writer = match &config.file_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let layer = if config.format == "json" {
        fmt::layer()
            .json()
            .with_span_events(role.span_events())
            .with_current_span(true)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_span_events(role.span_events())
            .with_target(role == LogRole::Server)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).with(filter).try_init()?;
    tracing::debug!(role = role.as_str(), format = %config.format, "Logging initialised");
    Ok(())
}

fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}
