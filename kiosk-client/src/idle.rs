//! Idle / attract-mode state machine
//!
//! Pure transition logic: inputs go in, commands for the display task come
//! out. Every (re)arm bumps the epoch, so timer expiries and asset
//! preparations started under an older epoch are recognised and ignored.

use bytes::Bytes;
use kiosk_core::models::AttractConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::media::VideoSource;

/// How an attract asset is rendered, by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttractKind {
    Image,
    Gif,
    Video,
}

impl AttractKind {
    const IMAGE_EXTS: &'static [&'static str] = &["png", "jpg", "jpeg", "webp"];
    const VIDEO_EXTS: &'static [&'static str] = &["mp4", "webm", "avi", "mov", "mkv"];

    /// Kind for an asset reference; `None` for unsupported extensions
    #[must_use]
    pub fn from_ref(asset: &str) -> Option<Self> {
        let path = asset.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or_default();
        let (_, ext) = file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();

        if Self::IMAGE_EXTS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if ext == "gif" {
            Some(Self::Gif)
        } else if Self::VIDEO_EXTS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Prepared attract asset, ready for the surface
#[derive(Debug, Clone)]
pub enum AttractMedia {
    Image { asset: String, data: Bytes },
    Gif { asset: String, path: std::path::PathBuf },
    Video { asset: String, source: VideoSource },
}

impl AttractMedia {
    #[must_use]
    pub fn asset(&self) -> &str {
        match self {
            Self::Image { asset, .. } | Self::Gif { asset, .. } | Self::Video { asset, .. } => asset,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IdleState {
    /// No asset or no timeout configured
    Disabled,
    CountingDown { epoch: u64 },
    /// Timer fired; the asset is being loaded off the display task
    Preparing { epoch: u64, asset: String },
    Attract { media: AttractMedia },
}

#[derive(Debug)]
pub enum IdleInput {
    /// Pointer, key, touch or navigation
    Activity,
    TimerFired { epoch: u64 },
    Prepared { epoch: u64, media: Option<AttractMedia> },
    ConfigChanged(AttractConfig),
}

#[derive(Debug, Clone)]
pub enum IdleCommand {
    /// Replace any pending countdown with one firing after `after`
    ArmTimer { epoch: u64, after: Duration },
    CancelTimer,
    PrepareAsset { epoch: u64, asset: String, kind: AttractKind },
    Show(AttractMedia),
    Hide,
}

#[derive(Debug)]
pub struct IdleMachine {
    state: IdleState,
    config: AttractConfig,
    epoch: u64,
}

impl Default for IdleMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: IdleState::Disabled,
            config: AttractConfig::default(),
            epoch: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &IdleState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &AttractConfig {
        &self.config
    }

    pub fn handle(&mut self, input: IdleInput) -> Vec<IdleCommand> {
        match input {
            IdleInput::Activity => self.on_activity(),
            IdleInput::TimerFired { epoch } => self.on_timer(epoch),
            IdleInput::Prepared { epoch, media } => self.on_prepared(epoch, media),
            IdleInput::ConfigChanged(config) => self.on_config(config),
        }
    }

    fn on_activity(&mut self) -> Vec<IdleCommand> {
        let mut commands = Vec::new();
        if matches!(self.state, IdleState::Attract { .. }) {
            debug!("Activity while attract mode shown, hiding");
            commands.push(IdleCommand::Hide);
        }
        commands.push(self.arm());
        commands
    }

    fn on_timer(&mut self, epoch: u64) -> Vec<IdleCommand> {
        match self.state {
            IdleState::CountingDown { epoch: current } if current == epoch => {}
            _ => {
                debug!(epoch = epoch, current = self.epoch, "Ignoring stale idle timer");
                return Vec::new();
            }
        }

        let Some(asset) = self.config.asset_ref.clone() else {
            self.state = IdleState::Disabled;
            return Vec::new();
        };

        let Some(kind) = AttractKind::from_ref(&asset) else {
            warn!(asset = %asset, "Unsupported attract asset type");
            return vec![self.arm()];
        };

        info!(asset = %asset, kind = ?kind, "Idle timeout reached, preparing attract mode");
        self.state = IdleState::Preparing {
            epoch,
            asset: asset.clone(),
        };
        vec![IdleCommand::PrepareAsset { epoch, asset, kind }]
    }

    fn on_prepared(&mut self, epoch: u64, media: Option<AttractMedia>) -> Vec<IdleCommand> {
        match &self.state {
            IdleState::Preparing { epoch: current, .. } if *current == epoch => {}
            _ => {
                debug!(epoch = epoch, "Discarding stale attract preparation");
                return Vec::new();
            }
        }

        match media {
            Some(media) => {
                info!(asset = %media.asset(), "Attract mode shown");
                self.state = IdleState::Attract {
                    media: media.clone(),
                };
                vec![IdleCommand::Show(media)]
            }
            None => {
                warn!("Attract asset could not be prepared, re-arming idle timer");
                vec![self.arm()]
            }
        }
    }

    fn on_config(&mut self, config: AttractConfig) -> Vec<IdleCommand> {
        let config = config.normalized();
        self.config = config;

        if let IdleState::Attract { media } = &self.state {
            let same_asset = self.config.is_enabled()
                && self.config.asset_ref.as_deref() == Some(media.asset());
            if same_asset {
                return Vec::new();
            }
            return vec![IdleCommand::Hide, self.arm()];
        }

        vec![self.arm()]
    }

    /// Start a fresh countdown from now, or disable when unconfigured
    fn arm(&mut self) -> IdleCommand {
        self.epoch += 1;
        match self.config.idle_timeout() {
            Some(after) => {
                self.state = IdleState::CountingDown { epoch: self.epoch };
                IdleCommand::ArmTimer {
                    epoch: self.epoch,
                    after,
                }
            }
            None => {
                self.state = IdleState::Disabled;
                IdleCommand::CancelTimer
            }
        }
    }
}
