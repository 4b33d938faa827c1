//! Config synchronizer
//!
//! Maps change triggers to re-fetches and reconciles the results against what
//! the display last applied, so the view only rebuilds sections that actually
//! changed.

use kiosk_core::models::{AttractConfig, ChangeKind, KioskConfig, MenuNode, Theme, WeatherState};
use tracing::{debug, warn};

use crate::backend::ContentSource;

/// Why a re-fetch happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// First load at startup
    Initial,
    /// `config_updated` event: configuration and menu
    ConfigUpdated,
    /// `menu_updated` event: menu only
    MenuUpdated,
    /// Fallback timer: configuration only
    Poll,
}

impl SyncTrigger {
    #[must_use]
    pub const fn from_event(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::ConfigUpdated => Self::ConfigUpdated,
            ChangeKind::MenuUpdated => Self::MenuUpdated,
        }
    }

    #[must_use]
    pub const fn wants_config(self) -> bool {
        matches!(self, Self::Initial | Self::ConfigUpdated | Self::Poll)
    }

    #[must_use]
    pub const fn wants_menu(self) -> bool {
        matches!(self, Self::Initial | Self::ConfigUpdated | Self::MenuUpdated)
    }
}

/// Fetch results; a section is `None` when it wasn't requested or the fetch failed
#[derive(Debug, Clone)]
pub struct SyncFetch {
    pub trigger: SyncTrigger,
    /// Issue order of the fetch; results can arrive out of order
    pub seq: u64,
    pub config: Option<KioskConfig>,
    pub menu: Option<Vec<MenuNode>>,
}

/// Header/footer branding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub org_name: String,
    pub logo_path: Option<String>,
    pub footer_qr_text: String,
    pub footer_clock_format: String,
}

impl From<&KioskConfig> for Branding {
    fn from(config: &KioskConfig) -> Self {
        Self {
            org_name: config.org_name.clone(),
            logo_path: config.theme.logo_path.clone(),
            footer_qr_text: config.footer_qr_text.clone(),
            footer_clock_format: config.footer_clock_format.clone(),
        }
    }
}

/// A section of the display that needs re-rendering
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    Branding(Branding),
    Theme(Theme),
    Weather(WeatherState),
    Attract(AttractConfig),
    Menu(Vec<MenuNode>),
}

/// Last-applied state per section
#[derive(Debug, Default)]
pub struct ConfigSynchronizer {
    branding: Option<Branding>,
    /// Theme without the logo, which belongs to branding
    palette: Option<Theme>,
    weather: Option<WeatherState>,
    attract: Option<AttractConfig>,
    menu: Option<Vec<MenuNode>>,
    /// Newest fetch each section was taken from
    config_seq: u64,
    menu_seq: u64,
}

/// Whether a section fetched by `seq` is newer than what was last applied
fn advance(applied: &mut u64, seq: u64) -> bool {
    if seq <= *applied {
        return false;
    }
    *applied = seq;
    true
}

impl ConfigSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the fetches `trigger` calls for; failures are logged and left empty
    pub async fn fetch(source: &dyn ContentSource, trigger: SyncTrigger, seq: u64) -> SyncFetch {
        let config = async {
            if !trigger.wants_config() {
                return None;
            }
            source
                .fetch_config()
                .await
                .map_err(|e| warn!(error = %e, trigger = ?trigger, "Config fetch failed"))
                .ok()
        };
        let menu = async {
            if !trigger.wants_menu() {
                return None;
            }
            source
                .fetch_menu()
                .await
                .map_err(|e| warn!(error = %e, trigger = ?trigger, "Menu fetch failed"))
                .ok()
        };

        let (config, menu) = futures::join!(config, menu);
        SyncFetch {
            trigger,
            seq,
            config,
            menu,
        }
    }

    /// Record fetched values and return the sections that differ from the last apply
    ///
    /// A section older than the one already applied is dropped.
    pub fn reconcile(&mut self, fetch: SyncFetch) -> Vec<ViewChange> {
        let mut changes = Vec::new();

        let config = match fetch.config {
            Some(config) if !advance(&mut self.config_seq, fetch.seq) => {
                debug!(seq = fetch.seq, applied = self.config_seq, "Dropping stale config");
                None
            }
            config => config,
        };
        let menu = match fetch.menu {
            Some(menu) if !advance(&mut self.menu_seq, fetch.seq) => {
                debug!(seq = fetch.seq, applied = self.menu_seq, "Dropping stale menu");
                None
            }
            menu => menu,
        };

        if let Some(config) = config {
            let branding = Branding::from(&config);
            if self.branding.as_ref() != Some(&branding) {
                self.branding = Some(branding.clone());
                changes.push(ViewChange::Branding(branding));
            }

            let palette = Theme {
                logo_path: None,
                ..config.theme.clone()
            };
            if self.palette.as_ref() != Some(&palette) {
                self.palette = Some(palette);
                changes.push(ViewChange::Theme(config.theme.clone()));
            }

            let weather = config.weather();
            if self.weather.as_ref() != Some(&weather) {
                self.weather = Some(weather.clone());
                changes.push(ViewChange::Weather(weather));
            }

            let attract = config.attract();
            if self.attract.as_ref() != Some(&attract) {
                self.attract = Some(attract.clone());
                changes.push(ViewChange::Attract(attract));
            }
        }

        if let Some(mut menu) = menu {
            MenuNode::sort_tree(&mut menu);
            if self.menu.as_ref() != Some(&menu) {
                self.menu = Some(menu.clone());
                changes.push(ViewChange::Menu(menu));
            }
        }

        debug!(
            trigger = ?fetch.trigger,
            seq = fetch.seq,
            changed = changes.len(),
            "Content reconciled"
        );
        changes
    }

    #[must_use]
    pub fn attract(&self) -> Option<&AttractConfig> {
        self.attract.as_ref()
    }

    #[must_use]
    pub fn weather(&self) -> Option<&WeatherState> {
        self.weather.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockContentSource;
    use crate::error::ClientError;
    use kiosk_core::models::MenuButton;

    fn config(org_name: &str) -> KioskConfig {
        KioskConfig {
            org_name: org_name.to_string(),
            screensaver: AttractConfig::new(Some("/media/loop.mp4".to_string()), 30),
            ..KioskConfig::default()
        }
    }

    fn menu() -> Vec<MenuNode> {
        vec![MenuNode::Button(MenuButton {
            id: 1,
            title: "Map".to_string(),
            target_slug: "map".to_string(),
            order_index: 0,
            bg_color: None,
            text_color: None,
            icon_path: None,
        })]
    }

    fn fetched(
        seq: u64,
        trigger: SyncTrigger,
        config: Option<KioskConfig>,
        menu: Option<Vec<MenuNode>>,
    ) -> SyncFetch {
        SyncFetch {
            trigger,
            seq,
            config,
            menu,
        }
    }

    #[test]
    fn test_trigger_scope() {
        assert!(SyncTrigger::ConfigUpdated.wants_config() && SyncTrigger::ConfigUpdated.wants_menu());
        assert!(!SyncTrigger::MenuUpdated.wants_config() && SyncTrigger::MenuUpdated.wants_menu());
        assert!(SyncTrigger::Poll.wants_config() && !SyncTrigger::Poll.wants_menu());
        assert_eq!(SyncTrigger::from_event(ChangeKind::MenuUpdated), SyncTrigger::MenuUpdated);
    }

    #[test]
    fn test_first_fetch_applies_everything() {
        let mut sync = ConfigSynchronizer::new();
        let changes = sync.reconcile(fetched(1, SyncTrigger::Initial, Some(config("Museum")), Some(menu())));

        assert_eq!(changes.len(), 5);
        assert!(matches!(&changes[0], ViewChange::Branding(b) if b.org_name == "Museum"));
        assert!(matches!(&changes[4], ViewChange::Menu(m) if m.len() == 1));
    }

    #[test]
    fn test_unchanged_reload_is_suppressed() {
        let mut sync = ConfigSynchronizer::new();
        let mut rebuilds = 0;

        for seq in 1..=3 {
            rebuilds += sync
                .reconcile(fetched(seq, SyncTrigger::ConfigUpdated, Some(config("Museum")), Some(menu())))
                .len();
        }
        assert_eq!(rebuilds, 5);

        // poll picks up only what changed
        let changes = sync.reconcile(fetched(4, SyncTrigger::Poll, Some(config("Gallery")), None));
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], ViewChange::Branding(b) if b.org_name == "Gallery"));
    }

    #[test]
    fn test_logo_change_is_branding_only() {
        let mut sync = ConfigSynchronizer::new();
        sync.reconcile(fetched(1, SyncTrigger::Initial, Some(config("Museum")), None));

        let mut updated = config("Museum");
        updated.theme.logo_path = Some("/media/logo.png".to_string());
        let changes = sync.reconcile(fetched(2, SyncTrigger::Poll, Some(updated), None));
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], ViewChange::Branding(_)));
    }

    #[test]
    fn test_weather_needs_show_and_city() {
        let mut sync = ConfigSynchronizer::new();
        sync.reconcile(fetched(1, SyncTrigger::Initial, Some(config("Museum")), None));

        let mut updated = config("Museum");
        updated.show_weather = true;
        // no city yet: still hidden, nothing to re-render
        assert!(sync
            .reconcile(fetched(2, SyncTrigger::Poll, Some(updated.clone()), None))
            .is_empty());

        updated.weather_city = Some("Reykjavik".to_string());
        let changes = sync.reconcile(fetched(3, SyncTrigger::Poll, Some(updated), None));
        assert!(matches!(&changes[..], [ViewChange::Weather(w)] if w.show));
    }

    #[test]
    fn test_late_older_fetch_is_dropped() {
        let mut sync = ConfigSynchronizer::new();
        let mut longer = menu();
        longer.extend(menu());

        // fetch 2 answers first
        let changes = sync.reconcile(fetched(2, SyncTrigger::MenuUpdated, None, Some(longer)));
        assert!(matches!(&changes[..], [ViewChange::Menu(m)] if m.len() == 2));

        // fetch 1 was issued earlier but lands later
        assert!(sync
            .reconcile(fetched(1, SyncTrigger::ConfigUpdated, Some(config("Museum")), Some(menu())))
            .iter()
            .all(|change| !matches!(change, ViewChange::Menu(_))));

        // its config is still the newest config seen
        assert_eq!(sync.attract().map(|a| a.idle_timeout_seconds), Some(30));
    }

    #[tokio::test]
    async fn test_fetch_follows_trigger_and_survives_failures() {
        let mut source = MockContentSource::new();
        source.expect_fetch_config().times(0);
        source
            .expect_fetch_menu()
            .times(1)
            .returning(|| Err(ClientError::Network("connection refused".to_string())));

        let fetch = ConfigSynchronizer::fetch(&source, SyncTrigger::MenuUpdated, 1).await;
        assert!(fetch.config.is_none());
        assert!(fetch.menu.is_none());

        let mut sync = ConfigSynchronizer::new();
        assert!(sync.reconcile(fetch).is_empty());
    }

    #[tokio::test]
    async fn test_poll_fetches_config_only() {
        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .times(1)
            .returning(|| Ok(KioskConfig::default()));
        source.expect_fetch_menu().times(0);

        let fetch = ConfigSynchronizer::fetch(&source, SyncTrigger::Poll, 1).await;
        assert_eq!(fetch.seq, 1);
        assert!(fetch.config.is_some());
        assert!(fetch.menu.is_none());
    }
}
