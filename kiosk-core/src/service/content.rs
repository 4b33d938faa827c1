use std::sync::Arc;
use tracing::info;

use crate::models::{
    AttractConfig, ChangeEvent, KioskConfig, MenuNode, Page, SettingsUpdate, Theme, ThemeUpdate,
};
use crate::repository::ContentRepository;
use crate::service::ChangeBroadcaster;
use crate::{Error, Result};

/// Content reads plus the publishing hook behind every admin mutation
///
/// Each successful write publishes exactly one change event. Displays decide
/// for themselves whether anything visible changed.
#[derive(Clone)]
pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
    broadcaster: ChangeBroadcaster,
}

impl ContentService {
    pub fn new(repository: Arc<dyn ContentRepository>, broadcaster: ChangeBroadcaster) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    #[must_use]
    pub const fn broadcaster(&self) -> &ChangeBroadcaster {
        &self.broadcaster
    }

    #[must_use]
    pub fn config(&self) -> KioskConfig {
        self.repository.settings()
    }

    #[must_use]
    pub fn menu(&self) -> Vec<MenuNode> {
        self.repository.menu()
    }

    pub fn page(&self, slug: &str) -> Result<Page> {
        self.repository
            .page(slug)
            .ok_or_else(|| Error::NotFound(format!("Page '{slug}' not found")))
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> KioskConfig {
        let config = self.repository.update_settings(update);
        self.notify(ChangeEvent::config_updated());
        config
    }

    pub fn update_theme(&self, update: ThemeUpdate) -> Theme {
        let theme = self.repository.update_theme(update);
        self.notify(ChangeEvent::config_updated());
        theme
    }

    pub fn update_attract(&self, attract: AttractConfig) -> AttractConfig {
        let attract = self.repository.update_attract(attract);
        info!(
            asset = ?attract.asset_ref,
            timeout_seconds = attract.idle_timeout_seconds,
            "Attract mode configuration updated"
        );
        self.notify(ChangeEvent::config_updated());
        attract
    }

    pub fn replace_menu(&self, menu: Vec<MenuNode>) -> Result<Vec<MenuNode>> {
        let menu = self.repository.replace_menu(menu)?;
        self.notify(ChangeEvent::menu_updated());
        Ok(menu)
    }

    pub fn upsert_page(&self, page: Page) -> Result<Page> {
        let page = self.repository.upsert_page(page)?;
        self.notify(
            ChangeEvent::menu_updated().with_payload(serde_json::json!({ "slug": page.slug })),
        );
        Ok(page)
    }

    pub fn delete_page(&self, slug: &str) -> Result<()> {
        self.repository.delete_page(slug)?;
        self.notify(ChangeEvent::menu_updated().with_payload(serde_json::json!({ "slug": slug })));
        Ok(())
    }

    /// Publish an event to every connected display
    pub fn notify(&self, event: ChangeEvent) -> usize {
        let delivered = self.broadcaster.publish(event.clone());
        info!(
            event_type = %event.event_type(),
            delivered = delivered,
            "Displays notified of content change"
        );
        delivered
    }
}
