//! Content repository: settings, menu tree and pages served to displays
//!
//! Durable storage is outside this crate; the in-memory implementation is
//! seeded from an optional JSON snapshot file at startup.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::models::{AttractConfig, KioskConfig, MenuNode, Page, SettingsUpdate, Theme, ThemeUpdate};
use crate::{Error, Result};

/// Synchronous content access used by the HTTP layer
pub trait ContentRepository: Send + Sync {
    fn settings(&self) -> KioskConfig;
    fn menu(&self) -> Vec<MenuNode>;
    fn page(&self, slug: &str) -> Option<Page>;

    fn update_settings(&self, update: SettingsUpdate) -> KioskConfig;
    fn update_theme(&self, update: ThemeUpdate) -> Theme;
    fn update_attract(&self, attract: AttractConfig) -> AttractConfig;
    fn replace_menu(&self, menu: Vec<MenuNode>) -> Result<Vec<MenuNode>>;
    fn upsert_page(&self, page: Page) -> Result<Page>;
    fn delete_page(&self, slug: &str) -> Result<()>;
}

/// Serialized form of the whole content set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
    pub config: KioskConfig,
    pub menu: Vec<MenuNode>,
    pub pages: Vec<Page>,
}

#[derive(Debug, Default)]
struct ContentState {
    config: KioskConfig,
    menu: Vec<MenuNode>,
    pages: BTreeMap<String, Page>,
}

/// `RwLock`-guarded content set
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    state: RwLock<ContentState>,
}

impl InMemoryContentRepository {
    #[must_use]
    pub fn new(snapshot: ContentSnapshot) -> Self {
        let mut menu = snapshot.menu;
        MenuNode::sort_tree(&mut menu);
        let pages = snapshot
            .pages
            .into_iter()
            .map(|page| (page.slug.clone(), page))
            .collect();
        Self {
            state: RwLock::new(ContentState {
                config: snapshot.config,
                menu,
                pages,
            }),
        }
    }

    /// Seed from a JSON snapshot file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let snapshot: ContentSnapshot = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            menu_entries = snapshot.menu.len(),
            pages = snapshot.pages.len(),
            "Content repository seeded from file"
        );
        Ok(Self::new(snapshot))
    }

    #[must_use]
    pub fn snapshot(&self) -> ContentSnapshot {
        let state = self.state.read();
        ContentSnapshot {
            config: state.config.clone(),
            menu: state.menu.clone(),
            pages: state.pages.values().cloned().collect(),
        }
    }
}

impl ContentRepository for InMemoryContentRepository {
    fn settings(&self) -> KioskConfig {
        self.state.read().config.clone()
    }

    fn menu(&self) -> Vec<MenuNode> {
        self.state.read().menu.clone()
    }

    fn page(&self, slug: &str) -> Option<Page> {
        self.state.read().pages.get(slug).cloned()
    }

    fn update_settings(&self, update: SettingsUpdate) -> KioskConfig {
        let mut state = self.state.write();
        update.apply(&mut state.config);
        state.config.clone()
    }

    fn update_theme(&self, update: ThemeUpdate) -> Theme {
        let mut state = self.state.write();
        update.apply(&mut state.config.theme);
        state.config.theme.clone()
    }

    fn update_attract(&self, attract: AttractConfig) -> AttractConfig {
        let mut state = self.state.write();
        state.config.screensaver = attract.normalized();
        state.config.screensaver.clone()
    }

    fn replace_menu(&self, mut menu: Vec<MenuNode>) -> Result<Vec<MenuNode>> {
        for node in &menu {
            let buttons: Vec<_> = match node {
                MenuNode::Button(button) => vec![button],
                MenuNode::Group(group) => group.items.iter().collect(),
            };
            if let Some(button) = buttons.iter().find(|b| b.target_slug.trim().is_empty()) {
                return Err(Error::InvalidInput(format!(
                    "Button {} has an empty target slug",
                    button.id
                )));
            }
        }
        MenuNode::sort_tree(&mut menu);
        self.state.write().menu = menu.clone();
        Ok(menu)
    }

    fn upsert_page(&self, page: Page) -> Result<Page> {
        if page.slug.trim().is_empty() {
            return Err(Error::InvalidInput("Page slug must not be empty".to_string()));
        }
        let mut state = self.state.write();
        if page.is_home {
            for other in state.pages.values_mut() {
                other.is_home = false;
            }
        }
        state.pages.insert(page.slug.clone(), page.clone());
        Ok(page)
    }

    fn delete_page(&self, slug: &str) -> Result<()> {
        self.state
            .write()
            .pages
            .remove(slug)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Page '{slug}' not found")))
    }
}
