use serde::{Deserialize, Serialize};

/// A navigation button on the home screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    pub id: i64,
    pub title: String,
    pub target_slug: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub icon_path: Option<String>,
}

/// A titled group of buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuGroup {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub items: Vec<MenuButton>,
}

/// Top-level entry of the menu tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuNode {
    Group(MenuGroup),
    Button(MenuButton),
}

impl MenuNode {
    #[must_use]
    pub const fn order_index(&self) -> i64 {
        match self {
            Self::Group(group) => group.order_index,
            Self::Button(button) => button.order_index,
        }
    }

    /// Sort top-level entries and the buttons inside each group
    pub fn sort_tree(nodes: &mut [Self]) {
        for node in nodes.iter_mut() {
            if let Self::Group(group) = node {
                group.items.sort_by_key(|b| b.order_index);
            }
        }
        nodes.sort_by_key(Self::order_index);
    }
}
