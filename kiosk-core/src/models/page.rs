use serde::{Deserialize, Serialize};

/// Content block type; the renderer picks a widget per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Image,
    Video,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: i64,
    pub page_id: i64,
    pub kind: BlockKind,
    /// `{"html": ...}` for text, `{"path": ...}` for media blocks
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Block {
    /// Media reference of an image/video/pdf block
    #[must_use]
    pub fn media_path(&self) -> Option<&str> {
        self.content
            .get("path")
            .and_then(serde_json::Value::as_str)
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default)]
    pub blocks: Vec<Block>,
}
