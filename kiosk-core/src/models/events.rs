use serde::{Deserialize, Serialize};

/// What changed on the content server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Settings, theme or attract-mode configuration changed
    ConfigUpdated,
    /// Navigation buttons, groups or pages changed
    MenuUpdated,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigUpdated => "config_updated",
            Self::MenuUpdated => "menu_updated",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change notification pushed to every connected display
///
/// Wire form: `{"type": "config_updated"}`, optionally with an opaque `payload`.
/// Events are never persisted or replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ChangeEvent {
    #[must_use]
    pub const fn new(kind: ChangeKind) -> Self {
        Self { kind, payload: None }
    }

    #[must_use]
    pub const fn config_updated() -> Self {
        Self::new(ChangeKind::ConfigUpdated)
    }

    #[must_use]
    pub const fn menu_updated() -> Self {
        Self::new(ChangeKind::MenuUpdated)
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Page named by a `menu_updated` payload, if any
    #[must_use]
    pub fn page_slug(&self) -> Option<&str> {
        self.payload.as_ref()?.get("slug")?.as_str()
    }

    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Parse a frame body; unknown kinds and non-JSON input are errors
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
