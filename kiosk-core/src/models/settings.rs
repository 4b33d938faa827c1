use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Theme colours and images served with the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub name: String,
    pub primary: String,
    pub bg: String,
    pub text: String,
    pub logo_path: Option<String>,
    pub bg_image_path: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            primary: "#2563eb".to_string(),
            bg: "#f5f7fb".to_string(),
            text: "#0f1419".to_string(),
            logo_path: None,
            bg_image_path: None,
        }
    }
}

/// Longest idle countdown honoured; larger values are clamped to it
pub const MAX_IDLE_TIMEOUT_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Attract-mode settings, served as `screensaver: {path, timeout}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractConfig {
    #[serde(rename = "path")]
    pub asset_ref: Option<String>,
    #[serde(rename = "timeout")]
    pub idle_timeout_seconds: i64,
}

impl AttractConfig {
    #[must_use]
    pub fn new(asset_ref: Option<String>, idle_timeout_seconds: i64) -> Self {
        Self {
            asset_ref,
            idle_timeout_seconds,
        }
        .normalized()
    }

    /// Blank asset becomes `None`; timeout clamped to `0..=MAX_IDLE_TIMEOUT_SECONDS`
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            asset_ref: self
                .asset_ref
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            idle_timeout_seconds: self.idle_timeout_seconds.clamp(0, MAX_IDLE_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.idle_timeout_seconds > 0 && self.asset_ref.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Countdown length, never shorter than one second; `None` when disabled
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        if !self.is_enabled() {
            return None;
        }
        let secs = self.idle_timeout_seconds.clamp(1, MAX_IDLE_TIMEOUT_SECONDS);
        let secs = u64::try_from(secs).unwrap_or(1);
        Some(Duration::from_secs(secs))
    }
}

/// Header weather widget state; shown only with a city
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherState {
    pub show: bool,
    pub city: Option<String>,
}

impl WeatherState {
    #[must_use]
    pub fn new(show: bool, city: Option<&str>) -> Self {
        let city = city.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        if show && city.is_some() {
            Self { show: true, city }
        } else {
            Self { show: false, city: None }
        }
    }
}

/// Body of `GET /config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    pub org_name: String,
    pub footer_qr_text: String,
    pub footer_clock_format: String,
    pub theme: Theme,
    pub screensaver: AttractConfig,
    pub show_weather: bool,
    pub weather_city: Option<String>,
    pub exit_password_set: bool,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            org_name: "Organization".to_string(),
            footer_qr_text: String::new(),
            footer_clock_format: "%H:%M".to_string(),
            theme: Theme::default(),
            screensaver: AttractConfig::default(),
            show_weather: false,
            weather_city: None,
            exit_password_set: false,
        }
    }
}

impl KioskConfig {
    #[must_use]
    pub fn attract(&self) -> AttractConfig {
        self.screensaver.clone().normalized()
    }

    #[must_use]
    pub fn weather(&self) -> WeatherState {
        WeatherState::new(self.show_weather, self.weather_city.as_deref())
    }
}

/// Partial update for `PUT /admin/settings`; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub org_name: Option<String>,
    pub logo_path: Option<String>,
    pub footer_qr_text: Option<String>,
    pub footer_clock_format: Option<String>,
    pub show_weather: Option<bool>,
    pub weather_city: Option<String>,
}

impl SettingsUpdate {
    /// Apply onto `config`, returning whether anything changed
    pub fn apply(self, config: &mut KioskConfig) -> bool {
        let before = config.clone();
        if let Some(org_name) = self.org_name {
            config.org_name = org_name;
        }
        if let Some(logo_path) = self.logo_path {
            config.theme.logo_path = Some(logo_path).filter(|p| !p.is_empty());
        }
        if let Some(text) = self.footer_qr_text {
            config.footer_qr_text = text;
        }
        if let Some(format) = self.footer_clock_format {
            config.footer_clock_format = format;
        }
        if let Some(show) = self.show_weather {
            config.show_weather = show;
        }
        if let Some(city) = self.weather_city {
            config.weather_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());
        }
        *config != before
    }
}

/// Partial update for `PUT /admin/theme`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeUpdate {
    pub primary: Option<String>,
    pub bg: Option<String>,
    pub text: Option<String>,
    pub bg_image_path: Option<String>,
}

impl ThemeUpdate {
    pub fn apply(self, theme: &mut Theme) -> bool {
        let before = theme.clone();
        if let Some(primary) = self.primary.filter(|v| !v.is_empty()) {
            theme.primary = primary;
        }
        if let Some(bg) = self.bg.filter(|v| !v.is_empty()) {
            theme.bg = bg;
        }
        if let Some(text) = self.text.filter(|v| !v.is_empty()) {
            theme.text = text;
        }
        if let Some(path) = self.bg_image_path {
            theme.bg_image_path = Some(path).filter(|p| !p.is_empty());
        }
        *theme != before
    }
}
