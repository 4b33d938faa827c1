//! Rendering seams
//!
//! Widget painting lives outside this crate. The display task calls these
//! traits, always from its own task, with changes that have already been
//! reconciled and media that has already been materialised.

use kiosk_core::models::Page;
use std::path::Path;

use crate::consumer::ConnectionState;
use crate::idle::AttractMedia;
use crate::media::BlockMedia;
use crate::sync::ViewChange;
use crate::weather::WeatherReport;

/// The main kiosk screen: header, menu, pages, footer
pub trait KioskView: Send {
    /// Rebuild one section
    fn apply(&mut self, change: &ViewChange);

    /// Theme background image; `None` clears it
    fn set_background(&mut self, path: Option<&Path>);

    fn show_page(&mut self, page: &Page);

    fn show_home(&mut self);

    fn set_block_media(&mut self, slug: &str, block_id: i64, media: &BlockMedia);

    /// `None` hides the weather widget
    fn set_weather(&mut self, report: Option<&WeatherReport>);

    fn set_connection(&mut self, _state: ConnectionState) {}
}

/// Full-screen overlay used in attract mode
pub trait AttractSurface: Send {
    fn show(&mut self, media: &AttractMedia);
    fn hide(&mut self);
}
