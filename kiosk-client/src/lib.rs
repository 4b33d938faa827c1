// Kiosk display client
//
// Keeps a display in sync with the content server: consumes the change
// stream, re-fetches what changed, drives attract mode and materialises media
// for the renderer.

pub mod backend;
pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod idle;
pub mod media;
pub mod runtime;
pub mod sync;
pub mod view;
pub mod weather;

pub use backend::{BackendClient, ContentSource};
pub use consumer::{ConnectionState, EventConsumer};
pub use dispatch::{ui_channel, Activity, UiHandle, UiMessage, UiQueue};
pub use error::{ClientError, Result};
pub use runtime::DisplayRuntime;
pub use view::{AttractSurface, KioskView};
