//! UI dispatch queue
//!
//! All display state lives on one task. Background work (the change stream,
//! HTTP fetches, media downloads) never touches that state; it posts a
//! [`UiMessage`] through a [`UiHandle`] and the display task applies it in
//! arrival order.

use kiosk_core::models::{ChangeEvent, Page};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::trace;

use crate::consumer::ConnectionState;
use crate::idle::AttractMedia;
use crate::media::BlockMedia;
use crate::sync::SyncFetch;
use crate::weather::WeatherReport;

/// User input that resets the idle countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Pointer,
    Key,
    Touch,
    /// Navigation to a page, e.g. a menu button press
    Navigate(String),
    /// Back to the home screen
    Home,
}

/// Work results and inputs marshalled onto the display task
#[derive(Debug)]
pub enum UiMessage {
    /// Parsed change stream event
    Change(ChangeEvent),
    /// Change stream connection state transition
    Stream(ConnectionState),
    Activity(Activity),
    /// Result of a config/menu re-fetch
    Synced(SyncFetch),
    /// Page fetched after navigation or a content change; `None` when the fetch failed
    PageLoaded {
        slug: String,
        /// Which page request this answers
        request: u64,
        page: Option<Page>,
    },
    /// Media for one block of the page currently shown
    BlockReady {
        slug: String,
        block_id: i64,
        media: BlockMedia,
    },
    /// Theme background image materialised (or not) in the cache
    BackgroundReady {
        reference: String,
        path: Option<PathBuf>,
    },
    /// Attract asset preparation finished
    AttractPrepared {
        epoch: u64,
        media: Option<AttractMedia>,
    },
    Weather {
        city: String,
        report: Option<WeatherReport>,
    },
}

/// Cloneable sender side of the UI queue
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiMessage>,
}

impl UiHandle {
    /// Queue a message for the display task; `false` once the display is gone
    pub fn dispatch(&self, message: UiMessage) -> bool {
        trace!(message = ?message, "Dispatching to UI");
        self.tx.send(message).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side, owned by the display task
#[derive(Debug)]
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiMessage>,
}

impl UiQueue {
    pub async fn recv(&mut self) -> Option<UiMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<UiMessage> {
        self.rx.try_recv().ok()
    }
}

#[must_use]
pub fn ui_channel() -> (UiHandle, UiQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiHandle { tx }, UiQueue { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (handle, mut queue) = ui_channel();
        assert!(handle.dispatch(UiMessage::Change(ChangeEvent::config_updated())));
        assert!(handle.dispatch(UiMessage::Activity(Activity::Touch)));

        assert!(matches!(queue.recv().await, Some(UiMessage::Change(_))));
        assert!(matches!(
            queue.recv().await,
            Some(UiMessage::Activity(Activity::Touch))
        ));
    }

    #[test]
    fn test_dispatch_fails_once_queue_dropped() {
        let (handle, queue) = ui_channel();
        drop(queue);
        assert!(handle.is_closed());
        assert!(!handle.dispatch(UiMessage::Activity(Activity::Key)));
    }
}
