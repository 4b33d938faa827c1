//! Display runtime
//!
//! The single task that owns all display state: the view, the attract surface,
//! the synchronizer and the idle machine. Everything slow runs in spawned tasks
//! that report back through the UI queue, so this loop never blocks on the
//! network or the disk.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kiosk_core::models::{ChangeEvent, ChangeKind, Page, WeatherState};

use crate::backend::ContentSource;
use crate::dispatch::{ui_channel, Activity, UiHandle, UiMessage, UiQueue};
use crate::idle::{IdleCommand, IdleInput, IdleMachine};
use crate::media::MediaClient;
use crate::sync::{ConfigSynchronizer, SyncTrigger, ViewChange};
use crate::view::{AttractSurface, KioskView};
use crate::weather::{WeatherClient, REFRESH_INTERVAL};

pub struct DisplayRuntime {
    source: Arc<dyn ContentSource>,
    media: MediaClient,
    weather: Option<WeatherClient>,
    view: Box<dyn KioskView>,
    surface: Box<dyn AttractSurface>,
    handle: UiHandle,
    queue: UiQueue,
    poll_interval: Duration,

    sync: ConfigSynchronizer,
    syncs_in_flight: usize,
    last_sync_seq: u64,
    idle: IdleMachine,
    idle_deadline: Option<(u64, Instant)>,
    weather_city: Option<String>,
    weather_deadline: Option<Instant>,
    background: Option<String>,
    current_page: Option<String>,
    page_request: u64,
}

impl DisplayRuntime {
    pub fn new(
        source: Arc<dyn ContentSource>,
        media: MediaClient,
        view: Box<dyn KioskView>,
        surface: Box<dyn AttractSurface>,
        poll_interval: Duration,
    ) -> Self {
        let (handle, queue) = ui_channel();
        Self {
            source,
            media,
            weather: None,
            view,
            surface,
            handle,
            queue,
            poll_interval: poll_interval.max(Duration::from_secs(1)),
            sync: ConfigSynchronizer::new(),
            syncs_in_flight: 0,
            last_sync_seq: 0,
            idle: IdleMachine::new(),
            idle_deadline: None,
            weather_city: None,
            weather_deadline: None,
            background: None,
            current_page: None,
            page_request: 0,
        }
    }

    #[must_use]
    pub fn with_weather(mut self, weather: WeatherClient) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Sender for input sources and background workers
    #[must_use]
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Display runtime started"
        );
        self.spawn_sync(SyncTrigger::Initial);

        let mut poll = tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let idle_deadline = self.idle_deadline;
            let weather_deadline = self.weather_deadline;

            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Display runtime shutting down");
                    break;
                }
                message = self.queue.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
                _ = poll.tick() => self.on_poll(),
                epoch = idle_timer(idle_deadline) => {
                    self.idle_deadline = None;
                    self.run_idle(IdleInput::TimerFired { epoch });
                }
                () = deadline(weather_deadline) => self.refresh_weather(),
            }
        }
    }

    fn handle_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::Change(event) => {
                info!(event_type = %event.event_type(), "Content change announced");
                self.spawn_sync(SyncTrigger::from_event(event.kind));
                self.refresh_page_for(&event);
            }
            UiMessage::Stream(state) => self.view.set_connection(state),
            UiMessage::Activity(activity) => self.on_activity(activity),
            UiMessage::Synced(fetch) => {
                self.syncs_in_flight = self.syncs_in_flight.saturating_sub(1);
                for change in self.sync.reconcile(fetch) {
                    self.apply_change(change);
                }
            }
            UiMessage::PageLoaded {
                slug,
                request,
                page,
            } => self.on_page_loaded(slug, request, page),
            UiMessage::BlockReady {
                slug,
                block_id,
                media,
            } => {
                if self.current_page.as_deref() == Some(slug.as_str()) {
                    self.view.set_block_media(&slug, block_id, &media);
                }
            }
            UiMessage::BackgroundReady { reference, path } => {
                if self.background.as_deref() == Some(reference.as_str()) {
                    self.view.set_background(path.as_deref());
                }
            }
            UiMessage::AttractPrepared { epoch, media } => {
                self.run_idle(IdleInput::Prepared { epoch, media });
            }
            UiMessage::Weather { city, report } => {
                if self.weather_city.as_deref() == Some(city.as_str()) {
                    self.view.set_weather(report.as_ref());
                }
            }
        }
    }

    fn on_poll(&mut self) {
        if self.syncs_in_flight > 0 {
            debug!(in_flight = self.syncs_in_flight, "Skipping config poll, fetch in flight");
            return;
        }
        self.spawn_sync(SyncTrigger::Poll);
    }

    fn on_activity(&mut self, activity: Activity) {
        self.run_idle(IdleInput::Activity);
        match activity {
            Activity::Navigate(slug) => self.open_page(slug),
            Activity::Home => {
                self.current_page = None;
                self.view.show_home();
            }
            Activity::Pointer | Activity::Key | Activity::Touch => {}
        }
    }

    fn apply_change(&mut self, change: ViewChange) {
        self.view.apply(&change);
        match change {
            ViewChange::Theme(theme) => self.update_background(theme.bg_image_path),
            ViewChange::Weather(state) => self.update_weather(state),
            ViewChange::Attract(config) => self.run_idle(IdleInput::ConfigChanged(config)),
            ViewChange::Branding(_) | ViewChange::Menu(_) => {}
        }
    }

    fn run_idle(&mut self, input: IdleInput) {
        for command in self.idle.handle(input) {
            match command {
                IdleCommand::ArmTimer { epoch, after } => {
                    let now = Instant::now();
                    let at = now.checked_add(after).unwrap_or_else(|| far_future(now));
                    self.idle_deadline = Some((epoch, at));
                }
                IdleCommand::CancelTimer => self.idle_deadline = None,
                IdleCommand::PrepareAsset { epoch, asset, kind } => {
                    let media = self.media.clone();
                    let handle = self.handle.clone();
                    tokio::spawn(async move {
                        let media = media.prepare_attract(&asset, kind).await;
                        handle.dispatch(UiMessage::AttractPrepared { epoch, media });
                    });
                }
                IdleCommand::Show(media) => self.surface.show(&media),
                IdleCommand::Hide => self.surface.hide(),
            }
        }
    }

    fn spawn_sync(&mut self, trigger: SyncTrigger) {
        self.syncs_in_flight += 1;
        self.last_sync_seq += 1;
        let seq = self.last_sync_seq;
        let source = self.source.clone();
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let fetch = ConfigSynchronizer::fetch(source.as_ref(), trigger, seq).await;
            handle.dispatch(UiMessage::Synced(fetch));
        });
    }

    /// Re-fetch the open page when a change may have touched it
    fn refresh_page_for(&mut self, event: &ChangeEvent) {
        let Some(current) = self.current_page.clone() else {
            return;
        };
        let affected = match event.kind {
            ChangeKind::ConfigUpdated => true,
            ChangeKind::MenuUpdated => event.page_slug().is_none_or(|slug| slug == current),
        };
        if affected {
            debug!(slug = %current, "Refreshing open page");
            self.open_page(current);
        }
    }

    fn open_page(&mut self, slug: String) {
        self.current_page = Some(slug.clone());
        self.page_request += 1;
        let request = self.page_request;
        let source = self.source.clone();
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let page = source
                .fetch_page(&slug)
                .await
                .map_err(|e| warn!(slug = %slug, error = %e, "Page fetch failed"))
                .ok();
            handle.dispatch(UiMessage::PageLoaded {
                slug,
                request,
                page,
            });
        });
    }

    fn on_page_loaded(&mut self, slug: String, request: u64, page: Option<Page>) {
        if request != self.page_request || self.current_page.as_deref() != Some(slug.as_str()) {
            debug!(slug = %slug, request, "Discarding page for stale navigation");
            return;
        }
        let Some(page) = page else {
            return;
        };

        self.view.show_page(&page);
        for block in page.blocks {
            let media = self.media.clone();
            let handle = self.handle.clone();
            let slug = slug.clone();
            tokio::spawn(async move {
                if let Some(media) = media.prepare_block(&block).await {
                    handle.dispatch(UiMessage::BlockReady {
                        slug,
                        block_id: block.id,
                        media,
                    });
                }
            });
        }
    }

    fn update_background(&mut self, reference: Option<String>) {
        self.background.clone_from(&reference);
        let Some(reference) = reference else {
            self.view.set_background(None);
            return;
        };

        let media = self.media.clone();
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let path = media.ensure_background(&reference).await;
            handle.dispatch(UiMessage::BackgroundReady { reference, path });
        });
    }

    fn update_weather(&mut self, state: WeatherState) {
        match (state.show, state.city, self.weather.is_some()) {
            (true, Some(city), true) => {
                self.weather_city = Some(city);
                self.weather_deadline = Some(Instant::now());
            }
            _ => {
                self.weather_city = None;
                self.weather_deadline = None;
                self.view.set_weather(None);
            }
        }
    }

    fn refresh_weather(&mut self) {
        self.weather_deadline = Some(Instant::now() + REFRESH_INTERVAL);
        let (Some(weather), Some(city)) = (self.weather.clone(), self.weather_city.clone()) else {
            self.weather_deadline = None;
            return;
        };

        let handle = self.handle.clone();
        tokio::spawn(async move {
            let report = weather.fetch(&city).await;
            handle.dispatch(UiMessage::Weather { city, report });
        });
    }
}

/// Stand-in deadline for countdowns too long to represent
fn far_future(now: Instant) -> Instant {
    // roughly thirty years
    now + Duration::from_secs(86_400 * 365 * 30)
}

/// Resolves with the epoch once the countdown elapses; never without one
async fn idle_timer(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((epoch, at)) => {
            tokio::time::sleep_until(at).await;
            epoch
        }
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockContentSource;
    use crate::error::ClientError;
    use crate::idle::AttractMedia;
    use crate::media::BlockMedia;
    use crate::weather::WeatherReport;
    use async_trait::async_trait;
    use kiosk_core::models::{AttractConfig, Block, BlockKind, KioskConfig, MenuButton, MenuNode};
    use kiosk_core::{ChangeEvent, MediaCache};
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    struct RecordingView(Log);

    impl KioskView for RecordingView {
        fn apply(&mut self, change: &ViewChange) {
            let entry = match change {
                ViewChange::Branding(b) => format!("branding {}", b.org_name),
                ViewChange::Theme(_) => "theme".to_string(),
                ViewChange::Weather(_) => "weather".to_string(),
                ViewChange::Attract(_) => "attract".to_string(),
                ViewChange::Menu(m) => format!("menu {}", m.len()),
            };
            self.0.lock().push(entry);
        }

        fn set_background(&mut self, path: Option<&Path>) {
            self.0.lock().push(format!("background {}", path.is_some()));
        }

        fn show_page(&mut self, page: &Page) {
            self.0.lock().push(format!("page {}", page.slug));
        }

        fn show_home(&mut self) {
            self.0.lock().push("home".to_string());
        }

        fn set_block_media(&mut self, _slug: &str, block_id: i64, media: &BlockMedia) {
            let kind = match media {
                BlockMedia::Image(_) => "image",
                BlockMedia::Video(_) => "video",
                BlockMedia::Pdf(_) => "pdf",
                BlockMedia::Unavailable => "unavailable",
            };
            self.0.lock().push(format!("block {block_id} {kind}"));
        }

        fn set_weather(&mut self, report: Option<&WeatherReport>) {
            self.0.lock().push(format!("weather-widget {}", report.is_some()));
        }
    }

    struct RecordingSurface(Log);

    impl AttractSurface for RecordingSurface {
        fn show(&mut self, media: &AttractMedia) {
            self.0.lock().push(format!("show {}", media.asset()));
        }

        fn hide(&mut self) {
            self.0.lock().push("hide".to_string());
        }
    }

    struct Harness {
        view: Log,
        surface: Log,
        handle: UiHandle,
        cancel: CancellationToken,
        _dir: tempfile::TempDir,
    }

    fn start(source: impl ContentSource + 'static, poll_interval: Duration) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            MediaCache::with_client(reqwest::Client::new(), "http://127.0.0.1:9", dir.path()).unwrap();
        let view: Log = Arc::default();
        let surface: Log = Arc::default();

        let runtime = DisplayRuntime::new(
            Arc::new(source),
            MediaClient::new(cache),
            Box::new(RecordingView(view.clone())),
            Box::new(RecordingSurface(surface.clone())),
            poll_interval,
        );
        let handle = runtime.handle();
        let cancel = CancellationToken::new();
        tokio::spawn(runtime.run(cancel.clone()));

        Harness {
            view,
            surface,
            handle,
            cancel,
            _dir: dir,
        }
    }

    fn attract_config(timeout: i64) -> KioskConfig {
        KioskConfig {
            org_name: "Harbour Museum".to_string(),
            screensaver: AttractConfig::new(Some("/srv/kiosk/loop.mp4".to_string()), timeout),
            ..KioskConfig::default()
        }
    }

    /// Section rebuilds only, without background and weather widget calls
    fn rebuilds(log: &Log) -> Vec<String> {
        log.lock()
            .iter()
            .filter(|entry| !entry.starts_with("background") && !entry.starts_with("weather-widget"))
            .cloned()
            .collect()
    }

    fn buttons(count: i64) -> Vec<MenuNode> {
        (0..count)
            .map(|id| {
                MenuNode::Button(MenuButton {
                    id,
                    title: format!("Button {id}"),
                    target_slug: format!("page-{id}"),
                    order_index: id,
                    bg_color: None,
                    text_color: None,
                    icon_path: None,
                })
            })
            .collect()
    }

    fn empty_page(slug: &str) -> Page {
        Page {
            id: 1,
            slug: slug.to_string(),
            title: slug.to_string(),
            is_home: false,
            blocks: Vec::new(),
        }
    }

    /// Menu source whose first refetch after startup answers late and stale
    #[derive(Default)]
    struct SlowFirstRefetch {
        menu_calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentSource for SlowFirstRefetch {
        async fn fetch_config(&self) -> crate::error::Result<KioskConfig> {
            Ok(KioskConfig::default())
        }

        async fn fetch_menu(&self) -> crate::error::Result<Vec<MenuNode>> {
            match self.menu_calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(Vec::new()),
                1 => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(buttons(1))
                }
                _ => Ok(buttons(2)),
            }
        }

        async fn fetch_page(&self, slug: &str) -> crate::error::Result<Page> {
            Err(ClientError::Network(format!("no page {slug}")))
        }
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_attract_active_cycle() {
        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .returning(|| Ok(attract_config(1)));
        source.expect_fetch_menu().returning(|| Ok(Vec::new()));

        let harness = start(source, Duration::from_secs(3600));

        settle(500).await;
        assert!(harness.view.lock().contains(&"branding Harbour Museum".to_string()));
        assert!(harness.surface.lock().is_empty());

        settle(1000).await;
        assert_eq!(*harness.surface.lock(), ["show /srv/kiosk/loop.mp4"]);

        harness.handle.dispatch(UiMessage::Activity(Activity::Touch));
        settle(10).await;
        assert_eq!(harness.surface.lock().last().map(String::as_str), Some("hide"));

        // the countdown restarts from the activity
        settle(500).await;
        assert_eq!(harness.surface.lock().len(), 2);
        settle(1000).await;
        assert_eq!(harness.surface.lock().len(), 3);

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_attract_never_shows() {
        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .returning(|| Ok(attract_config(0)));
        source.expect_fetch_menu().returning(|| Ok(Vec::new()));

        let harness = start(source, Duration::from_secs(5));

        settle(60_000).await;
        assert!(harness.surface.lock().is_empty());
        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_events_refetch_only_what_changed() {
        let config = Arc::new(Mutex::new(attract_config(30)));
        let config_calls = Arc::new(AtomicUsize::new(0));
        let menu_calls = Arc::new(AtomicUsize::new(0));

        let mut source = MockContentSource::new();
        {
            let config = config.clone();
            let calls = config_calls.clone();
            source.expect_fetch_config().returning(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(config.lock().clone())
            });
        }
        {
            let calls = menu_calls.clone();
            source.expect_fetch_menu().returning(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            });
        }

        let harness = start(source, Duration::from_secs(3600));
        settle(100).await;
        let initial = rebuilds(&harness.view).len();
        assert_eq!(initial, 5);

        // nothing changed server-side: no rebuilds
        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::config_updated()));
        settle(100).await;
        assert_eq!(rebuilds(&harness.view).len(), initial);
        assert_eq!(config_calls.load(Ordering::SeqCst), 2);
        assert_eq!(menu_calls.load(Ordering::SeqCst), 2);

        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::menu_updated()));
        settle(100).await;
        assert_eq!(config_calls.load(Ordering::SeqCst), 2);
        assert_eq!(menu_calls.load(Ordering::SeqCst), 3);

        config.lock().org_name = "Harbour Museum & Aquarium".to_string();
        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::config_updated()));
        settle(100).await;
        let log = rebuilds(&harness.view);
        assert_eq!(log.len(), initial + 1);
        assert_eq!(log.last().unwrap(), "branding Harbour Museum & Aquarium");

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_changes_without_events() {
        let config = Arc::new(Mutex::new(attract_config(30)));

        let mut source = MockContentSource::new();
        {
            let config = config.clone();
            source
                .expect_fetch_config()
                .returning(move || Ok(config.lock().clone()));
        }
        source.expect_fetch_menu().times(1).returning(|| Ok(Vec::new()));

        let harness = start(source, Duration::from_secs(5));
        settle(100).await;

        config.lock().org_name = "Night Museum".to_string();
        settle(5_000).await;
        assert_eq!(harness.view.lock().last().unwrap(), "branding Night Museum");

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_loads_page_and_media() {
        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .returning(|| Ok(KioskConfig::default()));
        source.expect_fetch_menu().returning(|| Ok(Vec::new()));
        source
            .expect_fetch_page()
            .withf(|slug: &str| slug == "hours")
            .returning(|_| {
                Ok(Page {
                    id: 1,
                    slug: "hours".to_string(),
                    title: "Opening hours".to_string(),
                    is_home: false,
                    blocks: vec![
                        Block {
                            id: 10,
                            page_id: 1,
                            kind: BlockKind::Text,
                            content: serde_json::json!({"html": "<p>9-17</p>"}),
                        },
                        Block {
                            id: 11,
                            page_id: 1,
                            kind: BlockKind::Pdf,
                            content: serde_json::json!({"path": "/srv/kiosk/map.pdf"}),
                        },
                        Block {
                            id: 12,
                            page_id: 1,
                            kind: BlockKind::Video,
                            content: serde_json::json!({}),
                        },
                    ],
                })
            });

        let harness = start(source, Duration::from_secs(3600));
        settle(100).await;

        harness
            .handle
            .dispatch(UiMessage::Activity(Activity::Navigate("hours".to_string())));
        settle(100).await;

        let log = harness.view.lock().clone();
        assert!(log.contains(&"page hours".to_string()));
        assert!(log.contains(&"block 11 pdf".to_string()));
        assert!(log.contains(&"block 12 unavailable".to_string()));
        assert!(!log.iter().any(|entry| entry.starts_with("block 10")));

        harness.handle.dispatch(UiMessage::Activity(Activity::Home));
        settle(10).await;
        assert_eq!(harness.view.lock().last().unwrap(), "home");

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_menu_fetch_does_not_overwrite_newer() {
        let harness = start(SlowFirstRefetch::default(), Duration::from_secs(3600));
        settle(100).await;

        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::menu_updated()));
        settle(10).await;
        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::menu_updated()));
        settle(60_000).await;

        let menus: Vec<String> = harness
            .view
            .lock()
            .iter()
            .filter(|entry| entry.starts_with("menu"))
            .cloned()
            .collect();
        assert_eq!(menus, ["menu 0", "menu 2"]);

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_idle_timeout_keeps_runtime_alive() {
        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .returning(|| Ok(attract_config(i64::MAX)));
        source.expect_fetch_menu().returning(|| Ok(Vec::new()));
        source
            .expect_fetch_page()
            .returning(|slug| Ok(empty_page(slug)));

        let harness = start(source, Duration::from_secs(3600));
        settle(100).await;
        assert!(harness.view.lock().contains(&"attract".to_string()));

        harness.handle.dispatch(UiMessage::Activity(Activity::Touch));
        harness
            .handle
            .dispatch(UiMessage::Activity(Activity::Navigate("hours".to_string())));
        settle(100).await;

        assert_eq!(harness.view.lock().last().unwrap(), "page hours");
        assert!(harness.surface.lock().is_empty());

        harness.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_changes_refresh_open_page() {
        let page_calls = Arc::new(AtomicUsize::new(0));

        let mut source = MockContentSource::new();
        source
            .expect_fetch_config()
            .returning(|| Ok(KioskConfig::default()));
        source.expect_fetch_menu().returning(|| Ok(Vec::new()));
        {
            let calls = page_calls.clone();
            source.expect_fetch_page().returning(move |slug| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(empty_page(slug))
            });
        }

        let harness = start(source, Duration::from_secs(3600));
        settle(100).await;

        // nothing open yet
        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::config_updated()));
        settle(100).await;
        assert_eq!(page_calls.load(Ordering::SeqCst), 0);

        harness
            .handle
            .dispatch(UiMessage::Activity(Activity::Navigate("hours".to_string())));
        settle(100).await;
        assert_eq!(page_calls.load(Ordering::SeqCst), 1);

        let events = [
            (ChangeEvent::menu_updated().with_payload(serde_json::json!({"slug": "hours"})), 2),
            (ChangeEvent::menu_updated().with_payload(serde_json::json!({"slug": "events"})), 2),
            (ChangeEvent::menu_updated(), 3),
            (ChangeEvent::config_updated(), 4),
        ];
        for (event, expected) in events {
            harness.handle.dispatch(UiMessage::Change(event));
            settle(100).await;
            assert_eq!(page_calls.load(Ordering::SeqCst), expected);
        }

        let shown = harness
            .view
            .lock()
            .iter()
            .filter(|entry| *entry == "page hours")
            .count();
        assert_eq!(shown, 4);

        // back home: changes no longer touch pages
        harness.handle.dispatch(UiMessage::Activity(Activity::Home));
        harness
            .handle
            .dispatch(UiMessage::Change(ChangeEvent::config_updated()));
        settle(100).await;
        assert_eq!(page_calls.load(Ordering::SeqCst), 4);

        harness.cancel.cancel();
    }
}
