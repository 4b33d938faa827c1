//! Change stream endpoint
//!
//! `GET /events` holds a server-sent event stream open per display. Each
//! published change becomes a `data:` frame; idle connections receive a
//! `: ping` comment every keep-alive interval so proxies and the client's
//! read timeout see traffic.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use kiosk_core::service::Subscription;
use tracing::{debug, info};

use crate::http::AppState;

pub fn create_events_router() -> Router<AppState> {
    Router::new().route("/events", get(change_stream))
}

/// Subscribe to content changes; the subscription lives as long as the response body
pub async fn change_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.content.broadcaster().subscribe();
    info!(
        subscription_id = %subscription.id(),
        "Display connected to change stream"
    );

    Sse::new(event_stream(subscription)).keep_alive(
        KeepAlive::new()
            .interval(state.keepalive)
            .text("ping"),
    )
}

fn event_stream(subscription: Subscription) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        debug!(
            subscription_id = %subscription.id(),
            event_type = %event.event_type(),
            "Forwarding change event"
        );
        Some((Event::default().json_data(&event), subscription))
    })
}
