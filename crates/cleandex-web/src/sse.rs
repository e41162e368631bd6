//! Server-Sent Events stream of analysis and monitoring events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppEvent, SharedState};

fn event_name(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::ReportGenerated { .. } => "report_generated",
        AppEvent::MonitorCompleted { .. } => "monitor_completed",
    }
}

/// GET /api/events. Lagged receivers skip the missed events.
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        result.ok().and_then(|event| {
            serde_json::to_string(&event)
                .ok()
                .map(|data| Ok(Event::default().event(event_name(&event)).data(data)))
        })
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
