//! HTTP handlers for the Conversations domain

pub mod conversations;
pub mod messages;

use std::convert::Infallible;

use axum::response::sse::Event;
use futures_core::Stream;
use serde::Serialize;
use serde_json::json;

use crate::subscription::Subscription;

/// Turn a snapshot subscription into server-sent events.
///
/// Each snapshot becomes a `snapshot` event carrying the rendered JSON. A
/// failed load becomes one `error` event and ends the stream. Dropping the
/// response (client gone) drops the subscription and stops its watcher.
pub(crate) fn snapshot_events<T, R, F>(
    mut subscription: Subscription<T>,
    render: F,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static
where
    T: Send + 'static,
    R: Serialize,
    F: Fn(T) -> R + Send + 'static,
{
    async_stream::stream! {
        while let Some(snapshot) = subscription.next().await {
            match snapshot {
                Ok(value) => match Event::default().event("snapshot").json_data(render(value)) {
                    Ok(event) => yield Ok(event),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode snapshot event");
                        break;
                    }
                },
                Err(e) => {
                    let body = json!({ "code": e.error_code(), "message": e.message() });
                    yield Ok(Event::default().event("error").data(body.to_string()));
                    break;
                }
            }
        }
    }
}
