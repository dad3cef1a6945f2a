//! Wraps a provider event stream into `event:`/`data:` SSE frames.
//!
//! Header commitment matters here: once the first byte of the streaming
//! body has gone out, an error can no longer change the HTTP status — it
//! has to become an in-band `event: error` frame instead. This module
//! only concerns itself with framing; the decision of which mode to use
//! lives in the `/v1/messages` handler, which knows whether it has
//! started the body yet.

use futures_util::{Stream, StreamExt};

use crate::error::Classified;
use crate::types::StreamEvent;

/// One rendered SSE frame: `event: <type>\ndata: <json>\n\n`.
pub fn frame(event_type: &str, data: &serde_json::Value) -> String {
    format!("event: {event_type}\ndata: {data}\n\n")
}

/// Renders a classified error as the `event: error` frame specified for
/// mid-stream failures.
pub fn error_frame(classified: &Classified) -> String {
    frame("error", &classified.body())
}

/// Renders one provider [`StreamEvent`] to its wire frame, after the
/// caller has already rewritten the model field via
/// [`StreamEvent::rewrite_model`].
pub fn render(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Error(classified) => error_frame(classified),
        other => frame(&other.event_type(), &other.data()),
    }
}

/// Adapts a provider event stream into a stream of rendered SSE frame
/// strings. The loop ends when the upstream channel closes; an error
/// frame does not itself terminate the stream, matching `§5`'s ordering
/// guarantee that frames are emitted in receipt order with no extra
/// framing logic layered on top.
pub fn render_stream(
    upstream: impl Stream<Item = crate::error::Result<StreamEvent>> + Send + 'static,
    public_model: String,
) -> impl Stream<Item = String> + Send + 'static {
    upstream.map(move |item| match item {
        Ok(mut event) => {
            event.rewrite_model(&public_model);
            render(&event)
        }
        Err(err) => render(&StreamEvent::Error(crate::error::classify_gateway_error(&err))),
    })
}
