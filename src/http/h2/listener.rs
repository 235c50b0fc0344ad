//! Data event listeners
//!
//! Listeners observe stream lifecycle events and may veto outbound
//! header writes, e.g. to hold back a request until a server preface
//! has settled.

use crate::http::headers::Headers;
use super::streams::StreamId;

/// Observes stream events on an HTTP/2 connection
pub trait DataEventListener: Send + Sync {
    /// A new stream id was allocated
    fn on_stream_init(&self, _stream_id: StreamId) {}

    /// Outbound request headers are about to be written
    ///
    /// Returning `false` vetoes the write; the frame is not emitted and
    /// listeners later in the chain are not consulted.
    fn on_headers_write(&self, _stream_id: StreamId, _headers: &Headers, _end_stream: bool) -> bool {
        true
    }
}
