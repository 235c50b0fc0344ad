//! Stream layer operations
//!
//! Free functions tying together the registry, the frame write bridge
//! and the per-stream outbound state: stream initiation, header and
//! push promise writes, stream resets, promised-stream admission and
//! inbound DATA buffer release.

use super::buffer::InboundDataFrame;
use super::encoder::Http2Encoder;
use super::error::{Error, ErrorCode, Result};
use super::outbound::{OutboundMsgHolder, PushPromise};
use super::source::Http2SourceHandler;
use super::streams::{Http2Connection, StreamId};
use crate::http;
use crate::http::channel::Channel;
use crate::http::headers::Headers;
use crate::http::message::{HttpContent, Message};
use std::sync::Arc;

/// Allocate a stream for an outbound request and announce it to the
/// data event listener chain
pub fn initiate_stream(connection: &Http2Connection, holder: Arc<OutboundMsgHolder>) -> StreamId {
    let stream_id = connection.registry().initiate(holder);
    for listener in connection.data_event_listeners() {
        listener.on_stream_init(stream_id);
    }
    tracing::debug!(stream_id, "stream initiated");
    stream_id
}

/// Write response headers for a stream
///
/// Write failures are propagated to the inbound request's outbound
/// status future rather than surfaced to the caller alone.
pub fn write_response_headers<C: Channel>(
    encoder: &Http2Encoder<C>,
    inbound_request: &Message,
    stream_id: StreamId,
    headers: &Headers,
    end_stream: bool,
) -> Result<()> {
    match encoder.write_headers(stream_id, headers, end_stream) {
        Ok(()) => Ok(()),
        Err(cause) => {
            tracing::warn!(stream_id, error = %cause, "failed to write response headers");
            inbound_request
                .status_future()
                .notify_error(into_transport_error(&cause));
            Err(cause)
        }
    }
}

/// Write request headers for a stream, consulting the data event
/// listener chain first
///
/// Any listener returning `false` vetoes the write; nothing reaches
/// the wire and later listeners are not consulted. When the frame
/// carries END_STREAM the holder is marked request-written.
pub fn write_request_headers<C: Channel>(
    encoder: &Http2Encoder<C>,
    connection: &Http2Connection,
    holder: &OutboundMsgHolder,
    stream_id: StreamId,
    headers: &Headers,
    end_stream: bool,
) -> Result<()> {
    for listener in connection.data_event_listeners() {
        if !listener.on_headers_write(stream_id, headers, end_stream) {
            tracing::debug!(stream_id, "header write vetoed by data event listener");
            return Ok(());
        }
    }
    encoder.write_headers(stream_id, headers, end_stream)?;
    if end_stream {
        holder.set_request_written(true);
    }
    Ok(())
}

/// Reserve a promised stream id and write a PUSH_PROMISE frame
///
/// The promise gets its stream ids assigned before the write. Write
/// failures are propagated to the inbound request's outbound status
/// future.
pub fn write_push_promise<C: Channel>(
    encoder: &Http2Encoder<C>,
    connection: &Http2Connection,
    inbound_request: &Message,
    stream_id: StreamId,
    promise: &PushPromise,
) -> Result<StreamId> {
    let promised_stream_id = connection.registry().reserve_stream();
    promise.set_stream_id(stream_id);
    promise.set_promised_stream_id(promised_stream_id);

    let mut headers = promise.headers();
    headers.set(":method", promise.method().as_str());
    headers.set(":path", promise.uri());
    headers.set(":scheme", inbound_request.scheme().unwrap_or_else(|| "http".to_string()));

    match encoder.write_push_promise(stream_id, promised_stream_id, &headers) {
        Ok(()) => Ok(promised_stream_id),
        Err(cause) => {
            tracing::warn!(stream_id, promised_stream_id, error = %cause,
                "failed to write push promise");
            inbound_request
                .status_future()
                .notify_error(into_transport_error(&cause));
            Err(cause)
        }
    }
}

/// Terminate a stream gracefully with RST_STREAM(NO_ERROR)
pub fn send_rst_frame<C: Channel>(
    encoder: &Http2Encoder<C>,
    connection: &Http2Connection,
    stream_id: StreamId,
) -> Result<()> {
    send_reset(encoder, connection, stream_id, ErrorCode::NoError)
}

/// Terminate a stream with a specific error code
///
/// The stream leaves the registry before the frame goes out; a reset
/// stream is dead either way.
pub fn send_reset<C: Channel>(
    encoder: &Http2Encoder<C>,
    connection: &Http2Connection,
    stream_id: StreamId,
    error_code: ErrorCode,
) -> Result<()> {
    connection.registry().remove(stream_id);
    tracing::debug!(stream_id, code = %error_code, "resetting stream");
    encoder.write_rst_stream(stream_id, error_code)
}

/// Admission check for a response written on a promised stream
///
/// A response on the original stream always passes. A response on any
/// other stream passes only if that stream id is registered; otherwise
/// the inbound request's outbound status future is notified of the
/// rejection and the stream must be refused.
pub fn validate_promised_stream_state(
    original_stream_id: StreamId,
    stream_id: StreamId,
    connection: &Http2Connection,
    inbound_request: &Message,
) -> Result<()> {
    if stream_id == original_stream_id {
        return Ok(());
    }
    if connection.registry().contains(stream_id) {
        return Ok(());
    }
    inbound_request
        .status_future()
        .notify_error(http::Error::PromisedStreamRejected);
    Err(Error::RefusedStream(stream_id))
}

/// Handle a PUSH_PROMISE read from the peer
///
/// A promise whose originating stream has no registered outbound
/// holder is dropped silently (logged only); otherwise the promised
/// stream is registered under the same holder, the promise is linked
/// back to it and recorded on it.
pub fn on_push_promise_read(connection: &Http2Connection, promise: PushPromise) {
    let stream_id = promise.stream_id();
    let promised_stream_id = promise.promised_stream_id();
    match connection.registry().holder(stream_id) {
        None => {
            tracing::warn!(stream_id, promised_stream_id,
                "push promise received on a stream with no outbound message, dropping");
        }
        Some(holder) => {
            connection
                .registry()
                .register_promised(promised_stream_id, Arc::clone(&holder));
            promise.set_outbound_holder(&holder);
            holder.add_promise(promise);
            tracing::debug!(stream_id, promised_stream_id, "push promise registered");
        }
    }
}

/// Release an inbound DATA frame's buffer, closing the stream's
/// message if the stream is still tracked
///
/// The buffer is released on every path, whether or not the stream is
/// known.
pub fn release_data_frame<C: Channel + 'static>(
    source: &mut Http2SourceHandler<C>,
    frame: InboundDataFrame,
) {
    let stream_id = frame.stream_id();
    if let Some(message) = source.remove_stream_message(stream_id) {
        message.add_content(HttpContent::empty_last());
    }
    frame.into_buffer().release();
}

/// Map a frame-layer error onto the shared transport error type
pub(crate) fn into_transport_error(cause: &Error) -> http::Error {
    match cause {
        Error::Io(err) => http::Error::Io(std::io::Error::new(err.kind(), err.to_string())),
        other => http::Error::Protocol(other.to_string()),
    }
}
