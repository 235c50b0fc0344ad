//! Server-side HTTP/2 response dispatch
//!
//! [`Http2OutboundRespListener`] is bound to an inbound request's
//! response future. When the application completes the request it
//! frames the response onto the originating stream, or refuses a
//! promised stream that was never admitted.

use super::encoder::Http2Encoder;
use super::error::ErrorCode;
use super::frames::DataFrame;
use super::state_util;
use super::streams::{Http2Connection, StreamId};
use crate::http;
use crate::http::channel::Channel;
use crate::http::future::HttpConnectorListener;
use crate::http::message::{Message, Status};
use bytes::BytesMut;
use std::sync::Arc;

/// Writes an application response back onto an HTTP/2 stream
pub struct Http2OutboundRespListener<C: Channel> {
    encoder: Arc<Http2Encoder<C>>,
    connection: Arc<Http2Connection>,
    inbound_request: Message,
    original_stream_id: StreamId,
    server_name: String,
}

impl<C: Channel> Http2OutboundRespListener<C> {
    /// Bind a dispatcher for the request received on `original_stream_id`
    pub fn new(
        encoder: Arc<Http2Encoder<C>>,
        connection: Arc<Http2Connection>,
        inbound_request: Message,
        original_stream_id: StreamId,
        server_name: impl Into<String>,
    ) -> Self {
        Http2OutboundRespListener {
            encoder,
            connection,
            inbound_request,
            original_stream_id,
            server_name: server_name.into(),
        }
    }

    /// Frame `response` onto `stream_id`
    ///
    /// Used with the original stream id for the normal response and
    /// with a promised stream id for pushed responses. A stream id
    /// that fails the promised-stream admission check is refused with
    /// RST_STREAM(REFUSED_STREAM); the connection and its other
    /// streams are left untouched.
    pub fn send_response(&self, response: &Message, stream_id: StreamId) {
        if let Err(cause) = state_util::validate_promised_stream_state(
            self.original_stream_id,
            stream_id,
            &self.connection,
            &self.inbound_request,
        ) {
            tracing::warn!(stream_id, error = %cause, "rejecting response on unregistered stream");
            if let Err(reset_err) = state_util::send_reset(
                &self.encoder,
                &self.connection,
                stream_id,
                ErrorCode::RefusedStream,
            ) {
                tracing::warn!(stream_id, error = %reset_err, "failed to reset refused stream");
            }
            return;
        }

        let status = response.status().unwrap_or(Status::OK);
        let mut headers = response.headers();
        headers.set(":status", status.code().to_string());
        headers.set("server", self.server_name.clone());

        let mut body = BytesMut::new();
        while let Some(content) = response.next_content() {
            body.extend_from_slice(content.data());
        }
        let body = body.freeze();

        if state_util::write_response_headers(
            &self.encoder,
            &self.inbound_request,
            stream_id,
            &headers,
            body.is_empty(),
        )
        .is_err()
        {
            return;
        }

        if !body.is_empty() {
            if let Err(cause) = self.encoder.write_data(DataFrame::new(stream_id, body, true)) {
                tracing::warn!(stream_id, error = %cause, "failed to write response body");
                self.inbound_request
                    .status_future()
                    .notify_error(state_util::into_transport_error(&cause));
                return;
            }
        }

        // the exchange is over once END_STREAM is on the wire
        self.connection.registry().remove(stream_id);
        self.inbound_request
            .status_future()
            .notify_message(response.clone());
    }
}

impl<C: Channel> HttpConnectorListener for Http2OutboundRespListener<C> {
    fn on_message(&self, response: Message) {
        self.send_response(&response, self.original_stream_id);
    }

    fn on_error(&self, error: &http::Error) {
        tracing::warn!(stream_id = self.original_stream_id, %error,
            "application reported an error instead of a response");
        self.inbound_request
            .status_future()
            .notify_error(http::Error::Protocol(error.to_string()));
    }
}
