//! State between start and end of inbound request headers read

use super::util::{handle_incomplete_inbound_message, send_request_timeout_response};
use super::{Expect100ContinueHeaderReceived, ListenerState, ReceivingEntityBody, SourceContext};
use crate::http::channel::{lock_channel, Channel};
use crate::http::dispatch::HttpOutboundRespListener;
use crate::http::message::{HttpContent, Message, Status, Version};
use crate::http::{IDLE_TIMEOUT_WHILE_READING_HEADERS, REMOTE_CLIENT_CLOSED_WHILE_READING_HEADERS};
use bytes::Bytes;
use std::sync::Arc;

/// Initial state of every connection
///
/// Holds the in-progress message once the head has been parsed. Response
/// writes directed at this state are explicit no-ops: a response must not
/// be written before the request is fully identified.
#[derive(Debug, Default)]
pub struct ReceivingHeaders {
    message: Option<Message>,
    version: Version,
}

impl ReceivingHeaders {
    /// State for a fresh connection, before any head has arrived
    pub fn new() -> Self {
        ReceivingHeaders::default()
    }

    /// Head parsed: record the version, branch on 100-continue, deliver
    ///
    /// The transition to [`Expect100ContinueHeaderReceived`] happens
    /// strictly before the message reaches the application listener. A
    /// decode failure is logged but delivery still proceeds; the failure
    /// surfaces to the consumer as markers on the message.
    pub fn read_inbound_request_headers<C: Channel + 'static>(
        mut self,
        ctx: &SourceContext<'_, C>,
        message: Message,
        decode_failure: Option<&str>,
    ) -> ListenerState {
        let version = message.version();
        self.version = version;
        self.message = Some(message.clone());

        let next = if message.expects_continue() {
            ListenerState::Expect100ContinueHeaderReceived(Expect100ContinueHeaderReceived::new(
                message.clone(),
                version,
            ))
        } else {
            ListenerState::ReceivingHeaders(self)
        };

        notify_request_listener(ctx, &message, version);

        if let Some(cause) = decode_failure {
            tracing::warn!(cause, "inbound request head failed decoding");
        }
        next
    }

    /// Body chunk arrived: move to [`ReceivingEntityBody`] and forward it
    ///
    /// The chunk crosses the transition untouched; nothing is dropped.
    pub fn read_inbound_request_entity_body(self, content: HttpContent) -> ListenerState {
        match self.message {
            Some(message) => {
                let body = ReceivingEntityBody::new(message, self.version);
                body.read_inbound_request_entity_body(content)
            }
            None => {
                tracing::warn!("body chunk before request head, dropped");
                ListenerState::ReceivingHeaders(self)
            }
        }
    }

    /// Remote closed the connection mid-headers
    pub fn handle_abrupt_channel_closure(self) -> ListenerState {
        if let Some(message) = &self.message {
            handle_incomplete_inbound_message(message, REMOTE_CLIENT_CLOSED_WHILE_READING_HEADERS);
        }
        ListenerState::ReceivingHeaders(self)
    }

    /// Idle timeout fired mid-headers
    ///
    /// Writes exactly one timeout response framed per the negotiated
    /// version, closes the connection, and marks the in-progress message
    /// incomplete with the timeout cause.
    pub fn handle_idle_timeout<C: Channel>(self, ctx: &SourceContext<'_, C>) -> ListenerState {
        let result = send_request_timeout_response(
            ctx.channel,
            Status::REQUEST_TIMEOUT,
            Bytes::new(),
            self.version,
            ctx.server_name,
        );
        if let Err(cause) = result {
            tracing::warn!("Failed to send: {}", cause);
        }
        lock_channel(ctx.channel).close();
        if let Some(message) = &self.message {
            handle_incomplete_inbound_message(message, IDLE_TIMEOUT_WHILE_READING_HEADERS);
        }
        ListenerState::ReceivingHeaders(self)
    }
}

/// Bind response dispatch to the message and deliver it to the application
pub(crate) fn notify_request_listener<C: Channel + 'static>(
    ctx: &SourceContext<'_, C>,
    message: &Message,
    version: Version,
) {
    let dispatch = HttpOutboundRespListener::new(
        ctx.channel.clone(),
        message.clone(),
        version,
        ctx.server_name.to_string(),
    );
    message.response_future().set_listener(Arc::new(dispatch));
    ctx.connector_future.notify_listener(message.clone());
}
