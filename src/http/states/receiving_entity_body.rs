//! State between start and end of inbound request body read

use super::util::{handle_incomplete_inbound_message, send_request_timeout_response};
use super::{ListenerState, SourceContext};
use crate::http::channel::{lock_channel, Channel};
use crate::http::message::{HttpContent, Message, Status, Version};
use crate::http::{IDLE_TIMEOUT_WHILE_READING_BODY, REMOTE_CLIENT_CLOSED_WHILE_READING_BODY};
use bytes::Bytes;

/// Accumulates body chunks until the terminal chunk completes the message
#[derive(Debug)]
pub struct ReceivingEntityBody {
    message: Message,
    version: Version,
}

impl ReceivingEntityBody {
    /// Enter the body-receiving state for an identified request
    pub fn new(message: Message, version: Version) -> Self {
        ReceivingEntityBody { message, version }
    }

    /// Append an inbound chunk; the terminal chunk completes the message
    pub fn read_inbound_request_entity_body(self, content: HttpContent) -> ListenerState {
        let last = content.is_last();
        self.message.add_content(content);
        if last {
            tracing::debug!("inbound request body complete");
        }
        ListenerState::ReceivingEntityBody(self)
    }

    /// Remote closed the connection mid-body
    pub fn handle_abrupt_channel_closure(self) -> ListenerState {
        handle_incomplete_inbound_message(&self.message, REMOTE_CLIENT_CLOSED_WHILE_READING_BODY);
        ListenerState::ReceivingEntityBody(self)
    }

    /// Idle timeout fired mid-body
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
        handle_incomplete_inbound_message(&self.message, IDLE_TIMEOUT_WHILE_READING_BODY);
        ListenerState::ReceivingEntityBody(self)
    }
}
