//! State entered when an inbound request carries `Expect: 100-continue`
//!
//! The normal flow is intercepted to emit an interim 100 response before
//! the body is read. Exactly one interim response is written per request,
//! either when the application answers with a 100 status or, at the
//! latest, when the first body chunk arrives.

use super::util::{
    handle_incomplete_inbound_message, send_continue_response, send_request_timeout_response,
};
use super::{ListenerState, ReceivingEntityBody, SourceContext};
use crate::http::channel::{lock_channel, Channel};
use crate::http::message::{HttpContent, Message, Status, Version};
use crate::http::{IDLE_TIMEOUT_WHILE_READING_HEADERS, REMOTE_CLIENT_CLOSED_WHILE_READING_HEADERS};
use bytes::Bytes;

/// Continue-aware variant of the headers-received state
#[derive(Debug)]
pub struct Expect100ContinueHeaderReceived {
    message: Message,
    version: Version,
    continue_sent: bool,
}

impl Expect100ContinueHeaderReceived {
    /// Enter the continue branch; the in-progress message is preserved
    pub fn new(message: Message, version: Version) -> Self {
        Expect100ContinueHeaderReceived {
            message,
            version,
            continue_sent: false,
        }
    }

    /// Application wrote response headers
    ///
    /// A 100 status emits the interim response and stays in this state;
    /// any other status is the final response and is handled by response
    /// dispatch, not here.
    pub fn write_outbound_response_headers<C: Channel>(
        mut self,
        ctx: &SourceContext<'_, C>,
        response: &Message,
    ) -> ListenerState {
        let interim = response
            .status()
            .map(|s| s.is_informational())
            .unwrap_or(false);
        if interim {
            self.emit_continue(ctx);
        }
        ListenerState::Expect100ContinueHeaderReceived(self)
    }

    /// Body chunk arrived: make sure the interim response went out first,
    /// then proceed exactly as the headers state would
    pub fn read_inbound_request_entity_body<C: Channel>(
        mut self,
        ctx: &SourceContext<'_, C>,
        content: HttpContent,
    ) -> ListenerState {
        self.emit_continue(ctx);
        let body = ReceivingEntityBody::new(self.message, self.version);
        body.read_inbound_request_entity_body(content)
    }

    /// Remote closed the connection before the body started
    pub fn handle_abrupt_channel_closure(self) -> ListenerState {
        handle_incomplete_inbound_message(&self.message, REMOTE_CLIENT_CLOSED_WHILE_READING_HEADERS);
        ListenerState::Expect100ContinueHeaderReceived(self)
    }

    /// Idle timeout fired before the body started
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
        handle_incomplete_inbound_message(&self.message, IDLE_TIMEOUT_WHILE_READING_HEADERS);
        ListenerState::Expect100ContinueHeaderReceived(self)
    }

    /// Whether the interim response has been written
    pub fn continue_sent(&self) -> bool {
        self.continue_sent
    }

    fn emit_continue<C: Channel>(&mut self, ctx: &SourceContext<'_, C>) {
        if self.continue_sent {
            return;
        }
        match send_continue_response(ctx.channel, self.version) {
            Ok(()) => self.continue_sent = true,
            Err(cause) => {
                tracing::warn!("Failed to send 100 Continue: {}", cause);
                self.message
                    .status_future()
                    .notify_error(crate::http::Error::Io(cause));
                // Counted as sent: one attempt per request
                self.continue_sent = true;
            }
        }
    }
}
