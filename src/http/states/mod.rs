//! Per-connection request-receiving state machine
//!
//! Each connection holds exactly one active [`ListenerState`] at any
//! instant. Transitions are atomic replacement of the held variant:
//! handler methods consume the current state by value and return the next
//! one. All inbound events for a connection arrive on its single event
//! thread, so no locking is involved in a transition.

pub mod expect_continue;
pub mod receiving_entity_body;
pub mod receiving_headers;
pub mod util;

pub use expect_continue::Expect100ContinueHeaderReceived;
pub use receiving_entity_body::ReceivingEntityBody;
pub use receiving_headers::ReceivingHeaders;

use super::channel::{shared, Channel, SharedChannel};
use super::future::ServerConnectorFuture;
use super::message::{HttpContent, Message, RequestHead};

/// The connection's current receiving state
///
/// Terminal conditions (completed, aborted) are reached through terminal
/// content markers on the message rather than separate variants.
#[derive(Debug)]
pub enum ListenerState {
    ReceivingHeaders(ReceivingHeaders),
    ReceivingEntityBody(ReceivingEntityBody),
    Expect100ContinueHeaderReceived(Expect100ContinueHeaderReceived),
}

impl ListenerState {
    /// Short name of the active variant, for logs and tests
    pub fn name(&self) -> &'static str {
        match self {
            ListenerState::ReceivingHeaders(_) => "ReceivingHeaders",
            ListenerState::ReceivingEntityBody(_) => "ReceivingEntityBody",
            ListenerState::Expect100ContinueHeaderReceived(_) => {
                "Expect100ContinueHeaderReceived"
            }
        }
    }
}

/// Per-event view of the connection handed to state handlers
pub struct SourceContext<'a, C: Channel> {
    pub channel: &'a SharedChannel<C>,
    pub server_name: &'a str,
    pub connector_future: &'a ServerConnectorFuture,
}

/// Server-side connection handler
///
/// Owns the channel, the connection-level state context and the listener
/// registration point. The decode layer feeds it one event at a time.
pub struct SourceHandler<C: Channel> {
    channel: SharedChannel<C>,
    server_name: String,
    interface_id: String,
    listener_port: Option<u16>,
    connector_future: ServerConnectorFuture,
    state: Option<ListenerState>,
}

impl<C: Channel + 'static> SourceHandler<C> {
    /// Create a handler over an established connection
    pub fn new(
        channel: C,
        server_name: impl Into<String>,
        interface_id: impl Into<String>,
        listener_port: Option<u16>,
    ) -> Self {
        Self::from_shared(shared(channel), server_name, interface_id, listener_port)
    }

    /// Create a handler over an already-shared channel
    pub fn from_shared(
        channel: SharedChannel<C>,
        server_name: impl Into<String>,
        interface_id: impl Into<String>,
        listener_port: Option<u16>,
    ) -> Self {
        SourceHandler {
            channel,
            server_name: server_name.into(),
            interface_id: interface_id.into(),
            listener_port,
            connector_future: ServerConnectorFuture::new(),
            state: Some(ListenerState::ReceivingHeaders(ReceivingHeaders::new())),
        }
    }

    /// The application listener registration point
    pub fn connector_future(&self) -> &ServerConnectorFuture {
        &self.connector_future
    }

    /// The shared channel
    pub fn channel(&self) -> &SharedChannel<C> {
        &self.channel
    }

    /// The server identity written on generated responses
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The current state variant
    pub fn state(&self) -> &ListenerState {
        // The state slot is only empty inside a transition
        self.state.as_ref().expect("state context is mid-transition")
    }

    /// Inbound event: request head parsed
    pub fn read_inbound_request_headers(&mut self, head: RequestHead) {
        let message = self.setup_inbound_message(&head);
        let decode_failure = head.decode_failure.clone();
        self.transition(|state, ctx| match state {
            ListenerState::ReceivingHeaders(receiving) => {
                receiving.read_inbound_request_headers(ctx, message, decode_failure.as_deref())
            }
            other => {
                tracing::warn!(state = other.name(), "request headers in unexpected state");
                other
            }
        });
    }

    /// Inbound event: body chunk received
    pub fn read_inbound_request_body(&mut self, content: HttpContent) {
        self.transition(|state, ctx| match state {
            ListenerState::ReceivingHeaders(receiving) => {
                receiving.read_inbound_request_entity_body(content)
            }
            ListenerState::ReceivingEntityBody(receiving) => {
                receiving.read_inbound_request_entity_body(content)
            }
            ListenerState::Expect100ContinueHeaderReceived(expect) => {
                expect.read_inbound_request_entity_body(ctx, content)
            }
        });
    }

    /// Outbound event: application began writing response headers
    pub fn write_outbound_response_headers(&mut self, response: &Message) {
        let response = response.clone();
        self.transition(|state, ctx| match state {
            ListenerState::Expect100ContinueHeaderReceived(expect) => {
                expect.write_outbound_response_headers(ctx, &response)
            }
            // Not a dependant action of the receiving states
            other => other,
        });
    }

    /// Outbound event: application began writing response body
    ///
    /// Not a dependant action of any receiving state; the write itself
    /// happens in response dispatch.
    pub fn write_outbound_response_body(&mut self, _response: &Message) {}

    /// Inbound event: channel closed abruptly while receiving
    pub fn handle_abrupt_channel_closure(&mut self) {
        self.transition(|state, _ctx| match state {
            ListenerState::ReceivingHeaders(receiving) => receiving.handle_abrupt_channel_closure(),
            ListenerState::ReceivingEntityBody(receiving) => {
                receiving.handle_abrupt_channel_closure()
            }
            ListenerState::Expect100ContinueHeaderReceived(expect) => {
                expect.handle_abrupt_channel_closure()
            }
        });
    }

    /// Inbound event: idle timeout fired
    pub fn handle_idle_timeout(&mut self) {
        self.transition(|state, ctx| match state {
            ListenerState::ReceivingHeaders(receiving) => receiving.handle_idle_timeout(ctx),
            ListenerState::ReceivingEntityBody(receiving) => receiving.handle_idle_timeout(ctx),
            ListenerState::Expect100ContinueHeaderReceived(expect) => {
                expect.handle_idle_timeout(ctx)
            }
        });
    }

    /// Build the in-flight message from a parsed head
    fn setup_inbound_message(&self, head: &RequestHead) -> Message {
        let message = Message::new();
        message.set_version(head.version);
        message.set_method(head.method);
        message.set_request_url(head.uri.clone());
        message.set_headers(head.headers.clone());
        message.set_scheme("http");
        message.set_listener_port(self.listener_port);
        message.set_interface_id(self.interface_id.clone());
        message
    }

    /// Atomic replacement of the held variant
    fn transition<F>(&mut self, f: F)
    where
        F: FnOnce(ListenerState, &SourceContext<'_, C>) -> ListenerState,
    {
        let ctx = SourceContext {
            channel: &self.channel,
            server_name: &self.server_name,
            connector_future: &self.connector_future,
        };
        if let Some(state) = self.state.take() {
            self.state = Some(f(state, &ctx));
        }
    }
}
