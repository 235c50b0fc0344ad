//! Server-side HTTP/2 inbound event handling
//!
//! [`Http2SourceHandler`] turns decoded inbound frames into messages
//! dispatched to the registered application listener. It runs on the
//! connection's read path, so the stream-to-message map needs no lock.

use super::buffer::InboundDataFrame;
use super::dispatch::Http2OutboundRespListener;
use super::encoder::Http2Encoder;
use super::streams::{Http2Connection, StreamId};
use crate::http::channel::Channel;
use crate::http::future::ServerConnectorFuture;
use crate::http::message::{HttpContent, Message, RequestHead, Version};
use crate::http::REMOTE_CLIENT_CLOSED_WHILE_READING_BODY;
use std::collections::HashMap;
use std::sync::Arc;

/// Handles inbound frames for one server-side HTTP/2 connection
pub struct Http2SourceHandler<C: Channel> {
    encoder: Arc<Http2Encoder<C>>,
    connection: Arc<Http2Connection>,
    connector_future: ServerConnectorFuture,
    server_name: String,
    interface_id: String,
    listener_port: Option<u16>,
    stream_messages: HashMap<StreamId, Message>,
}

impl<C: Channel + 'static> Http2SourceHandler<C> {
    /// Create a handler for a freshly accepted connection
    pub fn new(
        encoder: Arc<Http2Encoder<C>>,
        connection: Arc<Http2Connection>,
        server_name: impl Into<String>,
        interface_id: impl Into<String>,
        listener_port: Option<u16>,
    ) -> Self {
        Http2SourceHandler {
            encoder,
            connection,
            connector_future: ServerConnectorFuture::new(),
            server_name: server_name.into(),
            interface_id: interface_id.into(),
            listener_port,
            stream_messages: HashMap::new(),
        }
    }

    /// Future the application registers its listener on
    pub fn connector_future(&self) -> &ServerConnectorFuture {
        &self.connector_future
    }

    /// The connection state shared with the response path
    pub fn connection(&self) -> &Arc<Http2Connection> {
        &self.connection
    }

    /// A HEADERS frame completed decoding on `stream_id`
    pub fn read_inbound_request_headers(
        &mut self,
        head: RequestHead,
        stream_id: StreamId,
        end_stream: bool,
    ) {
        let message = self.setup_inbound_request(&head);
        if let Some(cause) = head.decode_failure {
            tracing::warn!(stream_id, %cause, "inbound request headers carried a decode failure");
        }
        if end_stream {
            message.add_content(HttpContent::empty_last());
        } else {
            self.stream_messages.insert(stream_id, message.clone());
        }
        self.notify_request_listener(message, stream_id);
    }

    /// A DATA frame arrived on `stream_id`
    ///
    /// The frame's buffer is released on every path, including the
    /// unknown-stream path where the payload is dropped.
    pub fn read_inbound_request_body(&mut self, frame: InboundDataFrame) {
        let stream_id = frame.stream_id();
        let end_stream = frame.end_stream();
        match self.stream_messages.get(&stream_id).cloned() {
            Some(message) => {
                let data = frame.into_buffer().release();
                if end_stream {
                    message.add_content(HttpContent::last(data));
                    self.stream_messages.remove(&stream_id);
                } else {
                    message.add_content(HttpContent::new(data));
                }
            }
            None => {
                frame.into_buffer().release();
                tracing::warn!(stream_id, "data frame received for unknown stream, dropping");
            }
        }
    }

    /// The remote peer closed the connection abruptly
    ///
    /// Every stream still awaiting body data gets a terminal failure
    /// marker so applications blocked on content observe the closure.
    pub fn handle_abrupt_channel_closure(&mut self) {
        for (stream_id, message) in self.stream_messages.drain() {
            tracing::warn!(stream_id, "{}", REMOTE_CLIENT_CLOSED_WHILE_READING_BODY);
            message.add_content(HttpContent::failed_last(
                REMOTE_CLIENT_CLOSED_WHILE_READING_BODY,
            ));
        }
    }

    /// Message currently accumulating body data for `stream_id`
    pub fn stream_message(&self, stream_id: StreamId) -> Option<Message> {
        self.stream_messages.get(&stream_id).cloned()
    }

    /// Stop tracking `stream_id`, returning its message if present
    pub fn remove_stream_message(&mut self, stream_id: StreamId) -> Option<Message> {
        self.stream_messages.remove(&stream_id)
    }

    fn setup_inbound_request(&self, head: &RequestHead) -> Message {
        let message = Message::new();
        message.set_version(Version::Http2);
        message.set_method(head.method);
        message.set_request_url(head.uri.clone());
        message.set_headers(head.headers.clone());
        message.set_scheme("http");
        message.set_listener_port(self.listener_port);
        message.set_interface_id(self.interface_id.clone());
        message
    }

    fn notify_request_listener(&self, message: Message, stream_id: StreamId) {
        let listener = Http2OutboundRespListener::new(
            Arc::clone(&self.encoder),
            Arc::clone(&self.connection),
            message.clone(),
            stream_id,
            self.server_name.clone(),
        );
        message.response_future().set_listener(Arc::new(listener));
        self.connector_future.notify_listener(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::future::HttpConnectorListener;
    use crate::http::message::Method;
    use bytes::Bytes;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullChannel;

    impl Channel for NullChannel {
        fn write(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct Collector {
        messages: Mutex<Vec<Message>>,
    }

    impl HttpConnectorListener for Collector {
        fn on_message(&self, message: Message) {
            self.messages.lock().unwrap().push(message);
        }
    }

    fn handler() -> Http2SourceHandler<NullChannel> {
        Http2SourceHandler::new(
            Arc::new(Http2Encoder::new(NullChannel)),
            Arc::new(Http2Connection::new(false)),
            "test-server",
            "http-0.0.0.0:8080",
            Some(8080),
        )
    }

    fn head() -> RequestHead {
        RequestHead::new(Method::Get, "/resource", Version::Http2)
    }

    #[test]
    fn test_headers_with_end_stream_complete_the_message() {
        let mut source = handler();
        let collector = Arc::new(Collector::default());
        source.connector_future().set_listener(collector.clone());

        source.read_inbound_request_headers(head(), 1, true);

        let messages = collector.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_complete());
        assert_eq!(messages[0].version(), Version::Http2);
        assert_eq!(messages[0].scheme().as_deref(), Some("http"));
        assert!(source.stream_message(1).is_none());
    }

    #[test]
    fn test_body_frames_append_until_end_stream() {
        let mut source = handler();
        let collector = Arc::new(Collector::default());
        source.connector_future().set_listener(collector.clone());

        source.read_inbound_request_headers(head(), 3, false);
        assert!(source.stream_message(3).is_some());

        source.read_inbound_request_body(InboundDataFrame::new(
            3,
            Bytes::from_static(b"part1"),
            false,
        ));
        source.read_inbound_request_body(InboundDataFrame::new(
            3,
            Bytes::from_static(b"part2"),
            true,
        ));

        let messages = collector.messages.lock().unwrap();
        assert!(messages[0].is_complete());
        assert_eq!(messages[0].content_count(), 2);
        assert!(source.stream_message(3).is_none());
    }

    #[test]
    fn test_unknown_stream_data_released_and_dropped() {
        let mut source = handler();
        let frame = InboundDataFrame::new(9, Bytes::from_static(b"orphan"), false);
        let probe = frame.probe();
        source.read_inbound_request_body(frame);
        assert!(probe.is_released());
    }

    #[test]
    fn test_abrupt_closure_fails_pending_streams() {
        let mut source = handler();
        let collector = Arc::new(Collector::default());
        source.connector_future().set_listener(collector.clone());

        source.read_inbound_request_headers(head(), 5, false);
        source.handle_abrupt_channel_closure();

        let messages = collector.messages.lock().unwrap();
        assert!(messages[0].is_complete());
        assert!(messages[0].failure().is_some());
        assert!(source.stream_message(5).is_none());
    }
}
