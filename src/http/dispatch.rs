//! HTTP/1.1 response dispatch
//!
//! Binds a freshly parsed inbound message to the application's response.
//! The listener is registered on the message's response future; when the
//! application completes that future, the response is serialized through
//! the shared channel on the completing thread. Transport failures are
//! reported on the message's status future, never thrown back at the
//! application.

use super::channel::{lock_channel, Channel, SharedChannel};
use super::future::HttpConnectorListener;
use super::message::{Message, Version};
use super::Error;

/// Listener that writes the application's HTTP/1.x response to the wire
pub struct HttpOutboundRespListener<C: Channel> {
    channel: SharedChannel<C>,
    inbound_request: Message,
    version: Version,
    server_name: String,
}

impl<C: Channel> HttpOutboundRespListener<C> {
    /// Bind dispatch to an inbound request
    pub fn new(
        channel: SharedChannel<C>,
        inbound_request: Message,
        version: Version,
        server_name: String,
    ) -> Self {
        HttpOutboundRespListener {
            channel,
            inbound_request,
            version,
            server_name,
        }
    }
}

impl<C: Channel> HttpConnectorListener for HttpOutboundRespListener<C> {
    fn on_message(&self, response: Message) {
        let wire = response.to_h1_response_wire(self.version, &self.server_name);
        let result = {
            let mut channel = lock_channel(&self.channel);
            channel.write(&wire).and_then(|_| channel.flush())
        };
        match result {
            Ok(()) => {
                self.inbound_request.status_future().notify_message(response);
            }
            Err(cause) => {
                tracing::warn!("outbound response write failed: {}", cause);
                self.inbound_request
                    .status_future()
                    .notify_error(Error::Io(cause));
            }
        }
    }

    fn on_error(&self, error: &Error) {
        tracing::warn!("application signalled response error: {}", error);
        self.inbound_request
            .status_future()
            .notify_error(Error::Protocol(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::channel::shared;
    use crate::http::message::{HttpContent, Status};
    use bytes::Bytes;
    use std::io;
    use std::sync::Arc;

    struct FailingChannel;

    impl Channel for FailingChannel {
        fn write(&mut self, _buf: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct VecChannel {
        written: Vec<u8>,
    }

    impl Channel for VecChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.extend_from_slice(buf);
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

    #[test]
    fn test_dispatch_writes_response() {
        let channel = shared(VecChannel::default());
        let inbound = Message::new();
        let dispatch = HttpOutboundRespListener::new(
            channel.clone(),
            inbound.clone(),
            Version::Http11,
            "srv".to_string(),
        );
        inbound.response_future().set_listener(Arc::new(dispatch));

        let response = Message::response(Status::OK);
        response.add_content(HttpContent::last(Bytes::from("hi")));
        inbound.response_future().notify_message(response);

        let wire = String::from_utf8(channel.lock().unwrap().written.clone()).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.ends_with("hi"));
        assert!(inbound.status_future().result().unwrap().is_ok());
    }

    #[test]
    fn test_dispatch_write_failure_notifies_status_future() {
        let channel = shared(FailingChannel);
        let inbound = Message::new();
        let dispatch = HttpOutboundRespListener::new(
            channel,
            inbound.clone(),
            Version::Http11,
            "srv".to_string(),
        );
        inbound.response_future().set_listener(Arc::new(dispatch));
        inbound
            .response_future()
            .notify_message(Message::response(Status::OK));

        assert!(inbound.status_future().result().unwrap().is_err());
    }
}
