//! Utility functions shared by the listener states

use crate::http::channel::{lock_channel, Channel, SharedChannel};
use crate::http::message::{HttpContent, Message, Status, Version};
use crate::http::CRLF;
use bytes::Bytes;
use std::io;

/// Write a generated timeout response and flush once
///
/// Framed per the negotiated protocol version (HTTP/1.0 keeps its own
/// status line). `Content-Type: text/plain` is set only when a body is
/// present; `Connection: close` and the server identity always are.
pub fn send_request_timeout_response<C: Channel>(
    channel: &SharedChannel<C>,
    status: Status,
    content: Bytes,
    version: Version,
    server_name: &str,
) -> io::Result<()> {
    let mut buf = Vec::new();
    buf.extend_from_slice(version.status_line_str().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(status.code().to_string().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(status.reason_phrase().as_bytes());
    buf.extend_from_slice(CRLF.as_bytes());

    buf.extend_from_slice(format!("Content-Length: {}", content.len()).as_bytes());
    buf.extend_from_slice(CRLF.as_bytes());
    if !content.is_empty() {
        buf.extend_from_slice(b"Content-Type: text/plain");
        buf.extend_from_slice(CRLF.as_bytes());
    }
    buf.extend_from_slice(b"Connection: close");
    buf.extend_from_slice(CRLF.as_bytes());
    buf.extend_from_slice(format!("Server: {}", server_name).as_bytes());
    buf.extend_from_slice(CRLF.as_bytes());
    buf.extend_from_slice(CRLF.as_bytes());
    buf.extend_from_slice(&content);

    let mut channel = lock_channel(channel);
    channel.write(&buf)?;
    channel.flush()
}

/// Write the interim `100 Continue` response
pub fn send_continue_response<C: Channel>(
    channel: &SharedChannel<C>,
    version: Version,
) -> io::Result<()> {
    let line = format!("{} 100 Continue{}{}", version.status_line_str(), CRLF, CRLF);
    let mut channel = lock_channel(channel);
    channel.write(line.as_bytes())?;
    channel.flush()
}

/// Mark an in-progress message incomplete with a failure cause
///
/// Appends a terminal content marker carrying the cause and logs a
/// warning. No response is attempted.
pub fn handle_incomplete_inbound_message(message: &Message, cause: &str) {
    message.add_content(HttpContent::failed_last(cause));
    tracing::warn!("{}", cause);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::channel::shared;

    #[derive(Default)]
    struct VecChannel {
        written: Vec<u8>,
        flushes: usize,
    }

    impl Channel for VecChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.extend_from_slice(buf);
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_timeout_response_http11() {
        let channel = shared(VecChannel::default());
        send_request_timeout_response(
            &channel,
            Status::REQUEST_TIMEOUT,
            Bytes::new(),
            Version::Http11,
            "test-server",
        )
        .unwrap();

        let guard = channel.lock().unwrap();
        let wire = String::from_utf8(guard.written.clone()).unwrap();
        assert!(wire.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
        assert!(wire.contains("Content-Length: 0\r\n"));
        assert!(!wire.contains("Content-Type"));
        assert!(wire.contains("Connection: close\r\n"));
        assert!(wire.contains("Server: test-server\r\n"));
        assert_eq!(guard.flushes, 1);
    }

    #[test]
    fn test_timeout_response_http10_with_body() {
        let channel = shared(VecChannel::default());
        send_request_timeout_response(
            &channel,
            Status::REQUEST_TIMEOUT,
            Bytes::from("timed out"),
            Version::Http10,
            "srv",
        )
        .unwrap();

        let guard = channel.lock().unwrap();
        let wire = String::from_utf8(guard.written.clone()).unwrap();
        assert!(wire.starts_with("HTTP/1.0 408 "));
        assert!(wire.contains("Content-Type: text/plain\r\n"));
        assert!(wire.ends_with("\r\n\r\ntimed out"));
    }

    #[test]
    fn test_incomplete_message_marker() {
        let message = Message::new();
        handle_incomplete_inbound_message(&message, "cause text");
        assert!(message.is_complete());
        assert_eq!(message.failure().as_deref(), Some("cause text"));
    }
}
