//! HTTP/1.1 transport core
//!
//! This module provides the per-connection request-receiving state machine
//! and the shared message/future types used by both protocol versions.
//!
//! # Architecture
//!
//! Decoded wire events (headers, body chunks, closure, idle timeout) arrive
//! on the connection's event thread and are routed through a single-variant
//! state context:
//!
//! - `SourceHandler` owns the channel and the current `ListenerState`
//! - `ReceivingHeaders` / `ReceivingEntityBody` / `Expect100ContinueHeaderReceived`
//!   process events and hand ownership to the next state
//! - `ServerConnectorFuture` delivers each parsed message to the registered
//!   application listener exactly once
//! - `HttpResponseFuture` is the single-assignment cell the application
//!   completes with its response
//!
//! # Examples
//!
//! ```no_run
//! use http_transport::http::{RequestHead, SourceHandler, Method, Version};
//! use std::net::TcpStream;
//!
//! let stream = TcpStream::connect("127.0.0.1:8080").unwrap();
//! let mut handler = SourceHandler::new(stream, "http-transport", "default", Some(8080));
//!
//! // Decode layer delivers parsed request heads and body chunks:
//! let head = RequestHead::new(Method::Get, "/", Version::Http11);
//! handler.read_inbound_request_headers(head);
//! ```

pub mod channel;
pub mod dispatch;
pub mod future;
pub mod headers;
pub mod message;
pub mod states;

pub mod h2;

pub use channel::{Channel, SharedChannel};
pub use dispatch::HttpOutboundRespListener;
pub use future::{HttpConnectorListener, HttpResponseFuture, ServerConnectorFuture};
pub use headers::Headers;
pub use message::{HttpContent, Message, Method, RequestHead, Status, Version};
pub use states::{ListenerState, SourceHandler};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid HTTP status: {0}")]
    InvalidStatus(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Incomplete message")]
    Incomplete,

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Promised stream is rejected")]
    PromisedStreamRejected,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Maximum number of headers per message
pub const MAX_HEADERS: usize = 64;

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// Cause recorded when the remote closes mid-headers
pub const REMOTE_CLIENT_CLOSED_WHILE_READING_HEADERS: &str =
    "Remote client closed the connection while reading inbound request headers";

/// Cause recorded when the remote closes mid-body
pub const REMOTE_CLIENT_CLOSED_WHILE_READING_BODY: &str =
    "Remote client closed the connection while reading inbound request body";

/// Cause recorded when the idle timeout fires mid-headers
pub const IDLE_TIMEOUT_WHILE_READING_HEADERS: &str =
    "Idle timeout triggered while reading inbound request headers";

/// Cause recorded when the idle timeout fires mid-body
pub const IDLE_TIMEOUT_WHILE_READING_BODY: &str =
    "Idle timeout triggered while reading inbound request body";

/// Error surfaced to the originating exchange when a promised stream is refused
pub const PROMISED_STREAM_REJECTED_ERROR: &str = "Promised stream is rejected";
