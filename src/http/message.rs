//! HTTP message types
//!
//! This module defines the in-flight representation of requests and
//! responses. A [`Message`] is created when headers are first parsed, grows
//! a sequence of content chunks as the body arrives, and carries the
//! response-completion future the application uses to answer it.

use super::future::HttpResponseFuture;
use super::{Error, Headers, Result, CRLF};
use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Parse method from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "PATCH" => Ok(Method::Patch),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }

    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP protocol version negotiated for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    Http11,
    Http2,
}

impl Version {
    /// Parse version from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            "HTTP/2" | "HTTP/2.0" => Ok(Version::Http2),
            _ => Err(Error::InvalidVersion(s.to_string())),
        }
    }

    /// Convert version to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Http2 => "HTTP/2.0",
        }
    }

    /// Version string used on an HTTP/1.x status line
    ///
    /// HTTP/2 responses that must be framed as HTTP/1.x (e.g. a timeout
    /// written before the preface settled) fall back to HTTP/1.1.
    pub fn status_line_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            _ => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Http11
    }
}

/// HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
}

impl Status {
    /// Create a new status code
    pub fn new(code: u16) -> Result<Self> {
        if (100..600).contains(&code) {
            Ok(Status { code })
        } else {
            Err(Error::InvalidStatus(format!("Invalid status code: {}", code)))
        }
    }

    /// Get the status code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Get the canonical reason phrase for this status code
    pub fn reason_phrase(&self) -> &'static str {
        match self.code {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            411 => "Length Required",
            413 => "Payload Too Large",
            417 => "Expectation Failed",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }

    /// Check if this is an informational status (1xx)
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    // Status codes this transport emits itself
    pub const CONTINUE: Status = Status { code: 100 };
    pub const OK: Status = Status { code: 200 };
    pub const REQUEST_TIMEOUT: Status = Status { code: 408 };
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase())
    }
}

/// A single chunk of message content
///
/// The terminal chunk (`last == true`) completes the message; a terminal
/// chunk carrying a decode-failure cause marks the message incomplete.
#[derive(Debug, Clone)]
pub struct HttpContent {
    data: Bytes,
    last: bool,
    decode_failure: Option<String>,
}

impl HttpContent {
    /// A regular body chunk
    pub fn new(data: Bytes) -> Self {
        HttpContent {
            data,
            last: false,
            decode_failure: None,
        }
    }

    /// A terminal chunk carrying the final bytes of the body
    pub fn last(data: Bytes) -> Self {
        HttpContent {
            data,
            last: true,
            decode_failure: None,
        }
    }

    /// An empty terminal chunk (end of message, no trailing bytes)
    pub fn empty_last() -> Self {
        Self::last(Bytes::new())
    }

    /// A terminal chunk marking the message incomplete with a cause
    pub fn failed_last(cause: impl Into<String>) -> Self {
        HttpContent {
            data: Bytes::new(),
            last: true,
            decode_failure: Some(cause.into()),
        }
    }

    /// The chunk's bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether this chunk ends the message
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// Decode-failure cause, if this chunk marks an error
    pub fn decode_failure(&self) -> Option<&str> {
        self.decode_failure.as_deref()
    }
}

/// Parsed request head delivered by the decode layer
///
/// `decode_failure` carries the decoder's error message when header decoding
/// failed; the message is still delivered downstream with the failure
/// visible to the consumer.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: Headers,
    pub decode_failure: Option<String>,
}

impl RequestHead {
    /// Create a request head with no headers and no decode failure
    pub fn new(method: Method, uri: impl Into<String>, version: Version) -> Self {
        RequestHead {
            method,
            uri: uri.into(),
            version,
            headers: Headers::new(),
            decode_failure: None,
        }
    }

    /// Attach a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Mark the head as having failed decoding
    pub fn with_decode_failure(mut self, cause: impl Into<String>) -> Self {
        self.decode_failure = Some(cause.into());
        self
    }
}

#[derive(Debug, Default)]
struct MessageInner {
    version: Version,
    method: Option<Method>,
    request_url: Option<String>,
    status: Option<Status>,
    scheme: Option<String>,
    listener_port: Option<u16>,
    interface_id: Option<String>,
    headers: Headers,
    contents: VecDeque<HttpContent>,
    complete: bool,
    failure: Option<String>,
}

/// Request or response in flight
///
/// Cheap-clone handle: the transport appends content chunks while the
/// application consumes them. The message carries two single-assignment
/// futures: `response_future`, which the application completes with its
/// response, and `status_future`, which the transport completes with the
/// final write status (or a transport error).
#[derive(Debug, Clone, Default)]
pub struct Message {
    inner: Arc<Mutex<MessageInner>>,
    response_future: HttpResponseFuture,
    status_future: HttpResponseFuture,
}

impl Message {
    /// Create an empty message
    pub fn new() -> Self {
        Message::default()
    }

    /// Build a response message with a status and headers
    pub fn response(status: Status) -> Self {
        let msg = Message::new();
        msg.set_status(status);
        msg
    }

    /// Negotiated protocol version
    pub fn version(&self) -> Version {
        self.inner.lock().unwrap().version
    }

    /// Record the negotiated protocol version
    pub fn set_version(&self, version: Version) {
        self.inner.lock().unwrap().version = version;
    }

    /// Request method, if this is a request
    pub fn method(&self) -> Option<Method> {
        self.inner.lock().unwrap().method
    }

    /// Record the request method
    pub fn set_method(&self, method: Method) {
        self.inner.lock().unwrap().method = Some(method);
    }

    /// Request URL, if this is a request
    pub fn request_url(&self) -> Option<String> {
        self.inner.lock().unwrap().request_url.clone()
    }

    /// Record the request URL
    pub fn set_request_url(&self, url: impl Into<String>) {
        self.inner.lock().unwrap().request_url = Some(url.into());
    }

    /// Response status, if this is a response
    pub fn status(&self) -> Option<Status> {
        self.inner.lock().unwrap().status
    }

    /// Record the response status
    pub fn set_status(&self, status: Status) {
        self.inner.lock().unwrap().status = Some(status);
    }

    /// Scheme the request arrived over ("http" / "https")
    pub fn scheme(&self) -> Option<String> {
        self.inner.lock().unwrap().scheme.clone()
    }

    /// Record the scheme
    pub fn set_scheme(&self, scheme: impl Into<String>) {
        self.inner.lock().unwrap().scheme = Some(scheme.into());
    }

    /// Local listener port the request arrived on
    pub fn listener_port(&self) -> Option<u16> {
        self.inner.lock().unwrap().listener_port
    }

    /// Record the listener port
    pub fn set_listener_port(&self, port: Option<u16>) {
        self.inner.lock().unwrap().listener_port = port;
    }

    /// Listener interface id the request arrived on
    pub fn interface_id(&self) -> Option<String> {
        self.inner.lock().unwrap().interface_id.clone()
    }

    /// Record the listener interface id
    pub fn set_interface_id(&self, id: impl Into<String>) {
        self.inner.lock().unwrap().interface_id = Some(id.into());
    }

    /// Copy of the message headers
    pub fn headers(&self) -> Headers {
        self.inner.lock().unwrap().headers.clone()
    }

    /// Replace the message headers
    pub fn set_headers(&self, headers: Headers) {
        self.inner.lock().unwrap().headers = headers;
    }

    /// Add a header
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.lock().unwrap().headers.insert(name, value);
    }

    /// First value of a header
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .headers
            .get(name)
            .map(|v| v.to_string())
    }

    /// Append a content chunk
    ///
    /// A terminal chunk marks the message complete; a terminal chunk with a
    /// decode-failure cause records the failure. Chunks arriving after
    /// completion are dropped.
    pub fn add_content(&self, content: HttpContent) {
        let mut inner = self.inner.lock().unwrap();
        if inner.complete {
            tracing::debug!("content dropped: message already complete");
            return;
        }
        if content.is_last() {
            inner.complete = true;
            inner.failure = content.decode_failure().map(|c| c.to_string());
        }
        inner.contents.push_back(content);
    }

    /// Take the next pending content chunk
    pub fn next_content(&self) -> Option<HttpContent> {
        self.inner.lock().unwrap().contents.pop_front()
    }

    /// Number of chunks not yet consumed
    pub fn content_count(&self) -> usize {
        self.inner.lock().unwrap().contents.len()
    }

    /// Whether a terminal chunk has been appended
    pub fn is_complete(&self) -> bool {
        self.inner.lock().unwrap().complete
    }

    /// Failure cause recorded by a terminal error marker, if any
    pub fn failure(&self) -> Option<String> {
        self.inner.lock().unwrap().failure.clone()
    }

    /// Future the application completes with the response message
    pub fn response_future(&self) -> &HttpResponseFuture {
        &self.response_future
    }

    /// Future the transport completes with the final write status
    pub fn status_future(&self) -> &HttpResponseFuture {
        &self.status_future
    }

    /// Whether the request carries a 100-continue expectation
    ///
    /// HTTP/1.0 requests cannot expect a continue response.
    pub fn expects_continue(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.version == Version::Http10 {
            return false;
        }
        inner
            .headers
            .get("Expect")
            .map(|v| v.eq_ignore_ascii_case("100-continue"))
            .unwrap_or(false)
    }

    /// Serialize this message as an HTTP/1.x response head plus any
    /// already-buffered body chunks
    pub fn to_h1_response_wire(&self, version: Version, server_name: &str) -> Vec<u8> {
        let inner = self.inner.lock().unwrap();
        let status = inner.status.unwrap_or(Status::OK);

        let mut buf = Vec::new();
        buf.extend_from_slice(version.status_line_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(status.code().to_string().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(status.reason_phrase().as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());

        for (name, value) in inner.headers.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF.as_bytes());
        }
        if !inner.headers.contains("Server") {
            buf.extend_from_slice(b"Server: ");
            buf.extend_from_slice(server_name.as_bytes());
            buf.extend_from_slice(CRLF.as_bytes());
        }
        buf.extend_from_slice(CRLF.as_bytes());

        for content in &inner.contents {
            buf.extend_from_slice(content.data());
        }
        buf
    }
}
