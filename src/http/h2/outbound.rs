//! Per-stream outbound message state
//!
//! An [`OutboundMsgHolder`] ties an outbound request to its response
//! future, tracks whether the request has been fully written, and
//! collects the push promises the server has announced for it.

use crate::http::future::HttpResponseFuture;
use crate::http::headers::Headers;
use crate::http::message::Message;
use crate::http::message::Method;
use super::streams::StreamId;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Holds the outbound request state for one stream
#[derive(Debug)]
pub struct OutboundMsgHolder {
    request: Message,
    response_future: HttpResponseFuture,
    request_written: AtomicBool,
    promises: Mutex<Vec<PushPromise>>,
}

impl OutboundMsgHolder {
    /// Create a holder for an outbound request
    pub fn new(request: Message) -> Self {
        OutboundMsgHolder {
            request,
            response_future: HttpResponseFuture::new(),
            request_written: AtomicBool::new(false),
            promises: Mutex::new(Vec::new()),
        }
    }

    /// The outbound request message
    pub fn request(&self) -> &Message {
        &self.request
    }

    /// Future completed when the response arrives
    pub fn response_future(&self) -> &HttpResponseFuture {
        &self.response_future
    }

    /// Whether the request has been fully written to the wire
    pub fn request_written(&self) -> bool {
        self.request_written.load(Ordering::SeqCst)
    }

    /// Mark the request as fully written
    pub fn set_request_written(&self, written: bool) {
        self.request_written.store(written, Ordering::SeqCst);
    }

    /// Record a push promise announced for this request
    pub fn add_promise(&self, promise: PushPromise) {
        self.promises.lock().unwrap().push(promise);
    }

    /// Promises announced for this request so far
    pub fn promises(&self) -> Vec<PushPromise> {
        self.promises.lock().unwrap().clone()
    }
}

/// A PUSH_PROMISE announcing a server-initiated response
///
/// Cheaply cloneable handle; stream ids are assigned when the promise
/// is written (server side) or read (client side).
#[derive(Debug, Clone)]
pub struct PushPromise {
    inner: Arc<PromiseInner>,
}

#[derive(Debug)]
struct PromiseInner {
    stream_id: AtomicU32,
    promised_stream_id: AtomicU32,
    method: Method,
    uri: String,
    headers: Headers,
    outbound: Mutex<Option<Weak<OutboundMsgHolder>>>,
}

impl PushPromise {
    /// Create a promise for a pushed request yet to be assigned stream ids
    pub fn new(method: Method, uri: impl Into<String>, headers: Headers) -> Self {
        PushPromise {
            inner: Arc::new(PromiseInner {
                stream_id: AtomicU32::new(0),
                promised_stream_id: AtomicU32::new(0),
                method,
                uri: uri.into(),
                headers,
                outbound: Mutex::new(None),
            }),
        }
    }

    /// Create a promise read off the wire, with both stream ids known
    pub fn with_ids(
        stream_id: StreamId,
        promised_stream_id: StreamId,
        method: Method,
        uri: impl Into<String>,
        headers: Headers,
    ) -> Self {
        let promise = Self::new(method, uri, headers);
        promise.set_stream_id(stream_id);
        promise.set_promised_stream_id(promised_stream_id);
        promise
    }

    /// Stream the promise travels on
    pub fn stream_id(&self) -> StreamId {
        self.inner.stream_id.load(Ordering::SeqCst)
    }

    /// Assign the originating stream id
    pub fn set_stream_id(&self, stream_id: StreamId) {
        self.inner.stream_id.store(stream_id, Ordering::SeqCst);
    }

    /// Reserved stream the pushed response will use
    pub fn promised_stream_id(&self) -> StreamId {
        self.inner.promised_stream_id.load(Ordering::SeqCst)
    }

    /// Assign the promised stream id
    pub fn set_promised_stream_id(&self, stream_id: StreamId) {
        self.inner
            .promised_stream_id
            .store(stream_id, Ordering::SeqCst);
    }

    /// Method of the promised request
    pub fn method(&self) -> Method {
        self.inner.method
    }

    /// URI of the promised request
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// Header snapshot of the promised request
    pub fn headers(&self) -> Headers {
        self.inner.headers.clone()
    }

    /// Link the promise back to the outbound request it belongs to
    pub fn set_outbound_holder(&self, holder: &Arc<OutboundMsgHolder>) {
        *self.inner.outbound.lock().unwrap() = Some(Arc::downgrade(holder));
    }

    /// The outbound request this promise was announced for, if still alive
    pub fn outbound_holder(&self) -> Option<Arc<OutboundMsgHolder>> {
        self.inner
            .outbound
            .lock()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
    }
}
