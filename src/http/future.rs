//! Response futures and listener plumbing
//!
//! A [`HttpResponseFuture`] is a single-assignment result cell: completed
//! exactly once (with a message or an error), readable many times, with
//! listener callbacks that fire synchronously on the completing thread.
//! The application's entry point is [`ServerConnectorFuture`], which holds
//! the registered listener and shields the event loop from callback faults.

use super::message::Message;
use super::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Observer for message delivery and errors
///
/// Registered on a [`HttpResponseFuture`] (response dispatch, write-status
/// observers) or on a [`ServerConnectorFuture`] (the application listener).
pub trait HttpConnectorListener: Send + Sync {
    /// A message completed the future
    fn on_message(&self, message: Message);

    /// An error completed the future
    fn on_error(&self, error: &Error) {
        let _ = error;
    }
}

#[derive(Default)]
struct FutureInner {
    result: Option<Result<Message, Arc<Error>>>,
    listeners: Vec<Arc<dyn HttpConnectorListener>>,
}

/// Single-assignment response-completion future
///
/// Completable exactly once; later completions are ignored with a debug
/// log. Listeners registered after completion fire immediately.
#[derive(Clone, Default)]
pub struct HttpResponseFuture {
    inner: Arc<Mutex<FutureInner>>,
}

impl std::fmt::Debug for HttpResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("HttpResponseFuture")
            .field("completed", &inner.result.is_some())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl HttpResponseFuture {
    /// Create an incomplete future
    pub fn new() -> Self {
        HttpResponseFuture::default()
    }

    /// Register a listener
    ///
    /// If the future is already complete the listener fires immediately on
    /// the calling thread.
    pub fn set_listener(&self, listener: Arc<dyn HttpConnectorListener>) {
        let fire = {
            let mut inner = self.inner.lock().unwrap();
            match &inner.result {
                Some(result) => Some(result.clone()),
                None => {
                    inner.listeners.push(listener.clone());
                    None
                }
            }
        };
        if let Some(result) = fire {
            Self::invoke(&listener, &result);
        }
    }

    /// Complete the future with a message
    pub fn notify_message(&self, message: Message) {
        self.complete(Ok(message));
    }

    /// Complete the future with an error
    pub fn notify_error(&self, error: Error) {
        self.complete(Err(Arc::new(error)));
    }

    /// Whether the future has completed
    pub fn is_complete(&self) -> bool {
        self.inner.lock().unwrap().result.is_some()
    }

    /// The completed result, if any
    pub fn result(&self) -> Option<Result<Message, Arc<Error>>> {
        self.inner.lock().unwrap().result.clone()
    }

    fn complete(&self, result: Result<Message, Arc<Error>>) {
        let listeners = {
            let mut inner = self.inner.lock().unwrap();
            if inner.result.is_some() {
                tracing::debug!("response future already complete, notification ignored");
                return;
            }
            inner.result = Some(result.clone());
            std::mem::take(&mut inner.listeners)
        };
        for listener in &listeners {
            Self::invoke(listener, &result);
        }
    }

    fn invoke(listener: &Arc<dyn HttpConnectorListener>, result: &Result<Message, Arc<Error>>) {
        match result {
            Ok(message) => listener.on_message(message.clone()),
            Err(error) => listener.on_error(error),
        }
    }
}

/// Application-facing delivery point
///
/// The connector holds the listener registered by the application and
/// delivers each inbound message to it exactly once. A panic inside the
/// listener is caught here, logged, and never reaches the event loop.
#[derive(Clone, Default)]
pub struct ServerConnectorFuture {
    listener: Arc<Mutex<Option<Arc<dyn HttpConnectorListener>>>>,
}

impl ServerConnectorFuture {
    /// Create a connector with no registered listener
    pub fn new() -> Self {
        ServerConnectorFuture::default()
    }

    /// Register the application listener
    pub fn set_listener(&self, listener: Arc<dyn HttpConnectorListener>) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    /// Whether a listener is registered
    pub fn has_listener(&self) -> bool {
        self.listener.lock().unwrap().is_some()
    }

    /// Deliver a message to the registered listener
    pub fn notify_listener(&self, message: Message) {
        let listener = self.listener.lock().unwrap().clone();
        match listener {
            Some(listener) => {
                let result = catch_unwind(AssertUnwindSafe(|| listener.on_message(message)));
                if result.is_err() {
                    tracing::error!("error while notifying listener");
                }
            }
            None => {
                tracing::error!("cannot find registered listener to forward the message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        messages: AtomicUsize,
        errors: AtomicUsize,
    }

    impl Counter {
        fn new() -> Arc<Self> {
            Arc::new(Counter {
                messages: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
            })
        }
    }

    impl HttpConnectorListener for Counter {
        fn on_message(&self, _message: Message) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &Error) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_future_completes_once() {
        let future = HttpResponseFuture::new();
        let counter = Counter::new();
        future.set_listener(counter.clone());

        future.notify_error(Error::ConnectionClosed);
        future.notify_error(Error::Timeout);
        future.notify_message(Message::new());

        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counter.messages.load(Ordering::SeqCst), 0);
        assert!(future.is_complete());
    }

    #[test]
    fn test_listener_after_completion_fires_immediately() {
        let future = HttpResponseFuture::new();
        future.notify_message(Message::new());

        let counter = Counter::new();
        future.set_listener(counter.clone());
        assert_eq!(counter.messages.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_result_readable_many_times() {
        let future = HttpResponseFuture::new();
        future.notify_error(Error::Timeout);
        assert!(future.result().unwrap().is_err());
        assert!(future.result().unwrap().is_err());
    }

    #[test]
    fn test_connector_catches_listener_panic() {
        struct Panicker;
        impl HttpConnectorListener for Panicker {
            fn on_message(&self, _message: Message) {
                panic!("application fault");
            }
        }

        let connector = ServerConnectorFuture::new();
        connector.set_listener(Arc::new(Panicker));
        // Must not propagate into the caller
        connector.notify_listener(Message::new());
    }

    #[test]
    fn test_connector_without_listener() {
        let connector = ServerConnectorFuture::new();
        assert!(!connector.has_listener());
        connector.notify_listener(Message::new());
    }
}
