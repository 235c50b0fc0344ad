//! Stream id allocation and registry
//!
//! One mutex guards both the id counter and the stream table, so an id
//! is never observed outside the table it was allocated for. Ids grow
//! by two to preserve parity: clients use odd ids, servers reserve even
//! ids for pushed streams (RFC 7540 Section 5.1.1).

use super::listener::DataEventListener;
use super::outbound::OutboundMsgHolder;
use super::MAX_STREAM_ID;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// HTTP/2 stream identifier
pub type StreamId = u32;

#[derive(Debug)]
struct StreamEntry {
    holder: Option<Arc<OutboundMsgHolder>>,
}

#[derive(Debug)]
struct RegistryInner {
    next_stream_id: StreamId,
    streams: HashMap<StreamId, StreamEntry>,
}

/// Allocates stream ids and tracks live streams
#[derive(Debug)]
pub struct StreamRegistry {
    inner: Mutex<RegistryInner>,
}

impl StreamRegistry {
    /// Create a registry; clients allocate odd ids, servers even
    pub fn new(is_client: bool) -> Self {
        StreamRegistry {
            inner: Mutex::new(RegistryInner {
                next_stream_id: if is_client { 1 } else { 2 },
                streams: HashMap::new(),
            }),
        }
    }

    /// Allocate the next stream id and register `holder` under it
    ///
    /// Allocation and registration happen under one lock acquisition,
    /// so concurrent initiators get distinct, strictly increasing ids
    /// that are in the table before the id is returned.
    pub fn initiate(&self, holder: Arc<OutboundMsgHolder>) -> StreamId {
        self.insert_next(Some(holder))
    }

    /// Allocate the next stream id for a promised stream
    ///
    /// The entry carries no outbound holder; the pushed response is
    /// linked when the promise is written or read.
    pub fn reserve_stream(&self) -> StreamId {
        self.insert_next(None)
    }

    fn insert_next(&self, holder: Option<Arc<OutboundMsgHolder>>) -> StreamId {
        let mut inner = self.inner.lock().unwrap();
        let stream_id = inner.next_stream_id;
        debug_assert!(stream_id <= MAX_STREAM_ID);
        inner.next_stream_id += 2;
        inner.streams.insert(stream_id, StreamEntry { holder });
        stream_id
    }

    /// Register a promised stream id announced by the peer
    pub fn register_promised(&self, stream_id: StreamId, holder: Arc<OutboundMsgHolder>) {
        let mut inner = self.inner.lock().unwrap();
        inner.streams.insert(
            stream_id,
            StreamEntry {
                holder: Some(holder),
            },
        );
    }

    /// Outbound holder registered under `stream_id`, if any
    pub fn holder(&self, stream_id: StreamId) -> Option<Arc<OutboundMsgHolder>> {
        self.inner
            .lock()
            .unwrap()
            .streams
            .get(&stream_id)
            .and_then(|entry| entry.holder.clone())
    }

    /// Whether `stream_id` is in the table
    pub fn contains(&self, stream_id: StreamId) -> bool {
        self.inner.lock().unwrap().streams.contains_key(&stream_id)
    }

    /// Drop `stream_id` from the table; returns whether it was present
    pub fn remove(&self, stream_id: StreamId) -> bool {
        self.inner.lock().unwrap().streams.remove(&stream_id).is_some()
    }

    /// The id the next allocation will return
    pub fn peek_next_stream_id(&self) -> StreamId {
        self.inner.lock().unwrap().next_stream_id
    }

    /// Number of streams currently tracked
    pub fn active_stream_count(&self) -> usize {
        self.inner.lock().unwrap().streams.len()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Shared per-connection HTTP/2 state
///
/// Bundles the stream registry with the data event listener chain.
#[derive(Default)]
pub struct Http2Connection {
    registry: StreamRegistry,
    listeners: Mutex<Vec<Arc<dyn DataEventListener>>>,
}

impl Http2Connection {
    /// Create connection state; clients allocate odd stream ids
    pub fn new(is_client: bool) -> Self {
        Http2Connection {
            registry: StreamRegistry::new(is_client),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The stream registry
    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Append a listener to the data event chain
    pub fn add_data_event_listener(&self, listener: Arc<dyn DataEventListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Snapshot of the listener chain, in registration order
    pub fn data_event_listeners(&self) -> Vec<Arc<dyn DataEventListener>> {
        self.listeners.lock().unwrap().clone()
    }
}
