//! Reference-counted frame payload buffers
//!
//! Inbound DATA payloads arrive in a [`FrameBuffer`] that must be
//! released exactly once, on every path that consumes the frame.
//! Release is by-value, so the type system rules out double release;
//! a [`ReleaseProbe`] lets callers observe that release happened.

use super::streams::StreamId;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A payload buffer with observable release
#[derive(Debug)]
pub struct FrameBuffer {
    data: Bytes,
    released: Arc<AtomicBool>,
}

impl FrameBuffer {
    /// Wrap a payload in a releasable buffer
    pub fn new(data: Bytes) -> Self {
        FrameBuffer {
            data,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Probe that observes this buffer's release
    pub fn probe(&self) -> ReleaseProbe {
        ReleaseProbe {
            released: Arc::clone(&self.released),
        }
    }

    /// Release the buffer, yielding its payload
    ///
    /// Consumes the buffer so it cannot be released twice.
    pub fn release(self) -> Bytes {
        self.released.store(true, Ordering::SeqCst);
        self.data
    }
}

/// Observes whether a [`FrameBuffer`] has been released
#[derive(Debug, Clone)]
pub struct ReleaseProbe {
    released: Arc<AtomicBool>,
}

impl ReleaseProbe {
    /// Whether the observed buffer has been released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// An inbound DATA frame whose payload awaits release
#[derive(Debug)]
pub struct InboundDataFrame {
    stream_id: StreamId,
    buffer: FrameBuffer,
    end_stream: bool,
}

impl InboundDataFrame {
    /// Create an inbound DATA frame
    pub fn new(stream_id: StreamId, data: Bytes, end_stream: bool) -> Self {
        InboundDataFrame {
            stream_id,
            buffer: FrameBuffer::new(data),
            end_stream,
        }
    }

    /// Stream the frame arrived on
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Whether the frame carried END_STREAM
    pub fn end_stream(&self) -> bool {
        self.end_stream
    }

    /// Probe that observes the payload buffer's release
    pub fn probe(&self) -> ReleaseProbe {
        self.buffer.probe()
    }

    /// Take the payload buffer out of the frame
    pub fn into_buffer(self) -> FrameBuffer {
        self.buffer
    }
}
