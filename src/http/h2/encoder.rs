//! Frame write bridge
//!
//! [`Http2Encoder`] owns the channel for a connection's outbound frame
//! traffic. Every write drains as many pending flow-controlled DATA
//! bytes as the send window allows, then flushes, so non-DATA frames
//! never leave queued payloads stranded behind them.

use super::codec::{self, MAX_FRAME_SIZE};
use super::error::{ErrorCode, Result};
use super::flow_control::ConnectionFlowControl;
use super::frames::{DataFrame, HeadersFrame, PushPromiseFrame, RstStreamFrame};
use super::streams::StreamId;
use crate::http::channel::Channel;
use crate::http::headers::Headers;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes and writes outbound frames for one connection
pub struct Http2Encoder<C: Channel> {
    inner: Mutex<EncoderInner<C>>,
}

struct EncoderInner<C: Channel> {
    channel: C,
    hpack: hpack::Encoder<'static>,
    flow: ConnectionFlowControl,
    pending: VecDeque<DataFrame>,
}

impl<C: Channel> Http2Encoder<C> {
    /// Create an encoder with the default send window
    pub fn new(channel: C) -> Self {
        Http2Encoder {
            inner: Mutex::new(EncoderInner {
                channel,
                hpack: hpack::Encoder::new(),
                flow: ConnectionFlowControl::new(),
                pending: VecDeque::new(),
            }),
        }
    }

    /// Create an encoder with a specific send window size
    pub fn with_send_window(channel: C, window_size: u32) -> Result<Self> {
        Ok(Http2Encoder {
            inner: Mutex::new(EncoderInner {
                channel,
                hpack: hpack::Encoder::new(),
                flow: ConnectionFlowControl::with_send_window(window_size)?,
                pending: VecDeque::new(),
            }),
        })
    }

    /// HPACK-encode `headers` and write a HEADERS frame
    pub fn write_headers(
        &self,
        stream_id: StreamId,
        headers: &Headers,
        end_stream: bool,
    ) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let block = inner.hpack.encode(
            headers
                .iter_h2()
                .map(|(name, value)| (name.as_bytes(), value.as_bytes())),
        );
        let frame = HeadersFrame::new(stream_id, Bytes::from(block), end_stream);
        let encoded = codec::encode_headers_frame(&frame)?;
        inner.channel.write(&encoded)?;
        drain_pending(inner)?;
        inner.channel.flush()?;
        Ok(())
    }

    /// Write a PUSH_PROMISE frame carrying the promised request headers
    pub fn write_push_promise(
        &self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        headers: &Headers,
    ) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let block = inner.hpack.encode(
            headers
                .iter_h2()
                .map(|(name, value)| (name.as_bytes(), value.as_bytes())),
        );
        let frame = PushPromiseFrame::new(stream_id, promised_stream_id, Bytes::from(block));
        let encoded = codec::encode_push_promise_frame(&frame)?;
        inner.channel.write(&encoded)?;
        drain_pending(inner)?;
        inner.channel.flush()?;
        Ok(())
    }

    /// Write a RST_STREAM frame
    pub fn write_rst_stream(&self, stream_id: StreamId, error_code: ErrorCode) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let encoded = codec::encode_rst_stream_frame(&RstStreamFrame::new(stream_id, error_code));
        inner.channel.write(&encoded)?;
        drain_pending(inner)?;
        inner.channel.flush()?;
        Ok(())
    }

    /// Queue a DATA frame and write as much of the queue as the send
    /// window allows
    pub fn write_data(&self, frame: DataFrame) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.pending.push_back(frame);
        drain_pending(inner)?;
        inner.channel.flush()?;
        Ok(())
    }

    /// Apply a WINDOW_UPDATE from the peer and drain newly sendable data
    pub fn handle_window_update(&self, increment: u32) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.flow.increase_send_window(increment)?;
        drain_pending(inner)?;
        inner.channel.flush()?;
        Ok(())
    }

    /// DATA payload bytes still waiting on send window credit
    pub fn pending_data_len(&self) -> usize {
        self.lock().pending.iter().map(DataFrame::len).sum()
    }

    /// Current send window capacity in bytes
    pub fn sendable(&self) -> usize {
        self.lock().flow.sendable()
    }

    /// A panic inside the channel poisons the lock; the encoder state
    /// itself is consistent between writes, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, EncoderInner<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write queued DATA frames until the queue empties or the window closes
///
/// A frame larger than the remaining window or the frame-size limit is
/// split: the sendable prefix goes out as a non-terminal DATA frame and
/// the remainder is requeued at the front, keeping per-stream byte
/// order. Splitting at [`MAX_FRAME_SIZE`] keeps the 24-bit length field
/// honest no matter how large the send window grows.
fn drain_pending<C: Channel>(inner: &mut EncoderInner<C>) -> Result<()> {
    while let Some(mut frame) = inner.pending.pop_front() {
        if frame.is_empty() {
            // zero-length frames (e.g. bare END_STREAM) need no credit
            inner.channel.write(&codec::encode_data_frame(&frame))?;
            continue;
        }
        let sendable = frame.len().min(MAX_FRAME_SIZE);
        let granted = inner.flow.consume_send_window(sendable);
        if granted == 0 {
            inner.pending.push_front(frame);
            break;
        }
        if granted < frame.len() {
            let prefix = DataFrame::new(frame.stream_id, frame.data.split_to(granted), false);
            inner.channel.write(&codec::encode_data_frame(&prefix))?;
            inner.pending.push_front(frame);
            if granted < sendable {
                // window exhausted
                break;
            }
            // frame-size limit hit with credit to spare, keep draining
            continue;
        }
        inner.channel.write(&codec::encode_data_frame(&frame))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::channel::Channel;
    use std::io;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct VecChannel {
        written: Arc<StdMutex<Vec<u8>>>,
        flushes: Arc<StdMutex<usize>>,
    }

    impl Channel for VecChannel {
        fn write(&mut self, data: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.flushes.lock().unwrap() += 1;
            Ok(())
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_write_data_within_window() {
        let channel = VecChannel::default();
        let written = Arc::clone(&channel.written);
        let flushes = Arc::clone(&channel.flushes);
        let encoder = Http2Encoder::new(channel);

        encoder
            .write_data(DataFrame::new(1, Bytes::from_static(b"hello"), true))
            .unwrap();
        assert_eq!(encoder.pending_data_len(), 0);
        assert_eq!(written.lock().unwrap().len(), codec::FRAME_HEADER_SIZE + 5);
        assert_eq!(*flushes.lock().unwrap(), 1);
    }

    #[test]
    fn test_window_exhaustion_splits_frame() {
        let channel = VecChannel::default();
        let written = Arc::clone(&channel.written);
        let encoder = Http2Encoder::with_send_window(channel, 3).unwrap();

        encoder
            .write_data(DataFrame::new(1, Bytes::from_static(b"abcdef"), true))
            .unwrap();
        // only the 3-byte prefix went out
        assert_eq!(encoder.pending_data_len(), 3);
        assert_eq!(encoder.sendable(), 0);
        {
            let bytes = written.lock().unwrap();
            assert_eq!(bytes.len(), codec::FRAME_HEADER_SIZE + 3);
            assert_eq!(&bytes[codec::FRAME_HEADER_SIZE..], b"abc");
            // prefix must not carry END_STREAM
            assert_eq!(bytes[4], 0);
        }

        // window update releases the remainder with END_STREAM intact
        encoder.handle_window_update(10).unwrap();
        assert_eq!(encoder.pending_data_len(), 0);
        let bytes = written.lock().unwrap();
        let tail = &bytes[codec::FRAME_HEADER_SIZE + 3..];
        assert_eq!(&tail[codec::FRAME_HEADER_SIZE..], b"def");
        assert_eq!(tail[4], crate::http::h2::frames::flags::END_STREAM);
    }

    #[test]
    fn test_headers_write_drains_pending() {
        let channel = VecChannel::default();
        let written = Arc::clone(&channel.written);
        let encoder = Http2Encoder::with_send_window(channel, 0).unwrap();

        encoder
            .write_data(DataFrame::new(1, Bytes::from_static(b"xy"), false))
            .unwrap();
        assert_eq!(encoder.pending_data_len(), 2);

        // opening the window during an unrelated write drains the queue
        encoder.handle_window_update(100).unwrap();
        let mut headers = Headers::new();
        headers.insert(":status", "200");
        encoder.write_headers(3, &headers, false).unwrap();

        assert_eq!(encoder.pending_data_len(), 0);
        assert!(!written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_large_payload_split_at_frame_size_limit() {
        let channel = VecChannel::default();
        let written = Arc::clone(&channel.written);
        let encoder =
            Http2Encoder::with_send_window(channel, crate::http::h2::flow_control::MAX_WINDOW_SIZE)
                .unwrap();

        let payload_len = MAX_FRAME_SIZE * 2 + 100;
        encoder
            .write_data(DataFrame::new(1, Bytes::from(vec![7u8; payload_len]), true))
            .unwrap();
        assert_eq!(encoder.pending_data_len(), 0);

        // every emitted frame honors the limit and the length field
        let bytes = written.lock().unwrap();
        let mut offset = 0;
        let mut lengths = Vec::new();
        let mut last_flags = 0;
        while offset < bytes.len() {
            let length = ((bytes[offset] as usize) << 16)
                | ((bytes[offset + 1] as usize) << 8)
                | bytes[offset + 2] as usize;
            assert!(length <= MAX_FRAME_SIZE);
            last_flags = bytes[offset + 4];
            lengths.push(length);
            offset += codec::FRAME_HEADER_SIZE + length;
        }
        assert_eq!(lengths, vec![MAX_FRAME_SIZE, MAX_FRAME_SIZE, 100]);
        assert_eq!(
            last_flags & crate::http::h2::frames::flags::END_STREAM,
            crate::http::h2::frames::flags::END_STREAM
        );
    }

    #[test]
    fn test_oversized_header_block_is_rejected() {
        let encoder = Http2Encoder::new(VecChannel::default());
        let mut headers = Headers::new();
        // incompressible value forces the block past the frame limit
        let huge: String = (0..MAX_FRAME_SIZE * 2)
            .map(|i| char::from(b'a' + (i % 17) as u8))
            .collect();
        headers.insert("x-blob", huge);
        assert!(matches!(
            encoder.write_headers(1, &headers, false),
            Err(crate::http::h2::Error::FrameSize(_))
        ));
    }

    #[test]
    fn test_empty_last_frame_needs_no_credit() {
        let channel = VecChannel::default();
        let written = Arc::clone(&channel.written);
        let encoder = Http2Encoder::with_send_window(channel, 0).unwrap();

        encoder
            .write_data(DataFrame::new(1, Bytes::new(), true))
            .unwrap();
        assert_eq!(encoder.pending_data_len(), 0);
        assert_eq!(written.lock().unwrap().len(), codec::FRAME_HEADER_SIZE);
    }
}
