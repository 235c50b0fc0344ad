//! HTTP/2 frame encoding
//!
//! This module serializes frames into the 9-byte-header wire format of
//! RFC 7540 Section 4.1. Writes always go through [`super::encoder::Http2Encoder`],
//! which owns the channel and the HPACK compression context.

use super::error::{Error, Result};
use super::frames::{flags, DataFrame, FrameType, HeadersFrame, PushPromiseFrame, RstStreamFrame};
use super::streams::StreamId;
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the fixed frame header in bytes
pub const FRAME_HEADER_SIZE: usize = 9;

/// Maximum frame payload size this implementation emits
pub const MAX_FRAME_SIZE: usize = 16_384;

/// Fixed 9-byte frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length (24 bits on the wire)
    pub length: u32,
    /// Frame type
    pub frame_type: FrameType,
    /// Frame flags
    pub flags: u8,
    /// Stream identifier (31 bits on the wire)
    pub stream_id: StreamId,
}

impl FrameHeader {
    /// Encode the header into a buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((self.length >> 16) as u8);
        buf.put_u8((self.length >> 8) as u8);
        buf.put_u8(self.length as u8);
        buf.put_u8(self.frame_type.as_u8());
        buf.put_u8(self.flags);
        buf.put_u32(self.stream_id & 0x7fff_ffff);
    }

    /// Decode a header from exactly [`FRAME_HEADER_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(Error::FrameSize(format!(
                "frame header needs {} bytes, got {}",
                FRAME_HEADER_SIZE,
                bytes.len()
            )));
        }
        let length =
            ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
        let frame_type = FrameType::from_u8(bytes[3])
            .ok_or_else(|| Error::Protocol(format!("unknown frame type 0x{:x}", bytes[3])))?;
        let flags = bytes[4];
        let stream_id = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]])
            & 0x7fff_ffff;
        Ok(FrameHeader {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }
}

/// Encode a DATA frame
///
/// Callers split payloads at [`MAX_FRAME_SIZE`] before encoding; the
/// flow-control drain in [`super::encoder`] guarantees this for queued
/// data.
pub fn encode_data_frame(frame: &DataFrame) -> Bytes {
    debug_assert!(frame.data.len() <= MAX_FRAME_SIZE);
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.data.len());
    let header = FrameHeader {
        length: frame.data.len() as u32,
        frame_type: FrameType::Data,
        flags: if frame.end_stream { flags::END_STREAM } else { 0 },
        stream_id: frame.stream_id,
    };
    header.encode(&mut buf);
    buf.put_slice(&frame.data);
    buf.freeze()
}

/// Encode a HEADERS frame
///
/// Header blocks larger than [`MAX_FRAME_SIZE`] would need
/// CONTINUATION frames, which this codec does not emit; they are
/// rejected instead of truncating the 24-bit length field.
pub fn encode_headers_frame(frame: &HeadersFrame) -> Result<Bytes> {
    if frame.header_block.len() > MAX_FRAME_SIZE {
        return Err(Error::FrameSize(format!(
            "header block of {} bytes exceeds the {} byte frame limit",
            frame.header_block.len(),
            MAX_FRAME_SIZE
        )));
    }
    let mut frame_flags = 0u8;
    if frame.end_stream {
        frame_flags |= flags::END_STREAM;
    }
    if frame.end_headers {
        frame_flags |= flags::END_HEADERS;
    }
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.header_block.len());
    let header = FrameHeader {
        length: frame.header_block.len() as u32,
        frame_type: FrameType::Headers,
        flags: frame_flags,
        stream_id: frame.stream_id,
    };
    header.encode(&mut buf);
    buf.put_slice(&frame.header_block);
    Ok(buf.freeze())
}

/// Encode a PUSH_PROMISE frame
pub fn encode_push_promise_frame(frame: &PushPromiseFrame) -> Result<Bytes> {
    let payload_len = 4 + frame.header_block.len();
    if payload_len > MAX_FRAME_SIZE {
        return Err(Error::FrameSize(format!(
            "push promise payload of {} bytes exceeds the {} byte frame limit",
            payload_len, MAX_FRAME_SIZE
        )));
    }
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);
    let header = FrameHeader {
        length: payload_len as u32,
        frame_type: FrameType::PushPromise,
        flags: if frame.end_headers { flags::END_HEADERS } else { 0 },
        stream_id: frame.stream_id,
    };
    header.encode(&mut buf);
    buf.put_u32(frame.promised_stream_id & 0x7fff_ffff);
    buf.put_slice(&frame.header_block);
    Ok(buf.freeze())
}

/// Encode a RST_STREAM frame
pub fn encode_rst_stream_frame(frame: &RstStreamFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 4);
    let header = FrameHeader {
        length: 4,
        frame_type: FrameType::RstStream,
        flags: 0,
        stream_id: frame.stream_id,
    };
    header.encode(&mut buf);
    buf.put_u32(frame.error_code.as_u32());
    buf.freeze()
}
