//! HTTP/2 frame definitions
//!
//! This module defines the frame types used by the stream layer, as
//! specified in RFC 7540 Section 6.

use super::error::ErrorCode;
use super::streams::StreamId;
use bytes::Bytes;

/// HTTP/2 frame types as defined in RFC 7540 Section 6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// DATA frame (0x0)
    Data = 0x0,
    /// HEADERS frame (0x1)
    Headers = 0x1,
    /// PRIORITY frame (0x2)
    Priority = 0x2,
    /// RST_STREAM frame (0x3)
    RstStream = 0x3,
    /// SETTINGS frame (0x4)
    Settings = 0x4,
    /// PUSH_PROMISE frame (0x5)
    PushPromise = 0x5,
    /// PING frame (0x6)
    Ping = 0x6,
    /// GOAWAY frame (0x7)
    GoAway = 0x7,
    /// WINDOW_UPDATE frame (0x8)
    WindowUpdate = 0x8,
    /// CONTINUATION frame (0x9)
    Continuation = 0x9,
}

impl FrameType {
    /// Convert frame type to u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create frame type from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(FrameType::Data),
            0x1 => Some(FrameType::Headers),
            0x2 => Some(FrameType::Priority),
            0x3 => Some(FrameType::RstStream),
            0x4 => Some(FrameType::Settings),
            0x5 => Some(FrameType::PushPromise),
            0x6 => Some(FrameType::Ping),
            0x7 => Some(FrameType::GoAway),
            0x8 => Some(FrameType::WindowUpdate),
            0x9 => Some(FrameType::Continuation),
            _ => None,
        }
    }
}

/// Frame flags as defined in RFC 7540
pub mod flags {
    /// END_STREAM flag (DATA, HEADERS)
    pub const END_STREAM: u8 = 0x1;
    /// END_HEADERS flag (HEADERS, PUSH_PROMISE, CONTINUATION)
    pub const END_HEADERS: u8 = 0x4;
    /// PADDED flag (DATA, HEADERS, PUSH_PROMISE)
    pub const PADDED: u8 = 0x8;
    /// PRIORITY flag (HEADERS)
    pub const PRIORITY: u8 = 0x20;
}

/// DATA frame carrying application payload for a stream
#[derive(Debug, Clone)]
pub struct DataFrame {
    /// Stream identifier
    pub stream_id: StreamId,
    /// Frame payload
    pub data: Bytes,
    /// END_STREAM flag
    pub end_stream: bool,
}

impl DataFrame {
    /// Create a new DATA frame
    pub fn new(stream_id: StreamId, data: Bytes, end_stream: bool) -> Self {
        DataFrame {
            stream_id,
            data,
            end_stream,
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
}

/// HEADERS frame carrying an HPACK-encoded header block
#[derive(Debug, Clone)]
pub struct HeadersFrame {
    /// Stream identifier
    pub stream_id: StreamId,
    /// HPACK-encoded header block fragment
    pub header_block: Bytes,
    /// END_STREAM flag
    pub end_stream: bool,
    /// END_HEADERS flag
    pub end_headers: bool,
}

impl HeadersFrame {
    /// Create a new HEADERS frame
    pub fn new(stream_id: StreamId, header_block: Bytes, end_stream: bool) -> Self {
        HeadersFrame {
            stream_id,
            header_block,
            end_stream,
            end_headers: true,
        }
    }
}

/// PUSH_PROMISE frame announcing a server-initiated stream
#[derive(Debug, Clone)]
pub struct PushPromiseFrame {
    /// Stream the promise is sent on
    pub stream_id: StreamId,
    /// Reserved stream the pushed response will use
    pub promised_stream_id: StreamId,
    /// HPACK-encoded request header block
    pub header_block: Bytes,
    /// END_HEADERS flag
    pub end_headers: bool,
}

impl PushPromiseFrame {
    /// Create a new PUSH_PROMISE frame
    pub fn new(stream_id: StreamId, promised_stream_id: StreamId, header_block: Bytes) -> Self {
        PushPromiseFrame {
            stream_id,
            promised_stream_id,
            header_block,
            end_headers: true,
        }
    }
}

/// RST_STREAM frame terminating a single stream
#[derive(Debug, Clone, Copy)]
pub struct RstStreamFrame {
    /// Stream identifier
    pub stream_id: StreamId,
    /// Error code explaining the termination
    pub error_code: ErrorCode,
}

impl RstStreamFrame {
    /// Create a new RST_STREAM frame
    pub fn new(stream_id: StreamId, error_code: ErrorCode) -> Self {
        RstStreamFrame {
            stream_id,
            error_code,
        }
    }
}
