//! HTTP/2 stream layer
//!
//! Stream id allocation and the live-stream registry, the frame write
//! bridge with connection flow control, push promise handling on both
//! sides, and the server-side inbound frame path. Header compression
//! uses HPACK (RFC 7541) via the `hpack` crate.

pub mod buffer;
pub mod codec;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod flow_control;
pub mod frames;
pub mod listener;
pub mod outbound;
pub mod source;
pub mod state_util;
pub mod streams;

pub use buffer::{FrameBuffer, InboundDataFrame, ReleaseProbe};
pub use dispatch::Http2OutboundRespListener;
pub use encoder::Http2Encoder;
pub use error::{Error, ErrorCode, Result};
pub use frames::{DataFrame, FrameType, HeadersFrame, PushPromiseFrame, RstStreamFrame};
pub use listener::DataEventListener;
pub use outbound::{OutboundMsgHolder, PushPromise};
pub use source::Http2SourceHandler;
pub use streams::{Http2Connection, StreamId, StreamRegistry};

/// Default initial flow control window size (RFC 7540 Section 6.9.2)
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65_535;

/// Largest stream id expressible in the 31-bit wire field
pub const MAX_STREAM_ID: u32 = 0x7fff_ffff;

/// Stream id 0 addresses the connection itself
pub const CONNECTION_STREAM_ID: u32 = 0;
