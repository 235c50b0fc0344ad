//! Dual-protocol HTTP transport core
//!
//! This crate implements the request-receiving side of an HTTP/1.1 and
//! HTTP/2 transport: a per-connection state machine that turns decoded wire
//! events into application-visible messages, and an HTTP/2 stream layer
//! coordinating stream identity, push promises and buffer lifetime.
//!
//! TLS/ALPN negotiation, channel bootstrap and frame decoding live outside
//! this crate; they hand in an established connection with a negotiated
//! protocol version through the [`http::Channel`] seam and feed decoded
//! events into [`http::SourceHandler`] (HTTP/1.1) or
//! [`http::h2::Http2SourceHandler`] (HTTP/2).

pub mod http;
