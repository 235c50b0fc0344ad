//! HTTP/2 flow control
//!
//! Tracks the connection-level send window (RFC 7540 Section 6.9). The
//! window limits how many DATA payload bytes may be written before the
//! peer grants more credit through WINDOW_UPDATE frames.

use super::error::{Error, Result};
use super::DEFAULT_INITIAL_WINDOW_SIZE;

/// Maximum window size allowed by RFC 7540 (2^31 - 1)
pub const MAX_WINDOW_SIZE: u32 = 0x7fff_ffff;

/// A flow control window
///
/// Windows can go negative when the peer shrinks the initial window
/// size while data is in flight, so the size is tracked as i64.
#[derive(Debug, Clone)]
pub struct FlowControlWindow {
    size: i64,
}

impl FlowControlWindow {
    /// Create a window with the RFC 7540 default size (65535)
    pub fn new() -> Self {
        FlowControlWindow {
            size: DEFAULT_INITIAL_WINDOW_SIZE as i64,
        }
    }

    /// Create a window with a specific initial size
    pub fn with_size(size: u32) -> Result<Self> {
        if size > MAX_WINDOW_SIZE {
            return Err(Error::FlowControl(format!(
                "window size {} exceeds maximum {}",
                size, MAX_WINDOW_SIZE
            )));
        }
        Ok(FlowControlWindow { size: size as i64 })
    }

    /// Current window size (negative when over-committed)
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Available capacity, clamped at zero
    pub fn available(&self) -> usize {
        self.size.max(0) as usize
    }

    /// Consume up to `requested` bytes and return how many were granted
    pub fn consume(&mut self, requested: usize) -> usize {
        let granted = (requested as i64).min(self.size.max(0)) as usize;
        self.size -= granted as i64;
        granted
    }

    /// Grow the window by `increment` bytes
    pub fn increase(&mut self, increment: u32) -> Result<()> {
        let new_size = self.size + increment as i64;
        if new_size > MAX_WINDOW_SIZE as i64 {
            return Err(Error::FlowControl(format!(
                "window increment {} overflows maximum {}",
                increment, MAX_WINDOW_SIZE
            )));
        }
        self.size = new_size;
        Ok(())
    }
}

impl Default for FlowControlWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection-level send window
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlowControl {
    send_window: FlowControlWindow,
}

impl ConnectionFlowControl {
    /// Create connection flow control with default window size
    pub fn new() -> Self {
        Self::default()
    }

    /// Create connection flow control with a specific send window size
    pub fn with_send_window(size: u32) -> Result<Self> {
        Ok(ConnectionFlowControl {
            send_window: FlowControlWindow::with_size(size)?,
        })
    }

    /// Bytes that may be sent right now
    pub fn sendable(&self) -> usize {
        self.send_window.available()
    }

    /// Consume up to `requested` bytes of send credit
    pub fn consume_send_window(&mut self, requested: usize) -> usize {
        self.send_window.consume(requested)
    }

    /// Apply a WINDOW_UPDATE received from the peer
    pub fn increase_send_window(&mut self, increment: u32) -> Result<()> {
        self.send_window.increase(increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_size() {
        let window = FlowControlWindow::new();
        assert_eq!(window.size(), 65535);
        assert_eq!(window.available(), 65535);
    }

    #[test]
    fn test_consume_partial() {
        let mut window = FlowControlWindow::with_size(10).unwrap();
        assert_eq!(window.consume(4), 4);
        assert_eq!(window.size(), 6);
        // requesting more than available grants only the remainder
        assert_eq!(window.consume(100), 6);
        assert_eq!(window.consume(1), 0);
    }

    #[test]
    fn test_increase_restores_credit() {
        let mut window = FlowControlWindow::with_size(0).unwrap();
        assert_eq!(window.consume(5), 0);
        window.increase(8).unwrap();
        assert_eq!(window.consume(5), 5);
        assert_eq!(window.size(), 3);
    }

    #[test]
    fn test_increase_overflow() {
        let mut window = FlowControlWindow::with_size(MAX_WINDOW_SIZE).unwrap();
        assert!(window.increase(1).is_err());
    }

    #[test]
    fn test_window_size_limit() {
        assert!(FlowControlWindow::with_size(MAX_WINDOW_SIZE).is_ok());
        assert!(FlowControlWindow::with_size(MAX_WINDOW_SIZE + 1).is_err());
    }
}
