//! Channel abstraction
//!
//! The channel is the boundary between this core and the transport below
//! it: an established connection capable of accepting encoded bytes. TLS,
//! ALPN and socket setup happen on the other side of this trait.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Writable side of an established connection
pub trait Channel: Send {
    /// Write all bytes to the transport
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush buffered bytes to the wire
    fn flush(&mut self) -> io::Result<()>;

    /// Close the connection
    fn close(&mut self);

    /// Whether the connection is still open
    fn is_open(&self) -> bool;
}

/// A channel shared between the event thread and application threads
///
/// Response dispatch runs on whichever thread completes the response
/// future, so the channel is behind a mutex.
pub type SharedChannel<C> = Arc<Mutex<C>>;

/// Wrap a channel for shared use
pub fn shared<C: Channel>(channel: C) -> SharedChannel<C> {
    Arc::new(Mutex::new(channel))
}

/// Lock a shared channel, recovering the guard if a previous holder
/// panicked mid-write
///
/// A panicking `Channel` implementation poisons the mutex; the channel
/// itself stays usable, so later events on the connection must not
/// panic on the lock.
pub fn lock_channel<C: Channel>(channel: &SharedChannel<C>) -> MutexGuard<'_, C> {
    channel.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Channel for TcpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) {
        let _ = self.shutdown(Shutdown::Both);
    }

    fn is_open(&self) -> bool {
        // A shut-down stream reports a zero peer address error
        self.peer_addr().is_ok()
    }
}
