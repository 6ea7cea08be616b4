//! Byte-oriented duplex transports.
//!
//! The protocol stack is transport-agnostic: anything that can deliver and
//! accept raw bytes can carry MUP1 frames. The usual production transport is
//! a serial console at 115200 8N1; a TCP variant covers ser2net-style
//! bridges, and an in-memory pair backs the tests.

mod mem;
mod tcp;

#[cfg(feature = "serial")]
mod serial;

pub use mem::{pair, MemTransport};
pub use tcp::TcpTransport;

#[cfg(feature = "serial")]
pub use serial::{list_ports, PortInfo, SerialTransport};

use async_trait::async_trait;

use crate::error::Result;

/// Abstract duplex byte channel.
///
/// One transport is exclusive to one core instance. Reads block until at
/// least one byte is available; a read of zero bytes means the peer closed.
#[async_trait]
pub trait Transport: Send {
    /// Read available bytes into `buf`, returning the count. `Ok(0)` means
    /// the transport is closed.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf`.
    async fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush buffered output to the wire.
    async fn flush(&mut self) -> Result<()>;

    /// Human-readable endpoint description for diagnostics.
    fn describe(&self) -> String;
}
