//! In-memory transport pair for tests and loopback use.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use super::Transport;
use crate::error::{Result, TransportError};

/// One end of an in-memory duplex byte channel.
pub struct MemTransport {
    stream: DuplexStream,
    label: &'static str,
}

/// Create a connected transport pair. Bytes written to one end are read from
/// the other, with an internal buffer large enough for block transfers.
pub fn pair() -> (MemTransport, MemTransport) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    (
        MemTransport {
            stream: a,
            label: "mem-a",
        },
        MemTransport {
            stream: b,
            label: "mem-b",
        },
    )
}

#[async_trait]
impl Transport for MemTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .stream
            .read(buf)
            .await
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.stream
            .write_all(buf)
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.stream
            .flush()
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_is_duplex() {
        let (mut a, mut b) = pair();

        a.write(b"hello").await.unwrap();
        let mut buf = [0u8; 16];
        let n = b.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        b.write(b"world").await.unwrap();
        let n = a.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"world");
    }

    #[tokio::test]
    async fn read_returns_zero_on_close() {
        let (mut a, b) = pair();
        drop(b);
        let mut buf = [0u8; 16];
        assert_eq!(a.read(&mut buf).await.unwrap(), 0);
    }
}
