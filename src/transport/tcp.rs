//! TCP transport for serial-over-network bridges (ser2net and friends).

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::Transport;
use crate::config::TransportConfig;
use crate::error::{Result, TransportError};

/// TCP client transport.
pub struct TcpTransport {
    stream: TcpStream,
    remote_addr: SocketAddr,
}

impl TcpTransport {
    /// Connect to a remote bridge.
    pub async fn connect(remote_addr: SocketAddr, config: &TransportConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(remote_addr))
            .await
            .map_err(|_| TransportError::OpenFailed {
                port: remote_addr.to_string(),
                reason: "connect timeout".into(),
            })?
            .map_err(|e| TransportError::OpenFailed {
                port: remote_addr.to_string(),
                reason: e.to_string(),
            })?;

        // Frames are small and latency-sensitive
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::OpenFailed {
                port: remote_addr.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            stream,
            remote_addr,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
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
        format!("tcp://{}", self.remote_addr)
    }
}
