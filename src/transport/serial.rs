//! Serial transport over a local UART device.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::Transport;
use crate::config::TransportConfig;
use crate::error::{Result, TransportError};

/// Serial port transport. 8 data bits, no parity, one stop bit, no flow
/// control -- the only framing the device speaks.
pub struct SerialTransport {
    stream: SerialStream,
    port: String,
}

impl SerialTransport {
    /// Open a serial device such as `/dev/ttyACM0`.
    pub fn open(port: &str, config: &TransportConfig) -> Result<Self> {
        let stream = tokio_serial::new(port, config.baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TransportError::OpenFailed {
                port: port.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(port, baud = config.baud, "serial port opened");

        Ok(Self {
            stream,
            port: port.to_string(),
        })
    }
}

#[async_trait]
impl Transport for SerialTransport {
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
        format!("serial://{}", self.port)
    }
}

/// Description of an enumerable serial port.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub name: String,
    /// USB product string where the OS exposes one.
    pub product: Option<String>,
}

/// Enumerate serial ports visible to the host.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports =
        tokio_serial::available_ports().map_err(|e| TransportError::Enumeration(e.to_string()))?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let product = match p.port_type {
                tokio_serial::SerialPortType::UsbPort(usb) => usb.product,
                _ => None,
            };
            PortInfo {
                name: p.port_name,
                product,
            }
        })
        .collect())
}
