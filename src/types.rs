//! Core types used throughout the control stack.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CoAP token identifying one outstanding exchange.
///
/// The stack always generates 4-byte tokens (the protocol allows 0-8 bytes on
/// receive). Tokens are drawn from `rand` and re-drawn on collision with an
/// outstanding exchange, so no two live exchanges ever share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(pub [u8; 4]);

impl Token {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 4];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Compare against a wire token of arbitrary length.
    pub fn matches(&self, wire: &[u8]) -> bool {
        wire == self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Switch model, inferred from the populated port count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceModel {
    /// 2-port LAN9662
    Lan9662,
    /// 8-port LAN9668
    Lan9668,
    /// 12-port LAN9692
    Lan9692,
    /// Port count did not match a known model. Not a failure.
    #[default]
    Unknown,
}

impl DeviceModel {
    /// Infer the model from the number of populated ports.
    pub fn from_port_count(ports: usize) -> Self {
        match ports {
            2 => Self::Lan9662,
            8 => Self::Lan9668,
            12 => Self::Lan9692,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lan9662 => write!(f, "LAN9662"),
            Self::Lan9668 => write!(f, "LAN9668"),
            Self::Lan9692 => write!(f, "LAN9692"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Connection lifecycle of one core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}

/// Per-exchange state, driven by inbound CoAP and the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Idle,
    Sent,
    AwaitAck,
    AwaitBlock1Ack,
    AwaitBlock2,
    Done,
    Failed,
    TimedOut,
    Cancelled,
}

impl ExchangeState {
    /// Terminal states free the token and drop late replies.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Done | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }
}

/// Asynchronous notifications from the device that are not responses:
/// announce banners and trace output.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// MUP1 `A` frame: firmware version banner emitted on boot and reconnect.
    Announce(String),
    /// MUP1 `T` frame: free-form trace text.
    Trace(String),
}

/// Progress of a block-wise transfer, reported per acknowledged block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes acknowledged by the device so far.
    pub sent: u64,
    /// Total bytes in the transfer.
    pub total: u64,
}

impl TransferProgress {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.sent as f64 / self.total as f64
        }
    }
}

/// Counters kept by the framer and the client engine.
///
/// Frame corruption is counted here rather than surfaced as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StackStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub checksum_errors: u64,
    pub frames_abandoned: u64,
    pub retransmits: u64,
    pub timeouts: u64,
    pub unmatched_responses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_from_port_count() {
        assert_eq!(DeviceModel::from_port_count(2), DeviceModel::Lan9662);
        assert_eq!(DeviceModel::from_port_count(8), DeviceModel::Lan9668);
        assert_eq!(DeviceModel::from_port_count(12), DeviceModel::Lan9692);
        assert_eq!(DeviceModel::from_port_count(5), DeviceModel::Unknown);
        assert_eq!(DeviceModel::from_port_count(0), DeviceModel::Unknown);
    }

    #[test]
    fn token_matches_wire_bytes() {
        let token = Token::from_bytes([0xde, 0xad, 0xbe, 0xef]);
        assert!(token.matches(&[0xde, 0xad, 0xbe, 0xef]));
        assert!(!token.matches(&[0xde, 0xad, 0xbe]));
        assert!(!token.matches(&[]));
        assert_eq!(token.to_string(), "deadbeef");
    }

    #[test]
    fn terminal_exchange_states() {
        assert!(ExchangeState::Done.is_terminal());
        assert!(ExchangeState::Cancelled.is_terminal());
        assert!(!ExchangeState::AwaitBlock2.is_terminal());
        assert!(!ExchangeState::Sent.is_terminal());
    }
}
