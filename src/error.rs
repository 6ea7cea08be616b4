//! Error types for the control stack.

use std::io;

use thiserror::Error;

use crate::coap::Code;
use crate::types::Token;

/// Result type alias for control-stack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The transport closed while exchanges were outstanding. Every pending
    /// exchange fails with this.
    #[error("transport down")]
    TransportDown,

    // Protocol errors
    #[error("CoAP error: {0}")]
    Coap(#[from] CoapError),

    #[error("CBOR error: {0}")]
    Cbor(#[from] CborError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    // Exchange outcomes
    #[error("request timed out after {attempts} attempts on {path} (token {token})")]
    Timeout {
        path: String,
        token: Token,
        attempts: u32,
    },

    #[error("device sent RST for {path} (token {token})")]
    Reset { path: String, token: Token },

    #[error("client error {code} on {path} (token {token})")]
    ClientError {
        code: Code,
        path: String,
        token: Token,
    },

    #[error("server error {code} on {path} (token {token})")]
    ServerError {
        code: Code,
        path: String,
        token: Token,
    },

    #[error("exchange cancelled (token {0})")]
    Cancelled(Token),

    // Data-model errors
    #[error("unknown SID path: {0}")]
    UnknownSid(String),

    #[error("validation failed for {path}: {reason}")]
    Validation { path: String, reason: String },

    #[error("ping timed out")]
    PingTimeout,

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Transport layer errors.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("transport closed")]
    Closed,

    #[error("port enumeration failed: {0}")]
    Enumeration(String),
}

/// MUP1 framing errors.
///
/// Frame emission is infallible and parse-side corruption is counted rather
/// than raised, so these only surface from explicit construction paths.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid frame type byte: {0:#04x}")]
    InvalidType(u8),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// CoAP encoding and parsing errors.
#[derive(Error, Debug)]
pub enum CoapError {
    #[error("message truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("unsupported CoAP version {0}")]
    InvalidVersion(u8),

    #[error("token length {0} exceeds 8")]
    TokenTooLong(usize),

    #[error("reserved option nibble 15 in delta/length")]
    ReservedNibble,

    #[error("option number overflows 16 bits")]
    OptionNumberOverflow,

    #[error("payload marker present but payload is empty")]
    MarkerWithoutPayload,

    #[error("invalid block option value")]
    InvalidBlock,

    #[error("unexpected block number: expected {expected}, got {got}")]
    BlockOutOfOrder { expected: u32, got: u32 },

    #[error("unexpected response code {0}")]
    UnexpectedCode(Code),
}

/// CBOR codec errors.
#[derive(Error, Debug)]
pub enum CborError {
    #[error("CBOR encode error: {0}")]
    Encode(String),

    #[error("CBOR decode error: {0}")]
    Decode(String),

    #[error("unexpected CBOR item: expected {expected}, got {got}")]
    UnexpectedItem {
        expected: &'static str,
        got: &'static str,
    },

    #[error("map key is not a text string or SID")]
    InvalidMapKey,
}

impl Error {
    /// Check if the error is worth retrying at a higher layer.
    ///
    /// 4.xx/5.xx responses and RST are definitive answers from the device;
    /// timeouts and transport hiccups are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. }
                | Error::PingTimeout
                | Error::Transport(TransportError::ReadFailed(_) | TransportError::WriteFailed(_))
                | Error::Io(_)
        )
    }

    /// CLI exit code classification: 1 usage, 2 transport, 3 protocol,
    /// 4 device.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 1,
            Error::Transport(_) | Error::TransportDown | Error::Io(_) => 2,
            Error::ClientError { .. } | Error::ServerError { .. } | Error::Reset { .. } => 4,
            _ => 3,
        }
    }
}
