//! # velocitysp
//!
//! Host-side control stack for Microchip VelocityDRIVE-SP Ethernet switches
//! (LAN9662/68/92).
//!
//! The device speaks a layered protocol: a UART framing layer (MUP1) carries
//! CoAP request/response messages whose payloads are CBOR-encoded YANG data,
//! keyed either by textual paths or by numeric SIDs. This crate implements
//! the full host side of that stack and a typed management facade on top.
//!
//! ## Architecture
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Management facade (ping / identify / YANG)       │
//! ├──────────────┬───────────────────────────┬──────────────────┤
//! │  SID table   │   CBOR / YANG-SID codec   │   TSN builders   │
//! ├──────────────┴───────────────────────────┴──────────────────┤
//! │     CoAP engine (tokens, message IDs, retransmit, blocks)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │          MUP1 framer (escape, checksum, parser FSM)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │        Transport (serial / TCP bridge / in-memory)          │
//! └─────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic)]
// Allow stylistic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)] // Wire fields are width-checked before narrowing
#![allow(clippy::cast_lossless)]
#![allow(clippy::doc_markdown)] // ASCII diagrams and protocol names in docs
#![allow(clippy::too_many_lines)] // State machines are written out in full
#![allow(clippy::match_same_arms)] // Explicit arm per variant is clearer

pub mod cbor;
pub mod client;
pub mod coap;
pub mod config;
pub mod device;
pub mod error;
pub mod mup1;
pub mod sid;
pub mod transport;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::Config;
pub use device::Device;
pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default serial baud rate for VelocityDRIVE-SP consoles.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Maximum MUP1 frame payload accepted before the parser abandons the frame.
pub const MAX_FRAME_PAYLOAD: usize = 1024;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cbor::YangValue;
    pub use crate::client::{CoapClient, CoapRequest, ExchangeHandle, Response};
    pub use crate::coap::{Code, Message, MessageType, Method};
    pub use crate::config::Config;
    pub use crate::device::{Device, DeviceInfo};
    pub use crate::error::{Error, Result};
    pub use crate::mup1::{FrameType, Mup1Frame};
    pub use crate::sid::SidTable;
    pub use crate::transport::Transport;
    pub use crate::types::*;
}
