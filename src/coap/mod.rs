//! CoAP message layer (RFC 7252) with block-wise transfer values (RFC 7959).
//!
//! Only the message model lives here: header and option wire coding, codes,
//! and block option values. Retransmission, token bookkeeping and block
//! state machines belong to [`crate::client`].

mod block;
mod message;
mod option;

pub use block::BlockValue;
pub use message::{Code, Message, MessageType, Method};
pub use option::{content_format, option_number, CoapOption};
