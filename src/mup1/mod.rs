//! MUP1 framing layer.
//!
//! MUP1 (Microchip UART Protocol #1) wraps each payload in an ASCII-delimited
//! envelope:
//!
//! ```text
//! SOF('>') | TYPE | escaped payload | EOF('<') [EOF] | CHK0..CHK3
//! ```
//!
//! Payload bytes that collide with the delimiters are escaped with `\`; the
//! EOF is doubled when the payload length is even; the trailer is the 16-bit
//! one's-complement checksum of everything from SOF through the EOF(s),
//! spelled as four uppercase hex digits. Frames carry no sequence numbers --
//! the checksum detects corruption, not reordering.

mod codec;
mod frame;
mod parser;

pub use codec::Mup1Codec;
pub use frame::{checksum, FrameType, Mup1Frame};
pub use parser::{Mup1Parser, ParserStats};

/// Start-of-frame delimiter (`>`).
pub const SOF: u8 = 0x3E;

/// End-of-frame delimiter (`<`).
pub const EOF: u8 = 0x3C;

/// Escape introducer (`\`).
pub const ESC: u8 = 0x5C;
