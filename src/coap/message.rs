//! CoAP message structure and wire coding.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::error::CoapError;

use super::block::BlockValue;
use super::option::{content_format, option_number, CoapOption};

/// CoAP protocol version. The only one that exists.
const VERSION: u8 = 1;

/// Payload marker separating options from a non-empty payload.
const PAYLOAD_MARKER: u8 = 0xFF;

/// Message type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Confirmable = 0,
    NonConfirmable = 1,
    Acknowledgement = 2,
    Reset = 3,
}

impl MessageType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Confirmable),
            1 => Some(Self::NonConfirmable),
            2 => Some(Self::Acknowledgement),
            3 => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Request method, mapped onto the 0.xx code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn code(self) -> Code {
        match self {
            Self::Get => Code::GET,
            Self::Post => Code::POST,
            Self::Put => Code::PUT,
            Self::Delete => Code::DELETE,
        }
    }
}

/// Message code: a 3-bit class and 5-bit detail, displayed `class.detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(pub u8);

impl Code {
    pub const EMPTY: Self = Self::new(0, 0);
    pub const GET: Self = Self::new(0, 1);
    pub const POST: Self = Self::new(0, 2);
    pub const PUT: Self = Self::new(0, 3);
    pub const DELETE: Self = Self::new(0, 4);

    pub const CREATED: Self = Self::new(2, 1);
    pub const DELETED: Self = Self::new(2, 2);
    pub const VALID: Self = Self::new(2, 3);
    pub const CHANGED: Self = Self::new(2, 4);
    pub const CONTENT: Self = Self::new(2, 5);
    pub const CONTINUE: Self = Self::new(2, 31);

    pub const BAD_REQUEST: Self = Self::new(4, 0);
    pub const NOT_FOUND: Self = Self::new(4, 4);
    pub const METHOD_NOT_ALLOWED: Self = Self::new(4, 5);
    pub const REQUEST_ENTITY_TOO_LARGE: Self = Self::new(4, 13);
    pub const UNSUPPORTED_CONTENT_FORMAT: Self = Self::new(4, 15);

    pub const INTERNAL_SERVER_ERROR: Self = Self::new(5, 0);

    pub const fn new(class: u8, detail: u8) -> Self {
        Self((class << 5) | (detail & 0x1F))
    }

    pub const fn class(self) -> u8 {
        self.0 >> 5
    }

    pub const fn detail(self) -> u8 {
        self.0 & 0x1F
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_request(self) -> bool {
        self.class() == 0 && self.detail() != 0
    }

    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    pub const fn is_client_error(self) -> bool {
        self.class() == 4
    }

    pub const fn is_server_error(self) -> bool {
        self.class() == 5
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.class(), self.detail())
    }
}

/// One CoAP message.
///
/// Options are kept in ascending number order at all times; options with the
/// same number keep their insertion order (the delta encoding depends on the
/// ordering, repeated Uri-Path segments on the stability).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub mtype: MessageType,
    pub code: Code,
    pub message_id: u16,
    pub token: Vec<u8>,
    options: Vec<CoapOption>,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(mtype: MessageType, code: Code, message_id: u16) -> Self {
        Self {
            mtype,
            code,
            message_id,
            token: Vec::new(),
            options: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Build a confirmable request for a resource path.
    ///
    /// The path is split on `/` into repeated Uri-Path options; a leading or
    /// trailing slash contributes no empty segment.
    pub fn request(method: Method, message_id: u16, token: &[u8], path: &str) -> Self {
        let mut msg = Self::new(MessageType::Confirmable, method.code(), message_id);
        msg.token = token.to_vec();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            msg.add_option(CoapOption::new(option_number::URI_PATH, segment.as_bytes()));
        }
        msg
    }

    /// An empty ACK for a received confirmable message.
    pub fn ack(message_id: u16) -> Self {
        Self::new(MessageType::Acknowledgement, Code::EMPTY, message_id)
    }

    /// Insert an option, preserving ascending-number order and the relative
    /// order of equal numbers.
    pub fn add_option(&mut self, option: CoapOption) {
        let at = self
            .options
            .iter()
            .rposition(|o| o.number <= option.number)
            .map_or(0, |i| i + 1);
        self.options.insert(at, option);
    }

    pub fn options(&self) -> &[CoapOption] {
        &self.options
    }

    /// First option with the given number.
    pub fn option(&self, number: u16) -> Option<&CoapOption> {
        self.options.iter().find(|o| o.number == number)
    }

    /// Remove every option with the given number.
    pub fn remove_options(&mut self, number: u16) {
        self.options.retain(|o| o.number != number);
    }

    pub fn set_content_format(&mut self, format: u16) {
        self.add_option(CoapOption::uint(
            option_number::CONTENT_FORMAT,
            u32::from(format),
        ));
    }

    pub fn content_format(&self) -> Option<u16> {
        self.option(option_number::CONTENT_FORMAT)
            .and_then(CoapOption::as_uint)
            .map(|v| v as u16)
    }

    pub fn set_block1(&mut self, block: BlockValue) {
        self.remove_options(option_number::BLOCK1);
        self.add_option(CoapOption::new(option_number::BLOCK1, block.encode()));
    }

    pub fn set_block2(&mut self, block: BlockValue) {
        self.remove_options(option_number::BLOCK2);
        self.add_option(CoapOption::new(option_number::BLOCK2, block.encode()));
    }

    pub fn block1(&self) -> Option<BlockValue> {
        self.option(option_number::BLOCK1)
            .and_then(|o| BlockValue::decode(&o.value).ok())
    }

    pub fn block2(&self) -> Option<BlockValue> {
        self.option(option_number::BLOCK2)
            .and_then(|o| BlockValue::decode(&o.value).ok())
    }

    /// Joined Uri-Path for diagnostics.
    pub fn uri_path(&self) -> String {
        let segments: Vec<_> = self
            .options
            .iter()
            .filter(|o| o.number == option_number::URI_PATH)
            .map(|o| String::from_utf8_lossy(&o.value).into_owned())
            .collect();
        segments.join("/")
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CoapError> {
        if self.token.len() > 8 {
            return Err(CoapError::TokenTooLong(self.token.len()));
        }

        let mut out = Vec::with_capacity(4 + self.token.len() + self.payload.len() + 16);
        out.push((VERSION << 6) | ((self.mtype as u8) << 4) | self.token.len() as u8);
        out.push(self.code.0);
        let mut mid = [0u8; 2];
        BigEndian::write_u16(&mut mid, self.message_id);
        out.extend_from_slice(&mid);
        out.extend_from_slice(&self.token);

        let mut previous = 0u16;
        for option in &self.options {
            debug_assert!(option.number >= previous, "options must be sorted");
            let delta = option.number - previous;
            previous = option.number;

            let (dn, dext) = nibble_parts(delta);
            let (ln, lext) = nibble_parts(option.value.len() as u16);
            out.push((dn << 4) | ln);
            out.extend_from_slice(&dext);
            out.extend_from_slice(&lext);
            out.extend_from_slice(&option.value);
        }

        if !self.payload.is_empty() {
            out.push(PAYLOAD_MARKER);
            out.extend_from_slice(&self.payload);
        }

        Ok(out)
    }

    /// Parse from wire bytes.
    pub fn decode(data: &[u8]) -> Result<Self, CoapError> {
        if data.len() < 4 {
            return Err(CoapError::Truncated {
                need: 4,
                have: data.len(),
            });
        }

        let version = data[0] >> 6;
        if version != VERSION {
            return Err(CoapError::InvalidVersion(version));
        }
        let mtype = MessageType::from_u8((data[0] >> 4) & 0x3)
            .expect("2-bit field covers all message types");
        let tkl = (data[0] & 0xF) as usize;
        if tkl > 8 {
            return Err(CoapError::TokenTooLong(tkl));
        }

        let code = Code(data[1]);
        let message_id = BigEndian::read_u16(&data[2..4]);

        let mut idx = 4;
        if data.len() < idx + tkl {
            return Err(CoapError::Truncated {
                need: idx + tkl,
                have: data.len(),
            });
        }
        let token = data[idx..idx + tkl].to_vec();
        idx += tkl;

        let mut options = Vec::new();
        let mut number = 0u16;
        let mut payload = Vec::new();

        while idx < data.len() {
            if data[idx] == PAYLOAD_MARKER {
                idx += 1;
                if idx == data.len() {
                    return Err(CoapError::MarkerWithoutPayload);
                }
                payload = data[idx..].to_vec();
                break;
            }

            let dn = data[idx] >> 4;
            let ln = data[idx] & 0xF;
            idx += 1;

            let delta = read_extended(data, &mut idx, dn)?;
            let length = read_extended(data, &mut idx, ln)? as usize;

            number = number
                .checked_add(delta)
                .ok_or(CoapError::OptionNumberOverflow)?;

            if data.len() < idx + length {
                return Err(CoapError::Truncated {
                    need: idx + length,
                    have: data.len(),
                });
            }
            options.push(CoapOption::new(number, &data[idx..idx + length]));
            idx += length;
        }

        Ok(Self {
            mtype,
            code,
            message_id,
            token,
            options,
            payload,
        })
    }

    /// Whether this message answers yang requests with CBOR content.
    pub fn has_cbor_content(&self) -> bool {
        matches!(
            self.content_format(),
            Some(
                content_format::YANG_DATA_CBOR
                    | content_format::YANG_DATA_CBOR_NAMED
                    | content_format::YANG_IDENTIFIERS_CBOR
                    | content_format::YANG_INSTANCES_CBOR
            )
        )
    }
}

/// Split a delta or length into its nibble and extension bytes.
/// 0-12 inline; 13 adds one byte (+13); 14 adds two bytes (+269).
fn nibble_parts(value: u16) -> (u8, Vec<u8>) {
    if value < 13 {
        (value as u8, Vec::new())
    } else if value < 269 {
        (13, vec![(value - 13) as u8])
    } else {
        let mut ext = [0u8; 2];
        BigEndian::write_u16(&mut ext, value - 269);
        (14, ext.to_vec())
    }
}

/// Resolve a nibble and its extension bytes back to a value.
fn read_extended(data: &[u8], idx: &mut usize, nibble: u8) -> Result<u16, CoapError> {
    match nibble {
        0..=12 => Ok(u16::from(nibble)),
        13 => {
            let b = *data.get(*idx).ok_or(CoapError::Truncated {
                need: *idx + 1,
                have: data.len(),
            })?;
            *idx += 1;
            Ok(u16::from(b) + 13)
        }
        14 => {
            if data.len() < *idx + 2 {
                return Err(CoapError::Truncated {
                    need: *idx + 2,
                    have: data.len(),
                });
            }
            let v = BigEndian::read_u16(&data[*idx..*idx + 2]);
            *idx += 2;
            v.checked_add(269).ok_or(CoapError::OptionNumberOverflow)
        }
        _ => Err(CoapError::ReservedNibble),
    }
}
