//! Incremental frame parser.
//!
//! The parser is a byte-at-a-time state machine owned by the transport
//! reader task. It accepts arbitrary input slices and yields zero or more
//! complete frames per call; partial frames are retained across calls.
//! Corruption never propagates as an error -- bad frames are dropped,
//! counted, and the parser resynchronises at the next SOF.

use tracing::{debug, trace};

use super::{FrameType, Mup1Frame, EOF, ESC, SOF};

/// Parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding until SOF.
    Init,
    /// SOF seen, next byte is the frame type.
    Type,
    /// Accumulating payload bytes.
    Data,
    /// ESC seen, next byte resolves the escape.
    Esc,
    /// First EOF seen with even payload, expecting the second EOF.
    Eof2,
    /// Collecting the four checksum characters.
    Check(u8),
}

/// Parser counters. Checksum errors and abandoned frames are observability
/// signals, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub frames: u64,
    pub checksum_errors: u64,
    pub abandoned: u64,
}

/// Incremental MUP1 frame parser.
pub struct Mup1Parser {
    state: State,
    frame_type: FrameType,
    payload: Vec<u8>,
    /// Bytes covered by the checksum: SOF through the EOF(s).
    raw: Vec<u8>,
    /// Escaped data bytes consumed so far; its parity decides whether a
    /// second EOF is expected.
    seen: usize,
    check: [u8; 4],
    max_payload: usize,
    stats: ParserStats,
}

impl Mup1Parser {
    pub fn new(max_payload: usize) -> Self {
        Self {
            state: State::Init,
            frame_type: FrameType::Ping,
            payload: Vec::new(),
            raw: Vec::new(),
            seen: 0,
            check: [0; 4],
            max_payload,
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Feed input bytes, collecting every frame that completes.
    pub fn push(&mut self, input: &[u8]) -> Vec<Mup1Frame> {
        let mut out = Vec::new();
        for &b in input {
            if let Some(frame) = self.step(b) {
                out.push(frame);
            }
        }
        out
    }

    fn step(&mut self, b: u8) -> Option<Mup1Frame> {
        match self.state {
            State::Init => {
                if b == SOF {
                    self.begin();
                }
                None
            }

            State::Type => {
                if b == SOF {
                    // Stray SOF: restart the frame from here
                    self.begin();
                    return None;
                }
                match FrameType::from_u8(b) {
                    Some(t) => {
                        self.frame_type = t;
                        self.raw.push(b);
                        self.state = State::Data;
                    }
                    None => self.abandon("unknown frame type"),
                }
                None
            }

            State::Data => {
                match b {
                    ESC => {
                        self.raw.push(b);
                        self.seen += 1;
                        self.state = State::Esc;
                    }
                    EOF => {
                        self.raw.push(b);
                        self.state = if self.seen % 2 == 1 {
                            State::Check(0)
                        } else {
                            State::Eof2
                        };
                    }
                    SOF => {
                        // Raw SOF mid-frame: the old frame is lost, a new one starts
                        self.abandon("raw SOF in payload");
                        self.begin();
                    }
                    0x00 | 0xFF => self.abandon("raw reserved byte in payload"),
                    _ => {
                        if self.payload.len() >= self.max_payload {
                            self.abandon("payload over size limit");
                        } else {
                            self.payload.push(b);
                            self.raw.push(b);
                            self.seen += 1;
                        }
                    }
                }
                None
            }

            State::Esc => {
                let resolved = match b {
                    b'0' => Some(0x00),
                    b'F' => Some(0xFF),
                    SOF => Some(SOF),
                    EOF => Some(EOF),
                    ESC => Some(ESC),
                    _ => None,
                };
                match resolved {
                    Some(v) if self.payload.len() < self.max_payload => {
                        self.payload.push(v);
                        self.raw.push(b);
                        self.seen += 1;
                        self.state = State::Data;
                    }
                    Some(_) => self.abandon("payload over size limit"),
                    None => self.abandon("invalid escape sequence"),
                }
                None
            }

            State::Eof2 => {
                if b == EOF {
                    self.raw.push(b);
                    self.state = State::Check(0);
                } else if b.is_ascii_hexdigit() {
                    // Tolerate a sender that skipped the alignment EOF: this
                    // byte is already the first checksum character
                    self.check[0] = b;
                    self.state = State::Check(1);
                } else if b == SOF {
                    self.abandon("missing second EOF");
                    self.begin();
                } else {
                    self.abandon("missing second EOF");
                }
                None
            }

            State::Check(i) => {
                if !b.is_ascii_hexdigit() {
                    if b == SOF {
                        self.abandon("non-hex checksum character");
                        self.begin();
                    } else {
                        self.abandon("non-hex checksum character");
                    }
                    return None;
                }
                self.check[i as usize] = b;
                if i < 3 {
                    self.state = State::Check(i + 1);
                    return None;
                }
                self.finish()
            }
        }
    }

    fn begin(&mut self) {
        self.payload.clear();
        self.raw.clear();
        self.raw.push(SOF);
        self.seen = 0;
        self.state = State::Type;
    }

    fn abandon(&mut self, reason: &'static str) {
        debug!(reason, "abandoning MUP1 frame");
        self.stats.abandoned += 1;
        self.state = State::Init;
    }

    /// Verify the checksum and deliver the frame.
    fn finish(&mut self) -> Option<Mup1Frame> {
        self.state = State::Init;

        let text = std::str::from_utf8(&self.check).ok()?;
        let received = u16::from_str_radix(text, 16).ok()?;
        let computed = super::checksum(&self.raw);

        if received != computed {
            self.stats.checksum_errors += 1;
            debug!(
                received = format_args!("{received:04X}"),
                computed = format_args!("{computed:04X}"),
                "MUP1 checksum mismatch, frame discarded"
            );
            return None;
        }

        self.stats.frames += 1;
        trace!(
            frame_type = %self.frame_type,
            len = self.payload.len(),
            "MUP1 frame received"
        );
        Some(Mup1Frame {
            frame_type: self.frame_type,
            payload: std::mem::take(&mut self.payload),
        })
    }
}

impl Default for Mup1Parser {
    fn default() -> Self {
        Self::new(crate::MAX_FRAME_PAYLOAD)
    }
}
