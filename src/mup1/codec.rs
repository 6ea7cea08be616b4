//! Tokio codec for MUP1 framing over an `AsyncRead`/`AsyncWrite` stream.

use std::collections::VecDeque;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{Mup1Frame, Mup1Parser};

/// Framing codec pairing the incremental parser with the emitter.
pub struct Mup1Codec {
    parser: Mup1Parser,
    ready: VecDeque<Mup1Frame>,
}

impl Mup1Codec {
    pub fn new() -> Self {
        Self {
            parser: Mup1Parser::default(),
            ready: VecDeque::new(),
        }
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            parser: Mup1Parser::new(max_payload),
            ready: VecDeque::new(),
        }
    }
}

impl Default for Mup1Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for Mup1Codec {
    type Item = Mup1Frame;
    type Error = crate::Error;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.ready.pop_front() {
            return Ok(Some(frame));
        }

        if !src.is_empty() {
            let input = src.split_to(src.len());
            self.ready.extend(self.parser.push(&input));
        }

        Ok(self.ready.pop_front())
    }
}

impl Encoder<Mup1Frame> for Mup1Codec {
    type Error = crate::Error;

    fn encode(
        &mut self,
        item: Mup1Frame,
        dst: &mut BytesMut,
    ) -> std::result::Result<(), Self::Error> {
        let encoded = item.encode();
        dst.reserve(encoded.len());
        dst.put_slice(&encoded);
        Ok(())
    }
}
