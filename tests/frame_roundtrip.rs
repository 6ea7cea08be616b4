//! MUP1 framing invariants over the full payload range.

use velocitysp::mup1::{checksum, FrameType, Mup1Frame, Mup1Parser};

/// Deterministic pseudo-random bytes, escape-heavy by construction.
fn noise(len: usize, seed: &mut u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            *seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (*seed >> 24) as u8
        })
        .collect()
}

#[test]
fn every_length_roundtrips() {
    let mut parser = Mup1Parser::new(2048);
    let mut seed = 0x1234_5678;

    for len in 0..=2048usize {
        let frame = Mup1Frame::new(FrameType::Coap, noise(len, &mut seed));
        let frames = parser.push(&frame.encode());
        assert_eq!(frames, vec![frame], "payload length {len}");
    }

    assert_eq!(parser.stats().checksum_errors, 0);
    assert_eq!(parser.stats().abandoned, 0);
    assert_eq!(parser.stats().frames, 2049);
}

#[test]
fn escape_vector_serialises_byte_exact() {
    // Payload of the five escape-worthy bytes: each escapes to two wire
    // bytes, and the even escaped length doubles the EOF
    let frame = Mup1Frame::new(FrameType::Trace, vec![0x00, 0xFF, 0x3E, 0x3C, 0x5C]);
    let wire = frame.encode();

    let body: &[u8] = &[
        0x3E, 0x54, // > T
        0x5C, 0x30, 0x5C, 0x46, 0x5C, 0x3E, 0x5C, 0x3C, 0x5C, 0x5C, // escapes
        0x3C, 0x3C, // double EOF
    ];
    let mut expected = body.to_vec();
    expected.extend_from_slice(format!("{:04X}", checksum(body)).as_bytes());
    assert_eq!(wire, expected);

    // And it parses back to the original five bytes
    let mut parser = Mup1Parser::new(2048);
    let frames = parser.push(&wire);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload, vec![0x00, 0xFF, 0x3E, 0x3C, 0x5C]);
}

#[test]
fn ping_wire_sequence_roundtrips() {
    // Emitted form
    let wire = Mup1Frame::ping().encode();
    let mut parser = Mup1Parser::new(2048);
    let frames = parser.push(&wire);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame_type, FrameType::Ping);
    assert!(frames[0].payload.is_empty());

    // Minimal single-EOF form, checksum over SOF..EOF
    let mut short = vec![0x3E, 0x50, 0x3C];
    short.extend_from_slice(format!("{:04X}", checksum(&[0x3E, 0x50, 0x3C])).as_bytes());
    let frames = parser.push(&short);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame_type, FrameType::Ping);
    assert!(frames[0].payload.is_empty());
}

#[test]
fn corruption_is_counted_not_raised() {
    let mut parser = Mup1Parser::new(2048);
    let mut seed = 9;

    let mut delivered = 0;
    for i in 0..10usize {
        let frame = Mup1Frame::new(FrameType::Coap, noise(40 + i, &mut seed));
        let mut wire = frame.encode();
        if i % 3 == 0 {
            // Corrupt one checksum digit; the frame stays well-delimited
            let last = wire.len() - 1;
            wire[last] = if wire[last] == b'0' { b'1' } else { b'0' };
        }
        delivered += parser.push(&wire).len();
    }

    // 4 of 10 corrupted (i = 0, 3, 6, 9)
    assert_eq!(delivered, 6);
    let stats = parser.stats();
    assert_eq!(stats.frames, 6);
    assert_eq!(stats.checksum_errors, 4);
    assert_eq!(stats.abandoned, 0);
}

#[test]
fn stream_resynchronises_between_frames() {
    let mut parser = Mup1Parser::new(2048);
    let mut seed = 77;

    let a = Mup1Frame::new(FrameType::Coap, noise(100, &mut seed));
    let b = Mup1Frame::new(FrameType::Trace, noise(33, &mut seed));

    let mut stream = Vec::new();
    stream.extend_from_slice(b"line noise @@@");
    stream.extend(a.encode());
    stream.extend_from_slice(&[0x00, 0x01, 0x02]);
    stream.extend(b.encode());

    let mut frames = Vec::new();
    for chunk in stream.chunks(11) {
        frames.extend(parser.push(chunk));
    }
    assert_eq!(frames, vec![a, b]);
}
