//! Shared test harness: a scripted mock device on the far end of an
//! in-memory transport pair.

#![allow(dead_code)]

use velocitysp::coap::{Code, Message, MessageType};
use velocitysp::config::Config;
use velocitysp::device::Device;
use velocitysp::mup1::{FrameType, Mup1Frame, Mup1Parser};
use velocitysp::transport::{pair, MemTransport, Transport};

/// The device side of the wire, driven explicitly by each test.
pub struct MockDevice {
    transport: MemTransport,
    parser: Mup1Parser,
    queued: Vec<Mup1Frame>,
}

impl MockDevice {
    pub fn new(transport: MemTransport) -> Self {
        Self {
            transport,
            parser: Mup1Parser::new(2048),
            queued: Vec::new(),
        }
    }

    /// Next complete frame from the host.
    pub async fn recv_frame(&mut self) -> Mup1Frame {
        loop {
            if !self.queued.is_empty() {
                return self.queued.remove(0);
            }
            let mut buf = [0u8; 2048];
            let n = self.transport.read(&mut buf).await.expect("transport read");
            assert!(n > 0, "transport closed while awaiting a frame");
            self.queued.extend(self.parser.push(&buf[..n]));
        }
    }

    /// Next CoAP message from the host, skipping other frame types.
    pub async fn recv_coap(&mut self) -> Message {
        loop {
            let frame = self.recv_frame().await;
            if frame.frame_type == FrameType::Coap {
                return Message::decode(&frame.payload).expect("well-formed CoAP");
            }
        }
    }

    pub async fn send_frame(&mut self, frame: &Mup1Frame) {
        self.transport
            .write(&frame.encode())
            .await
            .expect("transport write");
    }

    pub async fn send_coap(&mut self, msg: &Message) {
        self.send_frame(&Mup1Frame::coap(msg.encode().expect("encodable message")))
            .await;
    }

    /// Answer the next MUP1 ping with a pong carrying a version banner.
    pub async fn answer_ping(&mut self) {
        loop {
            let frame = self.recv_frame().await;
            if frame.frame_type == FrameType::Ping {
                self.send_frame(&Mup1Frame::new(
                    FrameType::Ping,
                    b"VelocitySP-v2025.06-LAN9668".to_vec(),
                ))
                .await;
                return;
            }
        }
    }
}

/// A piggybacked ACK response echoing the request's message-ID and token.
pub fn response_for(
    request: &Message,
    code: Code,
    payload: Vec<u8>,
    content_format: Option<u16>,
) -> Message {
    let mut msg = Message::new(MessageType::Acknowledgement, code, request.message_id);
    msg.token = request.token.clone();
    if let Some(format) = content_format {
        msg.set_content_format(format);
    }
    msg.payload = payload;
    msg
}

/// Connect a [`Device`] to a fresh mock over the in-memory transport.
pub async fn connect() -> (Device, MockDevice) {
    let (local, remote) = pair();
    let mut mock = MockDevice::new(remote);
    let config = Config::default();

    let (device, ()) = tokio::join!(
        async {
            Device::connect(Box::new(local), &config)
                .await
                .expect("device connects after ping")
        },
        mock.answer_ping(),
    );
    (device, mock)
}
