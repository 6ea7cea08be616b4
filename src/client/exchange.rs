//! Exchange bookkeeping: requests, responses, handles, and block state.

use std::sync::Weak;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::coap::{BlockValue, Message, Method};
use crate::error::{Error, Result};
use crate::types::{ExchangeState, Token, TransferProgress};

use super::Shared;

/// A request as submitted to the engine.
#[derive(Debug, Clone, Default)]
pub struct CoapRequest {
    pub method: Option<Method>,
    pub path: String,
    pub payload: Vec<u8>,
    pub content_format: Option<u16>,
    pub accept: Option<u16>,
    pub query: Option<String>,
}

impl CoapRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn content_format(mut self, format: u16) -> Self {
        self.content_format = Some(format);
        self
    }

    pub fn accept(mut self, format: u16) -> Self {
        self.accept = Some(format);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub(super) fn method(&self) -> Method {
        self.method.unwrap_or(Method::Get)
    }

    /// Build the base message for this request: method, path, formats, no
    /// payload or block options yet.
    pub(super) fn base_message(&self, message_id: u16, token: Token) -> Message {
        use crate::coap::{option_number, CoapOption};

        let mut msg = Message::request(self.method(), message_id, token.as_bytes(), &self.path);
        if let Some(format) = self.content_format {
            msg.set_content_format(format);
        }
        if let Some(accept) = self.accept {
            msg.add_option(CoapOption::uint(option_number::ACCEPT, u32::from(accept)));
        }
        if let Some(query) = &self.query {
            for part in query.split('&').filter(|s| !s.is_empty()) {
                msg.add_option(CoapOption::new(option_number::URI_QUERY, part.as_bytes()));
            }
        }
        msg
    }
}

/// A completed response.
#[derive(Debug, Clone)]
pub struct Response {
    pub code: crate::coap::Code,
    pub payload: Vec<u8>,
    pub content_format: Option<u16>,
}

/// Block-wise transfer state for one exchange.
#[derive(Debug)]
pub(super) struct BlockState {
    /// Outgoing payload split into blocks (Block1), empty for downloads.
    pub tx_blocks: Vec<Vec<u8>>,
    /// Index of the next block to transmit.
    pub tx_next: usize,
    /// Received blocks, a contiguous prefix of the response (Block2).
    pub rx_blocks: Vec<Vec<u8>>,
    /// Negotiated size exponent.
    pub szx: u8,
    /// Progress sink for observable transfers.
    pub progress: Option<mpsc::UnboundedSender<TransferProgress>>,
    /// Total outgoing bytes, for progress reporting.
    pub tx_total: u64,
}

impl BlockState {
    pub fn upload(payload: &[u8], szx: u8) -> Self {
        let size = 1usize << (szx + 4);
        Self {
            tx_blocks: payload.chunks(size).map(<[u8]>::to_vec).collect(),
            tx_next: 0,
            rx_blocks: Vec::new(),
            szx,
            progress: None,
            tx_total: payload.len() as u64,
        }
    }

    pub fn download(szx: u8) -> Self {
        Self {
            tx_blocks: Vec::new(),
            tx_next: 0,
            rx_blocks: Vec::new(),
            szx,
            progress: None,
            tx_total: 0,
        }
    }

    /// Bytes acknowledged so far on the upload side.
    pub fn tx_acked_bytes(&self) -> u64 {
        self.tx_blocks[..self.tx_next]
            .iter()
            .map(|b| b.len() as u64)
            .sum()
    }

    pub fn report_progress(&self) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(TransferProgress {
                sent: self.tx_acked_bytes(),
                total: self.tx_total,
            });
        }
    }

    /// Concatenate the received blocks into the delivered payload.
    pub fn assemble_rx(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rx_blocks.iter().map(Vec::len).sum());
        for block in self.rx_blocks.drain(..) {
            out.extend_from_slice(&block);
        }
        out
    }

    /// The Block1 value for the next outgoing block.
    pub fn next_block1(&self) -> Option<BlockValue> {
        if self.tx_next >= self.tx_blocks.len() {
            return None;
        }
        let more = self.tx_next + 1 < self.tx_blocks.len();
        BlockValue::new(self.tx_next as u32, more, self.szx).ok()
    }
}

/// One outstanding exchange, owned by the correlator registry.
pub(super) struct PendingExchange {
    pub token: Token,
    pub message_id: u16,
    pub request: CoapRequest,
    /// The message currently on the wire, kept for retransmission.
    pub wire: Message,
    pub deadline: Instant,
    /// Transmissions so far of the current message.
    pub attempts: u32,
    pub state: ExchangeState,
    pub block: Option<BlockState>,
    pub resolver: Option<oneshot::Sender<Result<Response>>>,
    /// Set once an empty ACK arrives; stops retransmission while a separate
    /// response is pending.
    pub acked: bool,
}

impl PendingExchange {
    pub fn resolve(&mut self, result: Result<Response>) {
        if let Some(tx) = self.resolver.take() {
            let _ = tx.send(result);
        }
    }
}

/// Caller-side handle to an outstanding exchange.
#[derive(Debug)]
pub struct ExchangeHandle {
    pub(super) token: Token,
    pub(super) rx: oneshot::Receiver<Result<Response>>,
    pub(super) shared: Weak<Shared>,
}

impl ExchangeHandle {
    pub fn token(&self) -> Token {
        self.token
    }

    /// Await the outcome of the exchange.
    pub async fn response(self) -> Result<Response> {
        match self.rx.await {
            Ok(result) => result,
            // Resolver dropped without an outcome: the exchange was cancelled
            Err(_) => Err(Error::Cancelled(self.token)),
        }
    }

    /// Cancel the exchange. Cooperative and idempotent: a late reply for a
    /// cancelled exchange is silently discarded by the correlator.
    pub fn cancel(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.cancel(self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_block_state_chunks_payload() {
        let payload = vec![7u8; 600];
        let state = BlockState::upload(&payload, 4); // 256-byte blocks
        assert_eq!(state.tx_blocks.len(), 3);
        assert_eq!(state.tx_blocks[0].len(), 256);
        assert_eq!(state.tx_blocks[2].len(), 88);

        let first = state.next_block1().unwrap();
        assert_eq!(first.num, 0);
        assert!(first.more);
        assert_eq!(first.size(), 256);
    }

    #[test]
    fn last_block_clears_more_flag() {
        let mut state = BlockState::upload(&[1u8; 300], 4);
        state.tx_next = 1;
        let last = state.next_block1().unwrap();
        assert_eq!(last.num, 1);
        assert!(!last.more);
        state.tx_next = 2;
        assert!(state.next_block1().is_none());
    }

    #[test]
    fn single_block_payload_is_one_chunk() {
        let state = BlockState::upload(&[0u8; 256], 4);
        assert_eq!(state.tx_blocks.len(), 1);
        assert!(!state.next_block1().unwrap().more);
    }

    #[test]
    fn rx_assembly_preserves_order() {
        let mut state = BlockState::download(4);
        state.rx_blocks.push(vec![1; 256]);
        state.rx_blocks.push(vec![2; 256]);
        state.rx_blocks.push(vec![3; 64]);
        let out = state.assemble_rx();
        assert_eq!(out.len(), 576);
        assert_eq!(out[0], 1);
        assert_eq!(out[256], 2);
        assert_eq!(out[512], 3);
    }

    #[test]
    fn request_base_message_carries_options() {
        let req = CoapRequest::get("/ietf-interfaces:interfaces")
            .accept(60)
            .query("depth=2");
        let msg = req.base_message(42, Token::from_bytes([1, 2, 3, 4]));
        assert_eq!(msg.uri_path(), "ietf-interfaces:interfaces");
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.token, vec![1, 2, 3, 4]);
        assert!(msg
            .options()
            .iter()
            .any(|o| o.number == crate::coap::option_number::URI_QUERY));
    }
}
