//! CoAP client engine: the correlator, retransmission scheduler, and
//! block-wise transfer state machines.
//!
//! One engine owns one transport. All parser and registry mutation happens
//! on a single spawned loop task; callers interact through the registry
//! (token-keyed, concurrent) and a bounded frame channel that applies
//! back-pressure when the transport is busy.

mod exchange;

pub use exchange::{CoapRequest, ExchangeHandle, Response};
use exchange::{BlockState, PendingExchange};

use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::coap::{BlockValue, Code, Message, MessageType};
use crate::config::ClientConfig;
use crate::error::{CoapError, Error, Result};
use crate::mup1::{FrameType, Mup1Frame, Mup1Parser, ParserStats};
use crate::transport::Transport;
use crate::types::{ConnectionState, DeviceEvent, ExchangeState, StackStats, Token, TransferProgress};

/// Engine counters, shared across tasks.
#[derive(Default)]
struct Stats {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    checksum_errors: AtomicU64,
    frames_abandoned: AtomicU64,
    retransmits: AtomicU64,
    timeouts: AtomicU64,
    unmatched: AtomicU64,
}

impl Stats {
    fn snapshot(&self) -> StackStats {
        StackStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            checksum_errors: self.checksum_errors.load(Ordering::Relaxed),
            frames_abandoned: self.frames_abandoned.load(Ordering::Relaxed),
            retransmits: self.retransmits.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            unmatched_responses: self.unmatched.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the caller-facing client and the loop task.
pub(crate) struct Shared {
    cfg: ClientConfig,
    pending: DashMap<Token, PendingExchange>,
    next_mid: AtomicU16,
    frame_tx: mpsc::Sender<Mup1Frame>,
    events_tx: broadcast::Sender<DeviceEvent>,
    shutdown_tx: broadcast::Sender<()>,
    state: RwLock<ConnectionState>,
    ping_waiters: Mutex<Vec<oneshot::Sender<Vec<u8>>>>,
    stats: Stats,
}

/// The CoAP client engine.
pub struct CoapClient {
    shared: Arc<Shared>,
}

impl CoapClient {
    /// Take ownership of a transport and spawn the engine loop.
    pub fn new(transport: Box<dyn Transport>, cfg: ClientConfig) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (events_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            cfg,
            pending: DashMap::new(),
            next_mid: AtomicU16::new(rand::random()),
            frame_tx,
            events_tx,
            shutdown_tx,
            state: RwLock::new(ConnectionState::Connecting),
            ping_waiters: Mutex::new(Vec::new()),
            stats: Stats::default(),
        });

        tokio::spawn(run_loop(Arc::clone(&shared), transport, frame_rx));

        Self { shared }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.shared.state.write() = state;
    }

    /// Subscribe to announce/trace events from the device.
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> StackStats {
        self.shared.stats.snapshot()
    }

    /// MUP1-level ping. Resolves with the round-trip time when the matching
    /// `P` reply arrives within the configured deadline.
    pub async fn ping(&self) -> Result<Duration> {
        let (tx, rx) = oneshot::channel();
        self.shared.ping_waiters.lock().push(tx);

        let start = Instant::now();
        self.shared
            .frame_tx
            .send(Mup1Frame::ping())
            .await
            .map_err(|_| Error::TransportDown)?;

        match tokio::time::timeout(self.shared.cfg.ping_timeout, rx).await {
            Ok(Ok(_payload)) => Ok(start.elapsed()),
            Ok(Err(_)) => Err(Error::TransportDown),
            Err(_) => Err(Error::PingTimeout),
        }
    }

    /// Submit a request and await its outcome.
    pub async fn request(&self, request: CoapRequest) -> Result<Response> {
        self.submit(request).await?.response().await
    }

    /// Submit a request, returning a handle that resolves asynchronously.
    pub async fn submit(&self, request: CoapRequest) -> Result<ExchangeHandle> {
        self.submit_with_progress(request, None).await
    }

    /// Submit with an optional progress sink for block-wise uploads.
    pub async fn submit_with_progress(
        &self,
        request: CoapRequest,
        progress: Option<mpsc::UnboundedSender<TransferProgress>>,
    ) -> Result<ExchangeHandle> {
        if matches!(
            self.state(),
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Err(Error::TransportDown);
        }

        let message_id = self.shared.next_mid();
        let (res_tx, res_rx) = oneshot::channel();
        let mut slot_request = Some(request);
        let mut slot_resolver = Some(res_tx);
        let mut slot_progress = Some(progress);

        // Reserve a fresh token. The entry API closes the window in which
        // two submitters could draw the same value.
        let (token, wire) = loop {
            let token = Token::generate();
            use dashmap::mapref::entry::Entry;
            match self.shared.pending.entry(token) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let request = slot_request.take().expect("inserted once");
                    let progress = slot_progress.take().expect("inserted once");

                    let mut wire = request.base_message(message_id, token);
                    let (block, state) = if request.payload.len() > self.shared.cfg.block_size {
                        // An unvalidated block size falls back to SZX=4 (256)
                        let szx =
                            BlockValue::szx_for_size(self.shared.cfg.block_size).unwrap_or(4);
                        let mut block = BlockState::upload(&request.payload, szx);
                        block.progress = progress;
                        let block1 = block.next_block1().expect("payload is non-empty");
                        wire.set_block1(block1);
                        wire.payload = block.tx_blocks[0].clone();
                        (Some(block), ExchangeState::AwaitBlock1Ack)
                    } else {
                        wire.payload = request.payload.clone();
                        (None, ExchangeState::Sent)
                    };

                    slot.insert(PendingExchange {
                        token,
                        message_id,
                        request,
                        wire: wire.clone(),
                        deadline: Instant::now() + self.shared.cfg.ack_timeout,
                        attempts: 1,
                        state,
                        block,
                        resolver: slot_resolver.take(),
                        acked: false,
                    });
                    break (token, wire);
                }
            }
        };

        let frame = Mup1Frame::coap(wire.encode().map_err(Error::Coap)?);
        if self.shared.frame_tx.send(frame).await.is_err() {
            self.shared.pending.remove(&token);
            return Err(Error::TransportDown);
        }

        trace!(%token, message_id, "exchange submitted");
        Ok(ExchangeHandle {
            token,
            rx: res_rx,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Stop the engine. Outstanding exchanges fail with `TransportDown`.
    pub fn shutdown(&self) {
        *self.shared.state.write() = ConnectionState::Disconnecting;
        let _ = self.shared.shutdown_tx.send(());
    }
}

impl Shared {
    fn next_mid(&self) -> u16 {
        self.next_mid.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove an exchange; a late reply will be dropped as unmatched.
    pub(crate) fn cancel(&self, token: Token) {
        if let Some((_, mut exchange)) = self.pending.remove(&token) {
            debug!(%token, was = ?exchange.state, "exchange cancelled");
            exchange.state = ExchangeState::Cancelled;
        }
    }

    fn earliest_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|e| e.deadline).min()
    }

    fn sync_parser_stats(&self, stats: ParserStats) {
        self.stats
            .frames_received
            .store(stats.frames, Ordering::Relaxed);
        self.stats
            .checksum_errors
            .store(stats.checksum_errors, Ordering::Relaxed);
        self.stats
            .frames_abandoned
            .store(stats.abandoned, Ordering::Relaxed);
    }

    /// Dispatch one reassembled MUP1 frame.
    fn handle_frame(&self, frame: Mup1Frame, outgoing: &mut Vec<Mup1Frame>) {
        match frame.frame_type {
            FrameType::Ping => {
                // Pong. Resolve every waiter; the payload is the version text
                for waiter in self.ping_waiters.lock().drain(..) {
                    let _ = waiter.send(frame.payload.clone());
                }
            }
            FrameType::Announce => {
                let banner = String::from_utf8_lossy(&frame.payload).into_owned();
                info!(banner = %banner, "device announce");
                let _ = self.events_tx.send(DeviceEvent::Announce(banner));
            }
            FrameType::Trace => {
                let text = String::from_utf8_lossy(&frame.payload).into_owned();
                debug!(trace = %text, "device trace");
                let _ = self.events_tx.send(DeviceEvent::Trace(text));
            }
            FrameType::SysReq => {
                debug!("unexpected SysReq frame from device, ignoring");
            }
            FrameType::Coap => match Message::decode(&frame.payload) {
                Ok(message) => self.handle_coap(message, outgoing),
                Err(e) => warn!(error = %e, "malformed CoAP message, dropping"),
            },
        }
    }

    fn handle_coap(&self, msg: Message, outgoing: &mut Vec<Mup1Frame>) {
        // RST terminates the exchange it names by message-ID
        if msg.mtype == MessageType::Reset {
            if let Some(token) = self.token_for_message_id(msg.message_id) {
                if let Some((_, mut exchange)) = self.pending.remove(&token) {
                    warn!(%token, "device reset exchange");
                    exchange.state = ExchangeState::Failed;
                    let path = exchange.request.path.clone();
                    exchange.resolve(Err(Error::Reset { path, token }));
                }
            }
            return;
        }

        // Empty ACK: retransmission stops, a separate response is coming
        if msg.mtype == MessageType::Acknowledgement && msg.code.is_empty() {
            if let Some(token) = self.token_for_message_id(msg.message_id) {
                if let Some(mut exchange) = self.pending.get_mut(&token) {
                    exchange.acked = true;
                    exchange.state = ExchangeState::AwaitAck;
                    exchange.deadline = Instant::now()
                        + self.cfg.ack_timeout * self.cfg.max_attempts;
                }
            }
            return;
        }

        // The device does not originate requests over this link; refuse any
        if msg.code.is_request() {
            if msg.mtype == MessageType::Confirmable {
                let rst = Message::new(MessageType::Reset, Code::EMPTY, msg.message_id);
                if let Ok(bytes) = rst.encode() {
                    outgoing.push(Mup1Frame::coap(bytes));
                }
            }
            return;
        }

        // Responses correlate by token
        let Ok(token_bytes) = <[u8; 4]>::try_from(msg.token.as_slice()) else {
            self.stats.unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(token = %hex::encode(&msg.token), "response with foreign token, dropping");
            return;
        };
        let token = Token::from_bytes(token_bytes);
        if !self.pending.contains_key(&token) {
            self.stats.unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(%token, "response for unknown exchange, dropping");
            return;
        }

        // A separate (CON) response must be acknowledged
        if msg.mtype == MessageType::Confirmable {
            if let Ok(bytes) = Message::ack(msg.message_id).encode() {
                outgoing.push(Mup1Frame::coap(bytes));
            }
        }

        self.advance_exchange(token, msg, outgoing);
    }

    fn token_for_message_id(&self, message_id: u16) -> Option<Token> {
        self.pending
            .iter()
            .find(|e| e.message_id == message_id)
            .map(|e| e.token)
    }

    /// Drive the per-exchange state machine with a correlated response.
    fn advance_exchange(&self, token: Token, msg: Message, outgoing: &mut Vec<Mup1Frame>) {
        let code = msg.code;

        // Definitive failures are not retried
        if code.is_client_error() || code.is_server_error() {
            if let Some((_, mut exchange)) = self.pending.remove(&token) {
                exchange.state = ExchangeState::Failed;
                let path = exchange.request.path.clone();
                let err = if code.is_client_error() {
                    Error::ClientError { code, path, token }
                } else {
                    Error::ServerError { code, path, token }
                };
                exchange.resolve(Err(err));
            }
            return;
        }

        if !code.is_success() {
            warn!(%token, %code, "unexpected response code");
            if let Some((_, mut exchange)) = self.pending.remove(&token) {
                exchange.state = ExchangeState::Failed;
                exchange.resolve(Err(Error::Coap(CoapError::UnexpectedCode(code))));
            }
            return;
        }

        // 2.31 Continue acknowledges one request block
        if code == Code::CONTINUE {
            self.continue_block1(token, &msg, outgoing);
            return;
        }

        // Block2: a slice of the response body
        if let Some(block2) = msg.block2() {
            self.continue_block2(token, msg, block2, outgoing);
            return;
        }

        // Plain completion (also the final reply of a Block1 upload)
        if let Some((_, mut exchange)) = self.pending.remove(&token) {
            if let Some(block) = &mut exchange.block {
                block.tx_next = block.tx_blocks.len();
                block.report_progress();
            }
            exchange.state = ExchangeState::Done;
            exchange.resolve(Ok(Response {
                code,
                content_format: msg.content_format(),
                payload: msg.payload,
            }));
        }
    }

    fn continue_block1(&self, token: Token, msg: &Message, outgoing: &mut Vec<Mup1Frame>) {
        enum Action {
            Fail(Error),
            Send(Message),
        }

        // Scope the registry guard: failing the exchange removes the entry,
        // which must not happen while the guard is live.
        let action = {
            let Some(mut exchange) = self.pending.get_mut(&token) else {
                return;
            };

            let expected = exchange.block.as_ref().map(|b| b.tx_next as u32);
            let echoed = msg.block1().map(|b| b.num);
            if expected.is_none() || echoed != expected {
                Action::Fail(Error::Coap(CoapError::BlockOutOfOrder {
                    expected: expected.unwrap_or(0),
                    got: echoed.unwrap_or(u32::MAX),
                }))
            } else {
                let message_id = self.next_mid();
                let exchange = &mut *exchange;
                let block = exchange.block.as_mut().expect("checked above");
                block.tx_next += 1;
                block.report_progress();

                match block.next_block1() {
                    // 2.31 for the final block: the device owes a real code
                    None => Action::Fail(Error::Coap(CoapError::UnexpectedCode(Code::CONTINUE))),
                    Some(block1) => {
                        let mut wire = exchange.request.base_message(message_id, token);
                        wire.set_block1(block1);
                        wire.payload = block.tx_blocks[block.tx_next].clone();

                        exchange.message_id = message_id;
                        exchange.attempts = 1;
                        exchange.deadline = Instant::now() + self.cfg.ack_timeout;
                        exchange.state = ExchangeState::AwaitBlock1Ack;
                        exchange.acked = false;
                        exchange.wire = wire.clone();
                        Action::Send(wire)
                    }
                }
            }
        };

        match action {
            Action::Fail(err) => drop_entry_with(&self.pending, token, err),
            Action::Send(wire) => match wire.encode() {
                Ok(bytes) => outgoing.push(Mup1Frame::coap(bytes)),
                Err(e) => warn!(error = %e, "failed to encode continuation block"),
            },
        }
    }

    fn continue_block2(
        &self,
        token: Token,
        msg: Message,
        block2: BlockValue,
        outgoing: &mut Vec<Mup1Frame>,
    ) {
        enum Action {
            Fail(Error),
            Complete(Response),
            Send(Message),
        }

        let code = msg.code;
        let content_format = msg.content_format();

        let action = {
            let Some(mut exchange) = self.pending.get_mut(&token) else {
                return;
            };

            let block = exchange
                .block
                .get_or_insert_with(|| BlockState::download(block2.szx));

            // Received blocks must form a contiguous prefix
            let expected = block.rx_blocks.len() as u32;
            if block2.num != expected {
                Action::Fail(Error::Coap(CoapError::BlockOutOfOrder {
                    expected,
                    got: block2.num,
                }))
            } else {
                block.rx_blocks.push(msg.payload);

                if block2.more {
                    // Ask for the next slice
                    let message_id = self.next_mid();
                    match BlockValue::new(expected + 1, false, block2.szx) {
                        Err(e) => Action::Fail(Error::Coap(e)),
                        Ok(next) => {
                            let exchange = &mut *exchange;
                            let mut wire = exchange.request.base_message(message_id, token);
                            wire.set_block2(next);

                            exchange.message_id = message_id;
                            exchange.attempts = 1;
                            exchange.deadline = Instant::now() + self.cfg.ack_timeout;
                            exchange.state = ExchangeState::AwaitBlock2;
                            exchange.acked = false;
                            exchange.wire = wire.clone();
                            Action::Send(wire)
                        }
                    }
                } else {
                    let payload = block.assemble_rx();
                    Action::Complete(Response {
                        code,
                        content_format,
                        payload,
                    })
                }
            }
        };

        match action {
            Action::Fail(err) => drop_entry_with(&self.pending, token, err),
            Action::Complete(response) => {
                if let Some((_, mut exchange)) = self.pending.remove(&token) {
                    exchange.state = ExchangeState::Done;
                    exchange.resolve(Ok(response));
                }
            }
            Action::Send(wire) => match wire.encode() {
                Ok(bytes) => outgoing.push(Mup1Frame::coap(bytes)),
                Err(e) => warn!(error = %e, "failed to encode block2 follow-up"),
            },
        }
    }

    /// Fire expired deadlines: retransmit or fail.
    fn handle_deadlines(&self, outgoing: &mut Vec<Mup1Frame>) {
        let now = Instant::now();
        let expired: Vec<Token> = self
            .pending
            .iter()
            .filter(|e| e.deadline <= now)
            .map(|e| e.token)
            .collect();

        for token in expired {
            let give_up = {
                let Some(exchange) = self.pending.get(&token) else {
                    continue;
                };
                exchange.acked || exchange.attempts >= self.cfg.max_attempts
            };

            if give_up {
                if let Some((_, mut exchange)) = self.pending.remove(&token) {
                    self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                    exchange.state = ExchangeState::TimedOut;
                    let path = exchange.request.path.clone();
                    let attempts = exchange.attempts;
                    warn!(%token, path = %path, attempts, "exchange timed out");
                    exchange.resolve(Err(Error::Timeout {
                        path,
                        token,
                        attempts,
                    }));
                }
            } else if let Some(mut exchange) = self.pending.get_mut(&token) {
                exchange.attempts += 1;
                exchange.deadline = now + self.cfg.ack_timeout;
                self.stats.retransmits.fetch_add(1, Ordering::Relaxed);
                trace!(%token, attempt = exchange.attempts, "retransmitting");
                match exchange.wire.encode() {
                    Ok(bytes) => outgoing.push(Mup1Frame::coap(bytes)),
                    Err(e) => warn!(error = %e, "failed to encode retransmission"),
                }
            }
        }
    }

    /// Fail every outstanding exchange (transport gone).
    fn fail_all(&self) {
        let tokens: Vec<Token> = self.pending.iter().map(|e| e.token).collect();
        for token in tokens {
            if let Some((_, mut exchange)) = self.pending.remove(&token) {
                exchange.state = ExchangeState::Failed;
                exchange.resolve(Err(Error::TransportDown));
            }
        }
        self.ping_waiters.lock().clear();
    }
}

/// Remove an exchange and resolve it with an error.
fn drop_entry_with(pending: &DashMap<Token, PendingExchange>, token: Token, err: Error) {
    if let Some((_, mut exchange)) = pending.remove(&token) {
        exchange.state = ExchangeState::Failed;
        exchange.resolve(Err(err));
    }
}

/// Sleep until the deadline, or forever when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

async fn write_frame(
    shared: &Shared,
    transport: &mut Box<dyn Transport>,
    frame: &Mup1Frame,
) -> Result<()> {
    transport.write(&frame.encode()).await?;
    transport.flush().await?;
    shared.stats.frames_sent.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

/// The engine loop: drains the transport into the parser, fires deadlines,
/// and writes queued frames. All correlator mutation happens here or behind
/// the concurrent registry, never across a bare shared reference.
async fn run_loop(
    shared: Arc<Shared>,
    mut transport: Box<dyn Transport>,
    mut frame_rx: mpsc::Receiver<Mup1Frame>,
) {
    let mut shutdown_rx = shared.shutdown_tx.subscribe();
    let mut parser = Mup1Parser::new(shared.cfg.max_frame_payload);
    let mut buf = vec![0u8; 4096];

    let reason = 'outer: loop {
        let deadline = shared.earliest_deadline();

        tokio::select! {
            _ = shutdown_rx.recv() => break 'outer "shutdown requested",

            frame = frame_rx.recv() => {
                let Some(frame) = frame else { break 'outer "client dropped" };
                if write_frame(&shared, &mut transport, &frame).await.is_err() {
                    break 'outer "write failed";
                }
            }

            result = transport.read(&mut buf) => {
                match result {
                    Ok(0) => break 'outer "transport closed",
                    Ok(n) => {
                        let frames = parser.push(&buf[..n]);
                        shared.sync_parser_stats(parser.stats());
                        let mut outgoing = Vec::new();
                        for frame in frames {
                            shared.handle_frame(frame, &mut outgoing);
                        }
                        for frame in outgoing {
                            if write_frame(&shared, &mut transport, &frame).await.is_err() {
                                break 'outer "write failed";
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "transport read failed");
                        break 'outer "read failed";
                    }
                }
            }

            () = sleep_until_opt(deadline) => {
                let mut outgoing = Vec::new();
                shared.handle_deadlines(&mut outgoing);
                for frame in outgoing {
                    if write_frame(&shared, &mut transport, &frame).await.is_err() {
                        break 'outer "write failed";
                    }
                }
            }
        }
    };

    shared.fail_all();
    *shared.state.write() = ConnectionState::Disconnected;
    debug!(reason, "engine loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::pair;

    fn client() -> CoapClient {
        let (local, _remote) = pair();
        CoapClient::new(Box::new(local), ClientConfig::default())
    }

    #[tokio::test]
    async fn message_ids_increment_and_wrap() {
        let client = client();
        let first = client.shared.next_mid();
        for i in 1..=10_000u32 {
            let mid = client.shared.next_mid();
            assert_eq!(mid, first.wrapping_add(i as u16), "at submission {i}");
        }
    }

    #[tokio::test]
    async fn tokens_never_collide_while_outstanding() {
        let client = client();
        // Submit without a device: exchanges stay pending, so every token
        // drawn must be distinct.
        let mut handles = Vec::new();
        for _ in 0..64 {
            let handle = client
                .submit(CoapRequest::get("/ietf-interfaces:interfaces"))
                .await
                .unwrap();
            handles.push(handle);
        }
        let mut tokens: Vec<Token> = handles.iter().map(ExchangeHandle::token).collect();
        tokens.sort_by_key(|t| t.0);
        tokens.dedup();
        assert_eq!(tokens.len(), 64);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_resolves_handle() {
        let client = client();
        let handle = client
            .submit(CoapRequest::get("/ietf-interfaces:interfaces"))
            .await
            .unwrap();
        let token = handle.token();

        handle.cancel();
        handle.cancel();
        assert!(!client.shared.pending.contains_key(&token));

        match handle.response().await {
            Err(Error::Cancelled(t)) => assert_eq!(t, token),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_after_shutdown_fails() {
        let client = client();
        client.shutdown();
        // State flips synchronously
        let err = client
            .submit(CoapRequest::get("/x"))
            .await
            .expect_err("must refuse");
        assert!(matches!(err, Error::TransportDown));
    }
}
