//! Per-actor request multiplexing.
//!
//! The debugger server answers requests to one actor strictly in order and
//! replies carry no request ID, only the sending actor. The client therefore
//! keeps at most one request in flight per actor and queues the rest.
//!
//! # State
//!
//! ```text
//!            flush()                     route(reply)
//!   idle ───────────────► active[actor] ───────────────► idle
//!                                                         │
//!   queue: [r3(a), r4(b), r5(a)]  ◄── flush() again ──────┘
//!
//! An idle actor has no entry, so the table only holds actors with a
//! request in flight.
//! ```
//!
//! [`Multiplexer`] performs no I/O: [`Multiplexer::flush`] returns encoded
//! packets for the caller to write.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;
use crate::protocol::{RdpMessage, RdpRequest, UnsolicitedEvents, encode_frame};

// ============================================================================
// Types
// ============================================================================

/// Completion slot for one request. Consumed on completion, so each
/// request completes exactly once.
pub type ReplySender = oneshot::Sender<Result<RdpMessage>>;

/// A request that has not been written yet.
struct PendingRequest {
    request: RdpRequest,
    reply: ReplySender,
}

// ============================================================================
// Routed
// ============================================================================

/// What [`Multiplexer::route`] did with an incoming message.
#[derive(Debug)]
pub enum Routed {
    /// The message completed the sender's active request.
    ///
    /// The caller should [`Multiplexer::flush`] again.
    Completed(ActorId),

    /// Unsolicited event; no request touched.
    Unsolicited(RdpMessage),

    /// Error envelope without a sender.
    RdpError(RdpMessage),

    /// Message nobody was waiting for.
    Unexpected(Error),
}

// ============================================================================
// Multiplexer
// ============================================================================

/// Queue plus active table enforcing one in-flight request per actor.
pub struct Multiplexer {
    /// Requests not yet written, in submission order.
    queue: VecDeque<PendingRequest>,
    /// Reply slot per actor with a request in flight. Absent means idle.
    active: FxHashMap<ActorId, ReplySender>,
    /// Message types that never complete a request.
    unsolicited: UnsolicitedEvents,
}

impl Multiplexer {
    /// Creates an empty multiplexer.
    #[must_use]
    pub fn new(unsolicited: UnsolicitedEvents) -> Self {
        Self {
            queue: VecDeque::new(),
            active: FxHashMap::default(),
            unsolicited,
        }
    }

    /// Appends a request to the tail of the queue.
    pub fn submit(&mut self, request: RdpRequest, reply: ReplySender) {
        trace!(to = %request.to, request_type = %request.request_type, "Request queued");
        self.queue.push_back(PendingRequest { request, reply });
    }

    /// Registers an expected reply from `actor` without sending anything.
    ///
    /// Used for the root greeting the server sends on connect. If `actor`
    /// already has an active request the slot fails with
    /// [`Error::ActorBusy`] and the existing entry is left untouched.
    pub fn expect_reply(&mut self, actor: ActorId, reply: ReplySender) {
        if self.is_awaiting(&actor) {
            error!(%actor, "Reply expectation registered for busy actor");
            let _ = reply.send(Err(Error::actor_busy(actor)));
            return;
        }

        self.active.insert(actor, reply);
    }

    /// Moves every queued request whose actor is idle to the active table.
    ///
    /// Scans the queue once, preserving order for busy actors. Returns the
    /// encoded packets to write, in queue order. A request that fails to
    /// encode is rejected on its own.
    pub fn flush(&mut self) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        let mut still_queued = VecDeque::with_capacity(self.queue.len());

        while let Some(pending) = self.queue.pop_front() {
            if self.is_awaiting(&pending.request.to) {
                still_queued.push_back(pending);
                continue;
            }

            match encode_frame(&pending.request) {
                Ok(packet) => {
                    trace!(to = %pending.request.to, bytes = packet.len(), "Request sent");
                    packets.push(packet);
                    self.active.insert(pending.request.to, pending.reply);
                }
                Err(e) => {
                    let _ = pending.reply.send(Err(e));
                }
            }
        }

        self.queue = still_queued;
        packets
    }

    /// Routes an incoming message.
    pub fn route(&mut self, message: RdpMessage) -> Routed {
        let Some(from) = message.from.clone() else {
            if message.is_error() {
                return Routed::RdpError(message);
            }
            return Routed::Unexpected(Error::protocol(format!(
                "Received an RDP message without a sender actor: {}",
                to_json(&message)
            )));
        };

        if self.unsolicited.contains(message.message_type()) {
            return Routed::Unsolicited(message);
        }

        let Some(reply) = self.active.remove(&from) else {
            return Routed::Unexpected(unexpected(&message));
        };

        trace!(%from, "Reply received");
        let _ = reply.send(message.into_result());
        Routed::Completed(from)
    }

    /// Rejects every active and queued request with
    /// [`Error::ConnectionClosed`] and clears both tables.
    pub fn reject_all(&mut self) {
        let mut count = 0;

        for (_, reply) in self.active.drain() {
            let _ = reply.send(Err(Error::ConnectionClosed));
            count += 1;
        }

        for pending in self.queue.drain(..) {
            let _ = pending.reply.send(Err(Error::ConnectionClosed));
            count += 1;
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }

    /// Returns `true` if `actor` has a request in flight.
    #[inline]
    #[must_use]
    pub fn is_awaiting(&self, actor: &ActorId) -> bool {
        self.active.contains_key(actor)
    }

    /// Returns the number of requests in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns the number of requests not yet written.
    #[inline]
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }
}

fn unexpected(message: &RdpMessage) -> Error {
    Error::protocol(format!(
        "Unexpected RDP message received: {}",
        to_json(message)
    ))
}

fn to_json(message: &RdpMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{message:?}"))
}

// ============================================================================
// Tests
// ============================================================================
