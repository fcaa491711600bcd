//! Pairing of opcode-less replies with the requests that produced them.
//!
//! Each connection keeps an ordered queue of request opcodes. Requests are
//! appended when first decoded. A reply resolves to the oldest request that
//! has not been answered, and once the reply decodes completely that entry
//! is recycled to the tail of the queue behind every outstanding request.
//! Recycled entries are retained for the life of the connection, so after
//! every request has been answered the queue holds the same opcodes in the
//! same order it held before the replies arrived.
//!
//! Resolution is memoized per message on its first visit, including a
//! failure to resolve. A message seen again on a later analysis pass
//! reuses that outcome and never looks at the live queue, which has since
//! moved on.

use std::collections::VecDeque;

use foldhash::quality::RandomState;
use hashbrown::HashMap;

/// Connection identity as supplied by the stream layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Identity of one message within the capture, stable across analysis
/// passes and across redeliveries of the same message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

/// Whether a message is being decoded to completion for the first time.
///
/// State is only mutated on [`Visit::First`]. A message that stopped short
/// with need-more-data has not completed, so its redelivery is still a
/// first visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    First,
    Repeat,
}

/// A request opcode tagged with the order it was recorded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRpc {
    pub opcode: u32,
    pub seq: u64,
}

#[derive(Default, Debug)]
struct ConnectionQueue {
    /// Outstanding entries first, then recycled ones.
    entries: VecDeque<PendingRpc>,
    outstanding: usize,
}

impl ConnectionQueue {
    fn head(&self) -> Option<&PendingRpc> {
        if self.outstanding == 0 {
            return None;
        }
        self.entries.front()
    }

    fn push(&mut self, rpc: PendingRpc) {
        self.entries.insert(self.outstanding, rpc);
        self.outstanding += 1;
    }

    fn rotate(&mut self) {
        if self.outstanding == 0 {
            return;
        }
        if let Some(rpc) = self.entries.pop_front() {
            self.entries.push_back(rpc);
        }
        self.outstanding -= 1;
    }
}

/// Per-session correlation state: one queue per connection and one memo per
/// reply message.
///
/// Owned by the stream layer and passed by reference into every decode.
pub struct CorrelationTracker {
    connections: HashMap<ConnectionId, ConnectionQueue, RandomState>,
    /// `None` records a reply that had nothing to resolve to.
    resolved: HashMap<MessageId, Option<u32>, RandomState>,
    next_seq: u64,
}

impl Default for CorrelationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTracker {
    pub fn new() -> Self {
        Self {
            connections: HashMap::with_hasher(RandomState::default()),
            resolved: HashMap::with_hasher(RandomState::default()),
            next_seq: 0,
        }
    }

    /// Appends a decoded request's opcode to its connection's queue.
    ///
    /// Repeat visits leave the queue untouched.
    pub fn record_request(&mut self, connection: ConnectionId, opcode: u32, visit: Visit) {
        if visit == Visit::Repeat {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.connections.entry(connection).or_default().push(PendingRpc { opcode, seq });
    }

    /// Determines which opcode a reply answers.
    ///
    /// The memo for `message` wins when present. Otherwise a first visit
    /// takes the oldest outstanding request without consuming it and
    /// memoizes the result, resolved or not. A repeat visit with no memo
    /// stays unresolved.
    pub fn resolve_reply(&mut self, connection: ConnectionId, message: MessageId, visit: Visit) -> Option<u32> {
        if let Some(&memo) = self.resolved.get(&message) {
            return memo;
        }
        if visit == Visit::Repeat {
            return None;
        }
        let opcode = self.connections.get(&connection).and_then(|queue| queue.head()).map(|rpc| rpc.opcode);
        self.resolved.insert(message, opcode);
        opcode
    }

    /// Marks the head request as answered once its reply decoded completely,
    /// recycling it to the tail of the queue.
    pub fn complete_reply(&mut self, connection: ConnectionId, visit: Visit) {
        if visit == Visit::Repeat {
            return;
        }
        if let Some(queue) = self.connections.get_mut(&connection) {
            queue.rotate();
        }
    }

    /// Memoized resolution of a reply message: `None` when it has never been
    /// visited, `Some(None)` when its first visit found nothing pending.
    pub fn memoized(&self, message: MessageId) -> Option<Option<u32>> {
        self.resolved.get(&message).copied()
    }

    /// Queue contents in order: outstanding requests first, then recycled
    /// entries.
    pub fn queue(&self, connection: ConnectionId) -> Vec<PendingRpc> {
        match self.connections.get(&connection) {
            Some(queue) => queue.entries.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Number of requests still waiting for a reply.
    pub fn outstanding(&self, connection: ConnectionId) -> usize {
        self.connections.get(&connection).map_or(0, |q| q.outstanding)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
