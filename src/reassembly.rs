//! Stream layer: reassembles each direction of each connection and feeds
//! whole messages to the dissector.
//!
//! A direction's bytes are buffered until the dissector stops asking for
//! more. Messages are identified by where they start in their direction,
//! which stays the same across redeliveries and across analysis passes.

use foldhash::quality::RandomState;
use hashbrown::{HashMap, HashSet};
use sanetrace_proto::codes::opcode_name;
use sanetrace_proto::{
    ConnectionId, CorrelationTracker, Direction, Dissection, DissectorConfig, FieldTable, FieldTree, Message, MessageId,
    MessageInfo, Outcome, Ports, Request, Visit, dissect,
};

use crate::config::SessionConfig;
use crate::report::{CaptureReport, MessageReport, field_reports};
use crate::transcript::Transcript;

/// Stream number, source port, destination port.
type FlowKey = (u64, u16, u16);

#[derive(Default)]
struct Flow {
    buf: Vec<u8>,
    /// Offset within the flow of `buf[0]`.
    base: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MessageState {
    Complete,
    Unresolved,
    /// Needed more than the reassembly buffer may hold.
    Truncated,
    /// Still waiting for bytes when the capture ended.
    Incomplete,
}

impl MessageState {
    fn as_str(self) -> &'static str {
        match self {
            MessageState::Complete => "complete",
            MessageState::Unresolved => "unresolved",
            MessageState::Truncated => "truncated",
            MessageState::Incomplete => "incomplete",
        }
    }
}

pub struct Analyzer {
    dissector: DissectorConfig,
    passes: u32,
    max_buffer: usize,
    table: FieldTable,
    tracker: CorrelationTracker,
    ids: HashMap<(FlowKey, u64), MessageId, RandomState>,
    /// Messages whose decode has finished in some pass.
    visited: HashSet<MessageId, RandomState>,
    /// Server port of each stream, taken from its first request.
    servers: HashMap<u64, u16, RandomState>,
}

impl Analyzer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            dissector: DissectorConfig { service_port: config.service_port },
            passes: config.passes.max(1),
            max_buffer: config.max_buffer,
            table: FieldTable::new(),
            tracker: CorrelationTracker::new(),
            ids: HashMap::with_hasher(RandomState::default()),
            visited: HashSet::with_hasher(RandomState::default()),
            servers: HashMap::with_hasher(RandomState::default()),
        }
    }

    /// Runs every configured pass and reports the messages of the last one.
    pub fn run(&mut self, transcript: &Transcript) -> CaptureReport {
        let mut messages = Vec::new();
        for pass in 1..=self.passes {
            messages = self.pass(transcript);
            kvlog::debug!("Analysis pass finished", pass, messages = messages.len());
        }
        CaptureReport { passes: self.passes, messages }
    }

    fn pass(&mut self, transcript: &Transcript) -> Vec<MessageReport> {
        let mut flows: HashMap<FlowKey, Flow, RandomState> = HashMap::with_hasher(RandomState::default());
        let mut order = Vec::new();
        let mut reports = Vec::new();

        for segment in &transcript.segments {
            let key = (segment.stream, segment.ports.src, segment.ports.dst);
            let flow = flows.entry(key).or_insert_with(|| {
                order.push(key);
                Flow::default()
            });
            flow.buf.extend_from_slice(&segment.data);
            self.drain(key, flow, &mut reports);
        }

        for key in order {
            let Some(flow) = flows.get(&key) else { continue };
            if flow.buf.is_empty() {
                continue;
            }
            kvlog::info!("Message incomplete at end of capture", stream = key.0, buffered = flow.buf.len());
            let message = self.message_id(key, flow.base);
            let info = self.message_info(key, message);
            let mut tree = FieldTree::new();
            let dissection = dissect(&self.dissector, &mut self.tracker, &info, &flow.buf, &mut tree);
            let report = self.report(key, flow, flow.buf.len(), &dissection, tree, MessageState::Incomplete);
            push(&mut reports, report);
        }
        reports
    }

    /// Dissects every complete message at the front of `flow`.
    fn drain(&mut self, key: FlowKey, flow: &mut Flow, reports: &mut Vec<MessageReport>) {
        while !flow.buf.is_empty() {
            let message = self.message_id(key, flow.base);
            let Some(consumed) = self.dissect_front(key, flow, message, reports) else {
                return;
            };
            self.visited.insert(message);
            flow.buf.drain(..consumed);
            flow.base += consumed as u64;
        }
    }

    /// Returns how many bytes the message at the front of `flow` occupies,
    /// or `None` when it is still waiting for more data.
    fn dissect_front(
        &mut self,
        key: FlowKey,
        flow: &Flow,
        message: MessageId,
        reports: &mut Vec<MessageReport>,
    ) -> Option<usize> {
        let info = self.message_info(key, message);
        let mut tree = FieldTree::new();
        let dissection = dissect(&self.dissector, &mut self.tracker, &info, &flow.buf, &mut tree);

        let (state, consumed) = match &dissection.outcome {
            Outcome::NeedMore(need) => {
                let wanted = flow.buf.len().saturating_add(need.additional);
                if wanted <= self.max_buffer {
                    kvlog::debug!(
                        "Waiting for more data",
                        stream = key.0,
                        buffered = flow.buf.len(),
                        additional = need.additional
                    );
                    return None;
                }
                kvlog::warn!("Message exceeds reassembly buffer", stream = key.0, wanted, max = self.max_buffer);
                self.abandon(&info, &dissection);
                (MessageState::Truncated, flow.buf.len())
            }
            Outcome::Unresolved => (MessageState::Unresolved, flow.buf.len()),
            // Nothing past the opcode is understood, so the rest of what has
            // arrived is taken as its body.
            Outcome::Complete(Message::Request(Request::Unknown(_))) => (MessageState::Complete, flow.buf.len()),
            Outcome::Complete(_) if dissection.end == 0 => (MessageState::Complete, flow.buf.len()),
            Outcome::Complete(Message::Request(_)) => {
                if info.visit == Visit::First {
                    self.servers.entry(key.0).or_insert(key.2);
                }
                (MessageState::Complete, dissection.end)
            }
            Outcome::Complete(Message::Reply(_)) => (MessageState::Complete, dissection.end),
        };

        let report = self.report(key, flow, consumed, &dissection, tree, state);
        push(reports, report);
        Some(consumed)
    }

    /// Settles correlation for a message that will never complete, so later
    /// messages on the connection still pair in order. A request still counts
    /// as sent when its opcode was read; a reply still answers the request
    /// it resolved to.
    fn abandon(&mut self, info: &MessageInfo, dissection: &Dissection<'_>) {
        let Some(opcode) = dissection.opcode else { return };
        match dissection.direction {
            Direction::Request => self.tracker.record_request(info.connection, opcode, info.visit),
            Direction::Response => self.tracker.complete_reply(info.connection, info.visit),
        }
    }

    fn message_id(&mut self, key: FlowKey, offset: u64) -> MessageId {
        let next = MessageId(self.ids.len() as u64);
        *self.ids.entry((key, offset)).or_insert(next)
    }

    fn message_info(&self, key: FlowKey, message: MessageId) -> MessageInfo {
        MessageInfo {
            connection: ConnectionId(key.0),
            message,
            ports: Ports { src: key.1, dst: key.2 },
            server_port: self.servers.get(&key.0).copied(),
            visit: if self.visited.contains(&message) { Visit::Repeat } else { Visit::First },
        }
    }

    fn report(
        &self,
        key: FlowKey,
        flow: &Flow,
        length: usize,
        dissection: &Dissection<'_>,
        tree: FieldTree<'_>,
        state: MessageState,
    ) -> MessageReport {
        MessageReport {
            index: 0,
            stream: key.0,
            offset: flow.base,
            length,
            direction: dissection.direction.as_str().to_string(),
            summary: dissection.summary.clone(),
            opcode: dissection.opcode.map(opcode_name),
            state: state.as_str().to_string(),
            anomaly: dissection.anomaly().map(|anomaly| anomaly.to_string()),
            fields: field_reports(&self.table, &tree.finish()),
        }
    }
}

fn push(reports: &mut Vec<MessageReport>, mut report: MessageReport) {
    report.index = reports.len() + 1;
    reports.push(report);
}
