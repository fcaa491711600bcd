//! Entry point tying direction, grammar and correlation together.

use std::fmt;

use crate::correlation::{ConnectionId, CorrelationTracker, MessageId, Visit};
use crate::cursor::NeedMore;
use crate::direction::{Direction, Ports, SANE_PORT, classify};
use crate::field::FieldSink;
use crate::grammar::{decode_reply, decode_request};
use crate::message::{Message, Request};
use crate::summary::summarize;

/// The only configuration surface of the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DissectorConfig {
    pub service_port: u16,
}

impl Default for DissectorConfig {
    fn default() -> Self {
        Self { service_port: SANE_PORT }
    }
}

/// What the stream layer knows about the message being delivered.
#[derive(Clone, Copy, Debug)]
pub struct MessageInfo {
    pub connection: ConnectionId,
    pub message: MessageId,
    pub ports: Ports,
    /// Port previously established as this connection's server side.
    pub server_port: Option<u16>,
    pub visit: Visit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    Complete(Message<'a>),
    /// Redeliver the message from `resume_from` with more bytes.
    NeedMore(NeedMore),
    /// Reply with no pending request or memo to interpret it by.
    Unresolved,
}

/// Non-fatal conditions a dissection can end in. None of them stop the
/// analysis of later messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anomaly {
    InsufficientData(NeedMore),
    UnresolvedCorrelation,
    UnrecognizedOpcode(u32),
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData(need) => {
                write!(f, "insufficient data: {} more bytes from offset {}", need.additional, need.resume_from)
            }
            Self::UnresolvedCorrelation => write!(f, "reply has no pending request"),
            Self::UnrecognizedOpcode(code) => write!(f, "unrecognized opcode: {code:#x}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dissection<'a> {
    pub direction: Direction,
    pub summary: String,
    /// Opcode read from a request or resolved for a reply.
    pub opcode: Option<u32>,
    /// Offset just past the last decoded field, or the message start when
    /// nothing was decoded to completion.
    pub end: usize,
    pub outcome: Outcome<'a>,
}

impl<'a> Dissection<'a> {
    pub fn anomaly(&self) -> Option<Anomaly> {
        match &self.outcome {
            Outcome::NeedMore(need) => Some(Anomaly::InsufficientData(*need)),
            Outcome::Unresolved => Some(Anomaly::UnresolvedCorrelation),
            Outcome::Complete(Message::Request(Request::Unknown(code))) => Some(Anomaly::UnrecognizedOpcode(*code)),
            Outcome::Complete(_) => None,
        }
    }

    pub fn message(&self) -> Option<&Message<'a>> {
        match &self.outcome {
            Outcome::Complete(message) => Some(message),
            _ => None,
        }
    }
}

/// Decodes one delivered message.
///
/// Requests record their opcode with the tracker once fully decoded; replies
/// take theirs from it and mark it answered once fully decoded. Both only
/// mutate the tracker on a [`Visit::First`].
pub fn dissect<'a, S: FieldSink<'a>>(
    config: &DissectorConfig,
    tracker: &mut CorrelationTracker,
    info: &MessageInfo,
    bytes: &'a [u8],
    sink: &mut S,
) -> Dissection<'a> {
    let direction = classify(info.ports, info.server_port, config.service_port);
    let summary = summarize(info.ports, direction, bytes);

    let (opcode, end, outcome) = match direction {
        Direction::Request => match decode_request(bytes, 0, sink) {
            Ok(decoded) => {
                let opcode = decoded.value.opcode();
                if let Request::Unknown(code) = decoded.value {
                    kvlog::debug!("Unrecognized request opcode", code, connection = info.connection.0);
                }
                tracker.record_request(info.connection, opcode, info.visit);
                (Some(opcode), decoded.end, Outcome::Complete(Message::Request(decoded.value)))
            }
            Err(need) => {
                kvlog::debug!("Request needs more data", additional = need.additional, message = info.message.0);
                let opcode = request_opcode(bytes);
                (opcode, 0, Outcome::NeedMore(need))
            }
        },
        Direction::Response => match tracker.resolve_reply(info.connection, info.message, info.visit) {
            None => {
                kvlog::debug!("Reply opcode unresolved", connection = info.connection.0, message = info.message.0);
                (None, 0, Outcome::Unresolved)
            }
            Some(opcode) => match decode_reply(opcode, bytes, 0, sink) {
                Ok(decoded) => {
                    tracker.complete_reply(info.connection, info.visit);
                    (Some(opcode), decoded.end, Outcome::Complete(Message::Reply(decoded.value)))
                }
                Err(need) => {
                    kvlog::debug!("Reply needs more data", additional = need.additional, message = info.message.0);
                    (Some(opcode), 0, Outcome::NeedMore(need))
                }
            },
        },
    };

    Dissection { direction, summary, opcode, end, outcome }
}

fn request_opcode(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b, c, d, ..] => Some(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => None,
    }
}
