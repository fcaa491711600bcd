//! Passive decoder for the SANE network scanner protocol.
//!
//! The crate is sans-IO: it is handed the bytes of one message at a time by
//! a stream layer that owns reassembly, and reports either a decoded message
//! or how many more bytes it needs before it can try again.
//!
//! # Wire Format
//!
//! Every value is a big-endian 32-bit word or a length-prefixed byte string:
//!
//! ```text
//! word:    u32                  - integers, enums, booleans, handles
//! string:  len: u32, bytes[len] - text, not NUL-terminated on the wire
//! array:   count: u32, then count elements
//! pointer: u32 (0 = present, then the record), nonzero = absent
//! ```
//!
//! Requests start with an opcode word. Replies carry no opcode; they answer
//! the oldest unanswered request on their connection, which
//! [`CorrelationTracker`] keeps track of.
//!
//! # Examples
//!
//! ```
//! use sanetrace_proto::{
//!     ConnectionId, CorrelationTracker, DissectorConfig, Encoder, FieldTree, MessageId, MessageInfo,
//!     Outcome, Ports, Visit, dissect,
//! };
//!
//! let config = DissectorConfig::default();
//! let mut tracker = CorrelationTracker::new();
//! let info = MessageInfo {
//!     connection: ConnectionId(0),
//!     message: MessageId(0),
//!     ports: Ports { src: 40000, dst: 6566 },
//!     server_port: None,
//!     visit: Visit::First,
//! };
//! let bytes = Encoder::new().u32(2).string(b"net:scanner").into_vec();
//! let mut tree = FieldTree::new();
//! let dissection = dissect(&config, &mut tracker, &info, &bytes, &mut tree);
//! assert!(matches!(dissection.outcome, Outcome::Complete(_)));
//! assert_eq!(dissection.summary, "40000 > 6566 - Request SANE_NET_OPEN");
//! ```

pub mod codes;
pub mod correlation;
pub mod cursor;
pub mod direction;
pub mod dissect;
pub mod encode;
pub mod field;
pub mod grammar;
pub mod message;
pub mod summary;

pub use correlation::{ConnectionId, CorrelationTracker, MessageId, Visit};
pub use cursor::NeedMore;
pub use direction::{Direction, Ports, SANE_PORT};
pub use dissect::{Anomaly, Dissection, DissectorConfig, MessageInfo, Outcome, dissect};
pub use encode::Encoder;
pub use field::{FieldId, FieldNode, FieldSink, FieldTable, FieldTree, FieldValue};
pub use message::{Message, Reply, Request};
