//! Wire encoder for requests and replies.
//!
//! The decoder never sends anything; this exists to author captures and
//! test vectors in the exact layout the grammar expects.

use crate::message::{Constraint, Device, OptionDescriptor, Reply, Request, Text};

/// Placeholder word written in place of an absent array element.
pub const NULL_PLACEHOLDER: u32 = 1;

/// Big-endian byte builder.
///
/// # Examples
///
/// ```
/// use sanetrace_proto::encode::Encoder;
///
/// let bytes = Encoder::new().u32(2).string(b"net:scanner").into_vec();
/// assert_eq!(bytes.len(), 4 + 4 + 11);
/// ```
#[derive(Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(64) }
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Raw bytes with no length prefix.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Length-prefixed bytes.
    pub fn string(self, bytes: &[u8]) -> Self {
        self.u32(bytes.len() as u32).bytes(bytes)
    }

    fn text(self, text: Text<'_>) -> Self {
        self.string(text.as_bytes())
    }

    pub fn output(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn request(self, request: &Request<'_>) -> Self {
        let e = self.u32(request.opcode());
        match request {
            Request::Init { version, user_name } => e.u32(version.to_word()).text(*user_name),
            Request::Open { device_name } => e.text(*device_name),
            Request::ControlOption { handle, option, action, value_type, element_count, value } => e
                .u32(*handle)
                .u32(*option)
                .u32(*action)
                .u32(*value_type)
                .u32(value.len() as u32)
                .u32(*element_count)
                .bytes(value),
            Request::Authorize { resource, username, password } => {
                e.text(*resource).text(*username).text(*password)
            }
            Request::Close { handle }
            | Request::GetOptionDescriptors { handle }
            | Request::GetParameters { handle }
            | Request::Start { handle }
            | Request::Cancel { handle } => e.u32(*handle),
            Request::GetDevices | Request::Exit | Request::Unknown(_) => e,
        }
    }

    pub fn reply(self, reply: &Reply<'_>) -> Self {
        match reply {
            Reply::Init { status, version } => self.u32(*status).u32(version.to_word()),
            Reply::GetDevices { status, devices } => {
                let mut e = self.u32(*status).u32(devices.len() as u32);
                for device in devices {
                    e = e.device(device.as_ref());
                }
                e
            }
            Reply::Open { status, handle, resource } => self.u32(*status).u32(*handle).text(*resource),
            Reply::GetOptionDescriptors { options } => {
                let mut e = self.u32(options.len() as u32);
                for option in options {
                    e = e.option_descriptor(option.as_ref());
                }
                e
            }
            Reply::ControlOption { status, info, value_type, element_count, value, resource } => self
                .u32(*status)
                .u32(*info)
                .u32(*value_type)
                .u32(value.len() as u32)
                .u32(*element_count)
                .bytes(value)
                .text(*resource),
            Reply::GetParameters { status, parameters: p } => self
                .u32(*status)
                .u32(p.format)
                .u32(p.last_frame as u32)
                .u32(p.bytes_per_line)
                .u32(p.pixels_per_line)
                .u32(p.lines)
                .u32(p.depth),
            Reply::Start { status, port, byte_order, resource } => {
                self.u32(*status).u32(*port).u32(*byte_order).text(*resource)
            }
            Reply::Dummy { value, .. } => self.u32(*value),
            Reply::Empty { .. } => self,
        }
    }

    fn device(self, device: Option<&Device<'_>>) -> Self {
        let Some(device) = device else {
            return self.u32(NULL_PLACEHOLDER);
        };
        self.u32(0).text(device.name).text(device.vendor).text(device.model).text(device.kind)
    }

    fn option_descriptor(self, option: Option<&OptionDescriptor<'_>>) -> Self {
        let Some(o) = option else {
            return self.u32(NULL_PLACEHOLDER);
        };
        let e = self.u32(0).text(o.name).text(o.title).text(o.desc).u32(o.value_type).u32(o.unit).u32(o.size).u32(o.cap);
        match &o.constraint {
            Constraint::None => e.u32(0),
            Constraint::Range(None) => e.u32(1).u32(NULL_PLACEHOLDER),
            Constraint::Range(Some(range)) => e.u32(1).u32(0).u32(range.min).u32(range.max).u32(range.quant),
            Constraint::WordList(words) => words.iter().fold(e.u32(2).u32(words.len() as u32), |e, w| e.u32(*w)),
            Constraint::StringList(strings) => {
                strings.iter().fold(e.u32(3).u32(strings.len() as u32), |e, s| e.text(*s))
            }
            Constraint::Other(kind) => e.u32(*kind),
        }
    }
}
