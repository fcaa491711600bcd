//! Typed view of decoded requests and replies.
//!
//! Everything here borrows from the delivered message bytes. Numeric codes
//! are kept raw so that values outside the known sets survive decoding; use
//! the types in [`crate::codes`] to interpret them.

use std::borrow::Cow;
use std::fmt;

/// Length-prefixed text as it appeared on the wire. Not guaranteed to be
/// valid UTF-8.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Text<'a>(pub &'a [u8]);

impl<'a> Text<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn to_str_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.0)
    }
}

impl fmt::Debug for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_str_lossy(), f)
    }
}

impl PartialEq<str> for Text<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Text<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Protocol version packed into one word: major, minor, then a 16-bit build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionCode {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl VersionCode {
    pub fn from_word(word: u32) -> Self {
        Self { major: (word >> 24) as u8, minor: (word >> 16) as u8, build: word as u16 }
    }

    pub fn to_word(self) -> u32 {
        (self.major as u32) << 24 | (self.minor as u32) << 16 | self.build as u32
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device<'a> {
    pub name: Text<'a>,
    pub vendor: Text<'a>,
    pub model: Text<'a>,
    pub kind: Text<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeConstraint {
    pub min: u32,
    pub max: u32,
    pub quant: u32,
}

/// Legal values of an option, selected by the discriminant read just
/// before the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint<'a> {
    None,
    /// `None` when the range record was a null placeholder.
    Range(Option<RangeConstraint>),
    WordList(Vec<u32>),
    StringList(Vec<Text<'a>>),
    /// Discriminant outside the known set; no payload is consumed.
    Other(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionDescriptor<'a> {
    pub name: Text<'a>,
    pub title: Text<'a>,
    pub desc: Text<'a>,
    pub value_type: u32,
    pub unit: u32,
    pub size: u32,
    pub cap: u32,
    pub constraint: Constraint<'a>,
}

/// Fixed 24-byte block returned by `GET_PARAMETERS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub format: u32,
    pub last_frame: bool,
    pub bytes_per_line: u32,
    pub pixels_per_line: u32,
    pub lines: u32,
    pub depth: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request<'a> {
    Init { version: VersionCode, user_name: Text<'a> },
    GetDevices,
    Open { device_name: Text<'a> },
    Close { handle: u32 },
    GetOptionDescriptors { handle: u32 },
    ControlOption { handle: u32, option: u32, action: u32, value_type: u32, element_count: u32, value: &'a [u8] },
    GetParameters { handle: u32 },
    Start { handle: u32 },
    Cancel { handle: u32 },
    Authorize { resource: Text<'a>, username: Text<'a>, password: Text<'a> },
    Exit,
    /// Opcode outside the known set; nothing past the opcode is decoded.
    Unknown(u32),
}

impl Request<'_> {
    pub fn opcode(&self) -> u32 {
        use crate::codes::Opcode;
        match self {
            Request::Init { .. } => Opcode::Init as u32,
            Request::GetDevices => Opcode::GetDevices as u32,
            Request::Open { .. } => Opcode::Open as u32,
            Request::Close { .. } => Opcode::Close as u32,
            Request::GetOptionDescriptors { .. } => Opcode::GetOptionDescriptors as u32,
            Request::ControlOption { .. } => Opcode::ControlOption as u32,
            Request::GetParameters { .. } => Opcode::GetParameters as u32,
            Request::Start { .. } => Opcode::Start as u32,
            Request::Cancel { .. } => Opcode::Cancel as u32,
            Request::Authorize { .. } => Opcode::Authorize as u32,
            Request::Exit => Opcode::Exit as u32,
            Request::Unknown(code) => *code,
        }
    }
}

/// A response, interpreted under the opcode it was correlated with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<'a> {
    Init { status: u32, version: VersionCode },
    /// `None` entries were null placeholders in the device array.
    GetDevices { status: u32, devices: Vec<Option<Device<'a>>> },
    Open { status: u32, handle: u32, resource: Text<'a> },
    GetOptionDescriptors { options: Vec<Option<OptionDescriptor<'a>>> },
    ControlOption { status: u32, info: u32, value_type: u32, element_count: u32, value: &'a [u8], resource: Text<'a> },
    GetParameters { status: u32, parameters: Parameters },
    Start { status: u32, port: u32, byte_order: u32, resource: Text<'a> },
    /// Single filler word of `CLOSE`, `CANCEL` and `AUTHORIZE` replies.
    Dummy { opcode: u32, value: u32 },
    /// Opcode with no reply body (`EXIT`, or a code outside the known set).
    Empty { opcode: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message<'a> {
    Request(Request<'a>),
    Reply(Reply<'a>),
}
