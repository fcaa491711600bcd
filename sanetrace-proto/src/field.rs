//! Decoded field records, their display metadata, and the sink that
//! receives them.

use std::fmt::Write;
use std::ops::Range;

use crate::codes::{Action, ConstraintKind, FrameFormat, Opcode, Status, Unit, ValueType};

/// Identity of every field the decoder can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    RpcCode,
    RpcStatus,
    VersionCode,
    VersionMajor,
    VersionMinor,
    VersionBuild,
    UserName,
    Device,
    DeviceName,
    DeviceVendor,
    DeviceModel,
    DeviceType,
    Handle,
    Resource,
    Username,
    Password,
    Dummy,
    NumOptions,
    Option,
    OptionName,
    OptionTitle,
    OptionDesc,
    OptionType,
    OptionUnit,
    OptionSize,
    OptionCap,
    ConstraintType,
    ConstraintRange,
    RangeMin,
    RangeMax,
    RangeQuant,
    WordList,
    WordListItem,
    StringList,
    StringListItem,
    OptionNum,
    Action,
    ValueType,
    ValueSize,
    Value,
    Info,
    Port,
    ByteOrder,
    Parameters,
    ParamFormat,
    ParamLastFrame,
    ParamBytesPerLine,
    ParamPixelsPerLine,
    ParamLines,
    ParamDepth,
}

impl FieldId {
    pub const ALL: [FieldId; 50] = [
        FieldId::RpcCode,
        FieldId::RpcStatus,
        FieldId::VersionCode,
        FieldId::VersionMajor,
        FieldId::VersionMinor,
        FieldId::VersionBuild,
        FieldId::UserName,
        FieldId::Device,
        FieldId::DeviceName,
        FieldId::DeviceVendor,
        FieldId::DeviceModel,
        FieldId::DeviceType,
        FieldId::Handle,
        FieldId::Resource,
        FieldId::Username,
        FieldId::Password,
        FieldId::Dummy,
        FieldId::NumOptions,
        FieldId::Option,
        FieldId::OptionName,
        FieldId::OptionTitle,
        FieldId::OptionDesc,
        FieldId::OptionType,
        FieldId::OptionUnit,
        FieldId::OptionSize,
        FieldId::OptionCap,
        FieldId::ConstraintType,
        FieldId::ConstraintRange,
        FieldId::RangeMin,
        FieldId::RangeMax,
        FieldId::RangeQuant,
        FieldId::WordList,
        FieldId::WordListItem,
        FieldId::StringList,
        FieldId::StringListItem,
        FieldId::OptionNum,
        FieldId::Action,
        FieldId::ValueType,
        FieldId::ValueSize,
        FieldId::Value,
        FieldId::Info,
        FieldId::Port,
        FieldId::ByteOrder,
        FieldId::Parameters,
        FieldId::ParamFormat,
        FieldId::ParamLastFrame,
        FieldId::ParamBytesPerLine,
        FieldId::ParamPixelsPerLine,
        FieldId::ParamLines,
        FieldId::ParamDepth,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Base {
    Dec,
    Hex,
}

/// Semantic type of a field, which also decides how its value renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Uint(Base),
    Enum(&'static [(u32, &'static str)]),
    Bool,
    Str,
    Bytes,
    /// Group whose range is closed after its children.
    Composite,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldInfo {
    pub label: &'static str,
    pub abbrev: &'static str,
    pub kind: FieldKind,
}

/// Immutable label registry, built once and shared by reference with every
/// consumer that renders fields.
pub struct FieldTable {
    entries: Vec<FieldInfo>,
}

impl Default for FieldTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldTable {
    pub fn new() -> Self {
        use Base::{Dec, Hex};
        use FieldKind::*;
        let entries = FieldId::ALL
            .iter()
            .map(|id| {
                let (label, abbrev, kind) = match id {
                    FieldId::RpcCode => ("RPC Code", "sane.rpc.code", Enum(Opcode::NAMES)),
                    FieldId::RpcStatus => ("RPC Status", "sane.rpc.status", Enum(Status::NAMES)),
                    FieldId::VersionCode => ("Version Code", "sane.net.version_code", Uint(Hex)),
                    FieldId::VersionMajor => ("Major", "sane.net.version_code.major", Uint(Dec)),
                    FieldId::VersionMinor => ("Minor", "sane.net.version_code.minor", Uint(Dec)),
                    FieldId::VersionBuild => ("Build", "sane.net.version_code.build", Uint(Dec)),
                    FieldId::UserName => ("User Name", "sane.net.user_name", Str),
                    FieldId::Device => ("Device", "sane.net.device", Composite),
                    FieldId::DeviceName => ("Device Name", "sane.net.device.name", Str),
                    FieldId::DeviceVendor => ("Device Vendor", "sane.net.device.vendor", Str),
                    FieldId::DeviceModel => ("Device Model", "sane.net.device.model", Str),
                    FieldId::DeviceType => ("Device Type", "sane.net.device.type", Str),
                    FieldId::Handle => ("Handle", "sane.net.handle", Uint(Hex)),
                    FieldId::Resource => ("Resource", "sane.net.resource", Str),
                    FieldId::Username => ("Username", "sane.net.username", Str),
                    FieldId::Password => ("Password", "sane.net.password", Str),
                    FieldId::Dummy => ("Dummy", "sane.net.dummy", Uint(Hex)),
                    FieldId::NumOptions => ("Number of Options", "sane.net.num_options", Uint(Dec)),
                    FieldId::Option => ("Option", "sane.net.option", Composite),
                    FieldId::OptionName => ("Name", "sane.net.option.name", Str),
                    FieldId::OptionTitle => ("Title", "sane.net.option.title", Str),
                    FieldId::OptionDesc => ("Description", "sane.net.option.desc", Str),
                    FieldId::OptionType => ("Type", "sane.net.option.type", Enum(ValueType::NAMES)),
                    FieldId::OptionUnit => ("Unit", "sane.net.option.unit", Enum(Unit::NAMES)),
                    FieldId::OptionSize => ("Size", "sane.net.option.size", Uint(Dec)),
                    FieldId::OptionCap => ("Capabilities", "sane.net.option.cap", Uint(Hex)),
                    FieldId::ConstraintType => {
                        ("Constraint Type", "sane.net.option.constraint_type", Enum(ConstraintKind::NAMES))
                    }
                    FieldId::ConstraintRange => ("Range", "sane.net.option.constraint.range", Composite),
                    FieldId::RangeMin => ("Min", "sane.net.option.constraint.range.min", Uint(Hex)),
                    FieldId::RangeMax => ("Max", "sane.net.option.constraint.range.max", Uint(Hex)),
                    FieldId::RangeQuant => ("Quant", "sane.net.option.constraint.range.quant", Uint(Hex)),
                    FieldId::WordList => ("Word List", "sane.net.option.constraint.word_list", Uint(Dec)),
                    FieldId::WordListItem => ("Item", "sane.net.option.constraint.word_list.item", Uint(Hex)),
                    FieldId::StringList => ("String List", "sane.net.option.constraint.string_list", Uint(Dec)),
                    FieldId::StringListItem => ("Item", "sane.net.option.constraint.string_list.item", Str),
                    FieldId::OptionNum => ("Option", "sane.net.option_num", Uint(Dec)),
                    FieldId::Action => ("Action", "sane.net.action", Enum(Action::NAMES)),
                    FieldId::ValueType => ("Value Type", "sane.net.value_type", Enum(ValueType::NAMES)),
                    FieldId::ValueSize => ("Value Size", "sane.net.value_size", Uint(Dec)),
                    FieldId::Value => ("Value", "sane.net.value", Bytes),
                    FieldId::Info => ("Info", "sane.net.info", Uint(Hex)),
                    FieldId::Port => ("Port", "sane.net.port", Uint(Dec)),
                    FieldId::ByteOrder => ("Byte Order", "sane.net.byte_order", Uint(Hex)),
                    FieldId::Parameters => ("Parameters", "sane.net.parameters", Composite),
                    FieldId::ParamFormat => ("Format", "sane.net.parameters.format", Enum(FrameFormat::NAMES)),
                    FieldId::ParamLastFrame => ("Last Frame", "sane.net.parameters.last_frame", Bool),
                    FieldId::ParamBytesPerLine => ("Bytes per Line", "sane.net.parameters.bytes_per_line", Uint(Dec)),
                    FieldId::ParamPixelsPerLine => {
                        ("Pixels per Line", "sane.net.parameters.pixels_per_line", Uint(Dec))
                    }
                    FieldId::ParamLines => ("Lines", "sane.net.parameters.lines", Uint(Dec)),
                    FieldId::ParamDepth => ("Depth", "sane.net.parameters.depth", Uint(Dec)),
                };
                FieldInfo { label, abbrev, kind }
            })
            .collect();
        Self { entries }
    }

    pub fn info(&self, id: FieldId) -> &FieldInfo {
        &self.entries[id as usize]
    }

    /// Renders `Label: value` the way a protocol tree line reads.
    pub fn describe(&self, id: FieldId, value: &FieldValue<'_>) -> String {
        let info = self.info(id);
        let mut out = String::from(info.label);
        if matches!(value, FieldValue::None) {
            return out;
        }
        out.push_str(": ");
        match (info.kind, value) {
            (FieldKind::Enum(names), FieldValue::U32(v)) => match names.iter().find(|(code, _)| code == v) {
                Some((_, name)) => {
                    let _ = write!(out, "{name} ({v})");
                }
                None => {
                    let _ = write!(out, "Unknown ({v})");
                }
            },
            (FieldKind::Uint(Base::Hex), value) => match value.as_u32() {
                Some(v) => {
                    let _ = write!(out, "0x{v:08x}");
                }
                None => value.write_plain(&mut out),
            },
            (_, value) => value.write_plain(&mut out),
        }
        out
    }
}

/// Value carried by a decoded field. Strings and blobs borrow from the
/// delivered message bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    None,
    U8(u8),
    U16(u16),
    U32(u32),
    Bool(bool),
    Str(&'a [u8]),
    Bytes(&'a [u8]),
}

impl FieldValue<'_> {
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            FieldValue::U8(v) => Some(v as u32),
            FieldValue::U16(v) => Some(v as u32),
            FieldValue::U32(v) => Some(v),
            _ => None,
        }
    }

    fn write_plain(&self, out: &mut String) {
        let _ = match self {
            FieldValue::None => Ok(()),
            FieldValue::U8(v) => write!(out, "{v}"),
            FieldValue::U16(v) => write!(out, "{v}"),
            FieldValue::U32(v) => write!(out, "{v}"),
            FieldValue::Bool(v) => write!(out, "{}", if *v { "True" } else { "False" }),
            FieldValue::Str(bytes) => write!(out, "{}", String::from_utf8_lossy(bytes)),
            FieldValue::Bytes(bytes) => {
                for byte in bytes.iter() {
                    let _ = write!(out, "{byte:02x}");
                }
                Ok(())
            }
        };
    }
}

/// Receiver for decoded fields.
///
/// Composites are opened with [`FieldSink::begin`] and closed with
/// [`FieldSink::end`], which fixes the exclusive end of their byte range.
/// Fields added in between are children of the innermost open composite.
pub trait FieldSink<'a> {
    fn add(&mut self, id: FieldId, range: Range<usize>, value: FieldValue<'a>);
    fn begin(&mut self, id: FieldId, start: usize, value: FieldValue<'a>);
    fn end(&mut self, end: usize);
}

/// Sink for passes that only need correlation state, not a field tree.
impl<'a> FieldSink<'a> for () {
    fn add(&mut self, _: FieldId, _: Range<usize>, _: FieldValue<'a>) {}
    fn begin(&mut self, _: FieldId, _: usize, _: FieldValue<'a>) {}
    fn end(&mut self, _: usize) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldNode<'a> {
    pub id: FieldId,
    pub range: Range<usize>,
    pub value: FieldValue<'a>,
    pub children: Vec<FieldNode<'a>>,
}

impl<'a> FieldNode<'a> {
    /// First direct child with the given id.
    pub fn child(&self, id: FieldId) -> Option<&FieldNode<'a>> {
        self.children.iter().find(|c| c.id == id)
    }
}

/// Collecting sink that builds the nested field tree of one message.
#[derive(Default, Debug)]
pub struct FieldTree<'a> {
    roots: Vec<FieldNode<'a>>,
    open: Vec<FieldNode<'a>>,
}

impl<'a> FieldTree<'a> {
    pub fn new() -> Self {
        Self { roots: Vec::new(), open: Vec::new() }
    }

    /// Closes any composite left open by an interrupted decode and returns
    /// the top-level fields.
    ///
    /// An interrupted composite ends where its last child ends.
    pub fn finish(mut self) -> Vec<FieldNode<'a>> {
        while let Some(node) = self.open.last() {
            let end = node.children.last().map_or(node.range.start, |c| c.range.end);
            self.end(end);
        }
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.open.is_empty()
    }

    fn push(&mut self, node: FieldNode<'a>) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }
}

impl<'a> FieldSink<'a> for FieldTree<'a> {
    fn add(&mut self, id: FieldId, range: Range<usize>, value: FieldValue<'a>) {
        self.push(FieldNode { id, range, value, children: Vec::new() });
    }

    fn begin(&mut self, id: FieldId, start: usize, value: FieldValue<'a>) {
        self.open.push(FieldNode { id, range: start..start, value, children: Vec::new() });
    }

    fn end(&mut self, end: usize) {
        let Some(mut node) = self.open.pop() else {
            return;
        };
        node.range.end = end.max(node.range.start);
        self.push(node);
    }
}
