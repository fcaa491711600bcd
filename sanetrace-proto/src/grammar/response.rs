use crate::codes::{ConstraintKind, Opcode};
use crate::cursor::NeedMore;
use crate::field::{FieldId, FieldSink};
use crate::message::{Constraint, Device, OptionDescriptor, Parameters, RangeConstraint, Reply};

use super::{Decoded, Reader};

/// Decodes one reply starting at `offset`, interpreted as the answer to
/// `opcode`.
///
/// Replies carry no opcode of their own; the caller resolves it from the
/// connection's pending requests.
pub fn decode_reply<'a, S: FieldSink<'a>>(
    opcode: u32,
    bytes: &'a [u8],
    offset: usize,
    sink: &mut S,
) -> Result<Decoded<Reply<'a>>, NeedMore> {
    let mut r = Reader::new(bytes, offset, sink);

    let reply = match Opcode::from_u32(opcode) {
        Some(Opcode::Init) => {
            let status = r.uint(FieldId::RpcStatus, 8)?;
            let version = r.version(4)?;
            Reply::Init { status, version }
        }
        Some(Opcode::GetDevices) => {
            let status = r.uint(FieldId::RpcStatus, 8)?;
            let count = r.word(4)?;
            let mut devices = Vec::new();
            for _ in 0..count {
                devices.push(device(&mut r)?);
            }
            Reply::GetDevices { status, devices }
        }
        Some(Opcode::Open) => {
            let status = r.uint(FieldId::RpcStatus, 12)?;
            let handle = r.uint(FieldId::Handle, 8)?;
            let resource = r.text(FieldId::Resource, 4)?;
            Reply::Open { status, handle, resource }
        }
        Some(Opcode::GetOptionDescriptors) => {
            let count = r.uint(FieldId::NumOptions, 4)?;
            let mut options = Vec::new();
            for _ in 0..count {
                options.push(option_descriptor(&mut r)?);
            }
            Reply::GetOptionDescriptors { options }
        }
        Some(Opcode::ControlOption) => {
            let status = r.uint(FieldId::RpcStatus, 24)?;
            let info = r.uint(FieldId::Info, 20)?;
            let value_type = r.uint(FieldId::ValueType, 16)?;
            let value_size = r.uint(FieldId::ValueSize, 12)?;
            let element_count = r.skip_word();
            let value = r.blob(FieldId::Value, value_size as usize)?;
            let resource = r.text(FieldId::Resource, 4)?;
            Reply::ControlOption { status, info, value_type, element_count, value, resource }
        }
        Some(Opcode::GetParameters) => {
            let status = r.uint(FieldId::RpcStatus, 4 + 4 * 6)?;
            let parameters = parameters(&mut r)?;
            Reply::GetParameters { status, parameters }
        }
        Some(Opcode::Start) => {
            let status = r.uint(FieldId::RpcStatus, 16)?;
            let port = r.uint(FieldId::Port, 12)?;
            let byte_order = r.uint(FieldId::ByteOrder, 8)?;
            let resource = r.text(FieldId::Resource, 4)?;
            Reply::Start { status, port, byte_order, resource }
        }
        Some(Opcode::Close | Opcode::Cancel | Opcode::Authorize) => {
            Reply::Dummy { opcode, value: r.uint(FieldId::Dummy, 4)? }
        }
        Some(Opcode::Exit) | None => Reply::Empty { opcode },
    };

    Ok(r.finish(reply))
}

/// One element of the device array.
///
/// A nonzero leading word is a null placeholder and ends the element; zero
/// is followed by the four strings of the record.
fn device<'a, S: FieldSink<'a>>(r: &mut Reader<'a, '_, S>) -> Result<Option<Device<'a>>, NeedMore> {
    if r.word(4)? != 0 {
        return Ok(None);
    }
    r.ensure(16)?;
    r.begin(FieldId::Device);
    let name = r.text(FieldId::DeviceName, 16)?;
    let vendor = r.text(FieldId::DeviceVendor, 12)?;
    let model = r.text(FieldId::DeviceModel, 8)?;
    let kind = r.text(FieldId::DeviceType, 4)?;
    r.end();
    Ok(Some(Device { name, vendor, model, kind }))
}

/// One element of the option descriptor array, with the same null
/// placeholder convention as the device array.
fn option_descriptor<'a, S: FieldSink<'a>>(
    r: &mut Reader<'a, '_, S>,
) -> Result<Option<OptionDescriptor<'a>>, NeedMore> {
    if r.word(4)? != 0 {
        return Ok(None);
    }
    r.ensure(32)?;
    r.begin(FieldId::Option);
    let name = r.text(FieldId::OptionName, 32)?;
    let title = r.text(FieldId::OptionTitle, 28)?;
    let desc = r.text(FieldId::OptionDesc, 24)?;
    let value_type = r.uint(FieldId::OptionType, 20)?;
    let unit = r.uint(FieldId::OptionUnit, 16)?;
    let size = r.uint(FieldId::OptionSize, 12)?;
    let cap = r.uint(FieldId::OptionCap, 8)?;
    let kind = r.uint(FieldId::ConstraintType, 4)?;
    let constraint = constraint(r, kind)?;
    r.end();
    Ok(Some(OptionDescriptor { name, title, desc, value_type, unit, size, cap, constraint }))
}

fn constraint<'a, S: FieldSink<'a>>(r: &mut Reader<'a, '_, S>, kind: u32) -> Result<Constraint<'a>, NeedMore> {
    let constraint = match ConstraintKind::from_u32(kind) {
        Some(ConstraintKind::None) => Constraint::None,
        Some(ConstraintKind::Range) => {
            if r.word(4)? != 0 {
                return Ok(Constraint::Range(None));
            }
            r.ensure(4 * 3)?;
            r.begin(FieldId::ConstraintRange);
            let min = r.uint(FieldId::RangeMin, 4)?;
            let max = r.uint(FieldId::RangeMax, 4)?;
            let quant = r.uint(FieldId::RangeQuant, 4)?;
            r.end();
            Constraint::Range(Some(RangeConstraint { min, max, quant }))
        }
        Some(ConstraintKind::WordList) => {
            let count = r.begin_counted(FieldId::WordList)?;
            let mut words = Vec::new();
            for _ in 0..count {
                words.push(r.uint(FieldId::WordListItem, 4)?);
            }
            r.end();
            Constraint::WordList(words)
        }
        Some(ConstraintKind::StringList) => {
            let count = r.begin_counted(FieldId::StringList)?;
            let mut strings = Vec::new();
            for _ in 0..count {
                strings.push(r.text(FieldId::StringListItem, 4)?);
            }
            r.end();
            Constraint::StringList(strings)
        }
        None => Constraint::Other(kind),
    };
    Ok(constraint)
}

fn parameters<'a, S: FieldSink<'a>>(r: &mut Reader<'a, '_, S>) -> Result<Parameters, NeedMore> {
    r.ensure(4 * 6)?;
    r.begin(FieldId::Parameters);
    let parameters = Parameters {
        format: r.uint(FieldId::ParamFormat, 4)?,
        last_frame: r.boolean(FieldId::ParamLastFrame, 4)?,
        bytes_per_line: r.uint(FieldId::ParamBytesPerLine, 4)?,
        pixels_per_line: r.uint(FieldId::ParamPixelsPerLine, 4)?,
        lines: r.uint(FieldId::ParamLines, 4)?,
        depth: r.uint(FieldId::ParamDepth, 4)?,
    };
    r.end();
    Ok(parameters)
}
