use crate::codes::Opcode;
use crate::cursor::NeedMore;
use crate::field::{FieldId, FieldSink};
use crate::message::Request;

use super::{Decoded, Reader};

/// Decodes one request starting at `offset`.
///
/// The opcode word is always read first. Opcodes outside the known set
/// decode to [`Request::Unknown`] with nothing past the opcode consumed.
pub fn decode_request<'a, S: FieldSink<'a>>(
    bytes: &'a [u8],
    offset: usize,
    sink: &mut S,
) -> Result<Decoded<Request<'a>>, NeedMore> {
    let mut r = Reader::new(bytes, offset, sink);
    let code = r.uint(FieldId::RpcCode, 4)?;

    let request = match Opcode::from_u32(code) {
        Some(Opcode::Init) => {
            let version = r.version(8)?;
            let user_name = r.text(FieldId::UserName, 4)?;
            Request::Init { version, user_name }
        }
        Some(Opcode::GetDevices) => Request::GetDevices,
        Some(Opcode::Open) => Request::Open { device_name: r.text(FieldId::DeviceName, 4)? },
        Some(Opcode::ControlOption) => {
            let handle = r.uint(FieldId::Handle, 24)?;
            let option = r.uint(FieldId::OptionNum, 20)?;
            let action = r.uint(FieldId::Action, 16)?;
            let value_type = r.uint(FieldId::ValueType, 12)?;
            let value_size = r.uint(FieldId::ValueSize, 8)?;
            // Element count: consumed but not displayed.
            let element_count = r.skip_word();
            let value = r.blob(FieldId::Value, value_size as usize)?;
            Request::ControlOption { handle, option, action, value_type, element_count, value }
        }
        Some(Opcode::Authorize) => {
            let resource = r.text(FieldId::Resource, 12)?;
            let username = r.text(FieldId::Username, 8)?;
            let password = r.text(FieldId::Password, 4)?;
            Request::Authorize { resource, username, password }
        }
        Some(Opcode::Close) => Request::Close { handle: r.uint(FieldId::Handle, 4)? },
        Some(Opcode::GetOptionDescriptors) => Request::GetOptionDescriptors { handle: r.uint(FieldId::Handle, 4)? },
        Some(Opcode::GetParameters) => Request::GetParameters { handle: r.uint(FieldId::Handle, 4)? },
        Some(Opcode::Start) => Request::Start { handle: r.uint(FieldId::Handle, 4)? },
        Some(Opcode::Cancel) => Request::Cancel { handle: r.uint(FieldId::Handle, 4)? },
        Some(Opcode::Exit) => Request::Exit,
        None => Request::Unknown(code),
    };

    Ok(r.finish(request))
}
