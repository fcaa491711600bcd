//! Message grammar for both directions of the protocol.
//!
//! Decoding emits fields into a [`FieldSink`] as they are read and returns
//! the typed message alongside. A short read anywhere, however deeply
//! nested, abandons the whole message with [`NeedMore`] addressed at the
//! message start. Fields already emitted for the abandoned attempt are the
//! sink owner's to discard or keep.

use crate::cursor::{Cursor, NeedMore};
use crate::field::{FieldId, FieldSink, FieldValue};
use crate::message::{Text, VersionCode};

mod request;
mod response;

#[cfg(test)]
mod tests;

pub use request::decode_request;
pub use response::decode_reply;

/// A fully decoded message and the offset just past its last field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub end: usize,
}

/// Cursor that reports every field it reads to a sink.
///
/// The `lookahead` argument on each read is the minimum number of bytes
/// that must remain before the read is attempted. It is at least the width
/// of the read itself and sometimes covers the rest of a fixed-size run.
pub(crate) struct Reader<'a, 's, S> {
    cursor: Cursor<'a>,
    sink: &'s mut S,
}

impl<'a, 's, S: FieldSink<'a>> Reader<'a, 's, S> {
    pub(crate) fn new(bytes: &'a [u8], offset: usize, sink: &'s mut S) -> Self {
        Self { cursor: Cursor::new(bytes, offset), sink }
    }

    pub(crate) fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub(crate) fn ensure(&self, needed: usize) -> Result<(), NeedMore> {
        self.cursor.ensure(needed)
    }

    /// Reads a word without emitting it: lengths, counts and placeholders.
    pub(crate) fn word(&mut self, lookahead: usize) -> Result<u32, NeedMore> {
        self.cursor.u32(lookahead)
    }

    /// Consumes a word already covered by an earlier look-ahead check.
    pub(crate) fn skip_word(&mut self) -> u32 {
        let value = self.cursor.peek_u32_at(self.cursor.offset());
        self.cursor.skip(4);
        value
    }

    pub(crate) fn uint(&mut self, id: FieldId, lookahead: usize) -> Result<u32, NeedMore> {
        let start = self.cursor.offset();
        let value = self.cursor.u32(lookahead)?;
        self.sink.add(id, start..start + 4, FieldValue::U32(value));
        Ok(value)
    }

    pub(crate) fn boolean(&mut self, id: FieldId, lookahead: usize) -> Result<bool, NeedMore> {
        let start = self.cursor.offset();
        let value = self.cursor.u32(lookahead)? != 0;
        self.sink.add(id, start..start + 4, FieldValue::Bool(value));
        Ok(value)
    }

    /// Reads a length word (checked against `lookahead`) and the text it
    /// describes.
    pub(crate) fn text(&mut self, id: FieldId, lookahead: usize) -> Result<Text<'a>, NeedMore> {
        let len = self.word(lookahead)? as usize;
        let start = self.cursor.offset();
        let bytes = self.cursor.take(len)?;
        self.sink.add(id, start..start + len, FieldValue::Str(bytes));
        Ok(Text(bytes))
    }

    pub(crate) fn blob(&mut self, id: FieldId, len: usize) -> Result<&'a [u8], NeedMore> {
        let start = self.cursor.offset();
        let bytes = self.cursor.take(len)?;
        self.sink.add(id, start..start + len, FieldValue::Bytes(bytes));
        Ok(bytes)
    }

    /// Version code word with its major, minor and build sub-fields.
    pub(crate) fn version(&mut self, lookahead: usize) -> Result<VersionCode, NeedMore> {
        let start = self.cursor.offset();
        let word = self.cursor.u32(lookahead)?;
        let version = VersionCode::from_word(word);
        self.sink.begin(FieldId::VersionCode, start, FieldValue::U32(word));
        self.sink.add(FieldId::VersionMajor, start..start + 1, FieldValue::U8(version.major));
        self.sink.add(FieldId::VersionMinor, start + 1..start + 2, FieldValue::U8(version.minor));
        self.sink.add(FieldId::VersionBuild, start + 2..start + 4, FieldValue::U16(version.build));
        self.sink.end(start + 4);
        Ok(version)
    }

    /// Opens a group at the current offset.
    pub(crate) fn begin(&mut self, id: FieldId) {
        self.sink.begin(id, self.cursor.offset(), FieldValue::None);
    }

    /// Reads a count word and opens a group headed by it.
    pub(crate) fn begin_counted(&mut self, id: FieldId) -> Result<u32, NeedMore> {
        let start = self.cursor.offset();
        let count = self.cursor.u32(4)?;
        self.sink.begin(id, start, FieldValue::U32(count));
        Ok(count)
    }

    /// Closes the innermost group at the current offset.
    pub(crate) fn end(&mut self) {
        self.sink.end(self.cursor.offset());
    }

    pub(crate) fn finish<T>(self, value: T) -> Decoded<T> {
        Decoded { value, end: self.cursor.offset() }
    }
}
