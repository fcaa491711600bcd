//! Bounds checking and big-endian reads over a single message attempt.
//!
//! Every read is preceded by an availability check against the total length
//! of the delivered range. A failed check never reports the current offset:
//! it reports the checkpoint captured when the top-level message decode
//! began, because the grammar has no way to resume from the middle of a
//! message.

/// Signal to the stream layer that the current message could not be decoded
/// with the bytes delivered so far.
///
/// The caller is expected to buffer at least `additional` more bytes and
/// redeliver the message starting at `resume_from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeedMore {
    /// Offset of the first byte of the message being decoded.
    pub resume_from: usize,
    /// Minimum number of bytes missing for the check that failed.
    pub additional: usize,
}

/// Result of [`ensure_available`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    NeedMore(NeedMore),
}

/// Checks whether `needed` bytes remain after `offset` in a range of
/// `total_len` bytes.
///
/// # Examples
///
/// ```
/// use sanetrace_proto::cursor::{Availability, NeedMore, ensure_available};
///
/// assert_eq!(ensure_available(16, 8, 0, 8), Availability::Available);
/// assert_eq!(
///     ensure_available(16, 12, 0, 8),
///     Availability::NeedMore(NeedMore { resume_from: 0, additional: 4 })
/// );
/// ```
pub fn ensure_available(total_len: usize, offset: usize, checkpoint: usize, needed: usize) -> Availability {
    let have = total_len.saturating_sub(offset);
    if needed > have {
        return Availability::NeedMore(NeedMore { resume_from: checkpoint, additional: needed - have });
    }
    Availability::Available
}

/// Read position within one delivered message range.
///
/// The checkpoint is fixed at construction and passed unchanged through
/// every nested check. Every public read is bounds checked; the unchecked
/// helpers stay inside the crate.
///
/// ```compile_fail
/// let mut cursor = sanetrace_proto::cursor::Cursor::new(&[0, 0, 0, 1], 0);
/// cursor.skip(8);
/// ```
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    checkpoint: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor whose checkpoint is the starting offset.
    pub fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset, checkpoint: offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Fails unless at least `needed` bytes remain.
    ///
    /// `needed` may exceed the width of the next read; some productions
    /// check for the minimum size of everything that follows.
    pub fn ensure(&self, needed: usize) -> Result<(), NeedMore> {
        match ensure_available(self.bytes.len(), self.offset, self.checkpoint, needed) {
            Availability::Available => Ok(()),
            Availability::NeedMore(need) => Err(need),
        }
    }

    /// Reads a big-endian `u32` at the current offset after checking that
    /// `lookahead` bytes are available.
    pub fn u32(&mut self, lookahead: usize) -> Result<u32, NeedMore> {
        self.ensure(lookahead.max(4))?;
        let value = self.peek_u32_at(self.offset);
        self.offset += 4;
        Ok(value)
    }

    /// Reads a big-endian `u32` at `offset` without moving the cursor.
    ///
    /// The caller must have checked availability already.
    pub(crate) fn peek_u32_at(&self, offset: usize) -> u32 {
        let b = &self.bytes[offset..offset + 4];
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Consumes `len` raw bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], NeedMore> {
        self.ensure(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..self.offset])
    }

    /// Advances past `len` bytes that were already covered by an earlier
    /// look-ahead check.
    pub(crate) fn skip(&mut self, len: usize) {
        self.offset += len;
    }
}
