// Record-level decoding of a front-coded stream.
//
// A `RecordReader` walks records forward from a block's anchor. Every read is
// bounds-checked against the stream; a record that points past the end, or a
// delta whose prefix is longer than its predecessor, is reported as corrupt
// rather than producing partial output.

use crate::error::{Error, Result};
use crate::storage::segmented::SegmentedBuffer;

use super::element::Element;

/// Forward reader over consecutive records starting at a stream offset.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    stream: &'a SegmentedBuffer,
    pos: u64,
}

impl<'a> RecordReader<'a> {
    pub fn new(stream: &'a SegmentedBuffer, pos: u64) -> Self {
        Self { stream, pos }
    }

    /// Stream offset of the next unread record.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn read_len(&mut self) -> Result<usize> {
        let (value, next) = self.stream.read_varint(self.pos)?;
        self.pos = next;
        usize::try_from(value)
            .map_err(|_| Error::corrupt(format!("record length {value} does not fit in memory")))
    }

    fn read_delta_header(&mut self, previous_len: usize) -> Result<(usize, usize)> {
        let suffix = self.read_len()?;
        let prefix = self.read_len()?;
        if prefix > previous_len {
            return Err(Error::corrupt(format!(
                "delta at {} shares {prefix} elements with a {previous_len}-element predecessor",
                self.pos
            )));
        }
        Ok((prefix, suffix))
    }

    // -----------------------------------------------------------------------
    // Decoding into growable buffers
    // -----------------------------------------------------------------------

    /// Decode an anchor record into `out`, replacing its contents.
    pub fn read_anchor<T: Element>(&mut self, out: &mut Vec<T>) -> Result<()> {
        let len = self.read_len()?;
        out.clear();
        self.pos = self.stream.read_elements(self.pos, len, out)?;
        Ok(())
    }

    /// Decode a delta record, turning `entry` (the predecessor) into the
    /// entry the record describes.
    pub fn read_delta_in_place<T: Element>(&mut self, entry: &mut Vec<T>) -> Result<()> {
        let (prefix, suffix) = self.read_delta_header(entry.len())?;
        entry.truncate(prefix);
        self.pos = self.stream.read_elements(self.pos, suffix, entry)?;
        Ok(())
    }

    /// Decode a delta record against `base` into `out`.
    pub fn read_delta<T: Element>(&mut self, base: &[T], out: &mut Vec<T>) -> Result<()> {
        let (prefix, suffix) = self.read_delta_header(base.len())?;
        out.clear();
        out.extend_from_slice(&base[..prefix]);
        self.pos = self.stream.read_elements(self.pos, suffix, out)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Decoding into fixed slices
    // -----------------------------------------------------------------------

    /// Decode an anchor into `dst`, keeping what fits. Returns the full
    /// entry length, which may exceed `dst.len()`.
    pub fn read_anchor_clipped<T: Element>(&mut self, dst: &mut [T]) -> Result<usize> {
        let len = self.read_len()?;
        self.pos = self.stream.read_elements_clipped(self.pos, len, dst, 0)?;
        Ok(len)
    }

    /// Decode a delta over a predecessor of `previous_len` elements already in
    /// `dst`. Elements past `dst.len()` are never needed by later entries
    /// shorter than `dst`, so dropping them is safe.
    pub fn read_delta_clipped<T: Element>(&mut self, dst: &mut [T], previous_len: usize) -> Result<usize> {
        let (prefix, suffix) = self.read_delta_header(previous_len)?;
        self.pos = self.stream.read_elements_clipped(self.pos, suffix, dst, prefix)?;
        Ok(prefix + suffix)
    }

    // -----------------------------------------------------------------------
    // Length-only replay
    // -----------------------------------------------------------------------

    /// Skip an anchor record, returning its length.
    pub fn skip_anchor<T: Element>(&mut self) -> Result<usize> {
        let len = self.read_len()?;
        self.pos = self.stream.skip_elements::<T>(self.pos, len)?;
        Ok(len)
    }

    /// Skip a delta record, returning the length of the entry it describes.
    pub fn skip_delta<T: Element>(&mut self, previous_len: usize) -> Result<usize> {
        let (prefix, suffix) = self.read_delta_header(previous_len)?;
        self.pos = self.stream.skip_elements::<T>(self.pos, suffix)?;
        prefix
            .checked_add(suffix)
            .ok_or_else(|| Error::corrupt("entry length overflows"))
    }
}
