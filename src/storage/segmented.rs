// Segmented byte storage for compressed streams.
//
// A logical stream offset maps to (offset / segment_size, offset % segment_size).
// All reads go through `Chunks`, which yields the contiguous pieces of a byte
// range, so varints and element runs that straddle a seam are stitched
// without the caller noticing.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::codec::element::Element;
use crate::codec::varint;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// SegmentedBuffer
// ---------------------------------------------------------------------------

/// Immutable byte stream split into fixed-capacity segments.
///
/// Every segment except the last holds exactly `segment_size` bytes.
/// Cloning shares the segments.
#[derive(Clone)]
pub struct SegmentedBuffer {
    segments: Arc<[Box<[u8]>]>,
    segment_size: usize,
    len: u64,
}

impl SegmentedBuffer {
    /// Total stream length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    fn locate(&self, pos: u64) -> (usize, usize) {
        let size = self.segment_size as u64;
        ((pos / size) as usize, (pos % size) as usize)
    }

    /// Contiguous pieces covering `[pos, pos + len)`.
    pub fn chunks(&self, pos: u64, len: u64) -> Result<Chunks<'_>> {
        let end = pos
            .checked_add(len)
            .filter(|&end| end <= self.len)
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "range {pos}+{len} extends past end of {}-byte stream",
                    self.len
                ))
            })?;
        let (segment, offset) = self.locate(pos);
        Ok(Chunks {
            buf: self,
            segment,
            offset,
            remaining: end - pos,
        })
    }

    /// Decode a varint at `pos`; returns the value and the offset just past it.
    pub fn read_varint(&self, pos: u64) -> Result<(u64, u64)> {
        let rest = self.len.saturating_sub(pos);
        let bytes = self.chunks(pos, rest)?.flat_map(|c| c.iter().copied());
        let (value, used) = varint::read_u64_from(bytes)?;
        Ok((value, pos + used as u64))
    }

    /// Decode `count` elements at `pos`, appending them to `out`.
    /// Returns the offset just past the run.
    pub fn read_elements<T: Element>(&self, pos: u64, count: usize, out: &mut Vec<T>) -> Result<u64> {
        self.skip_elements::<T>(pos, count)?;
        out.reserve(count);
        self.visit_elements::<T, _>(pos, count, |run| T::extend_from_bytes(out, run))
    }

    /// Decode `count` elements at `pos` into `dst` starting at `at`, dropping
    /// elements that fall past the end of `dst`.
    /// Returns the offset just past the run.
    pub fn read_elements_clipped<T: Element>(
        &self,
        pos: u64,
        count: usize,
        dst: &mut [T],
        mut at: usize,
    ) -> Result<u64> {
        self.visit_elements::<T, _>(pos, count, |run| {
            for raw in run.chunks_exact(T::WIDTH) {
                if let Some(slot) = dst.get_mut(at) {
                    *slot = T::from_be_slice(raw);
                }
                at += 1;
            }
        })
    }

    /// Offset just past `count` elements starting at `pos`, bounds-checked.
    pub fn skip_elements<T: Element>(&self, pos: u64, count: usize) -> Result<u64> {
        let bytes = Self::run_bytes::<T>(count)?;
        pos.checked_add(bytes)
            .filter(|&end| end <= self.len)
            .ok_or_else(|| Error::corrupt(format!("element run at {pos} extends past end of stream")))
    }

    fn run_bytes<T: Element>(count: usize) -> Result<u64> {
        (count as u64)
            .checked_mul(T::WIDTH as u64)
            .ok_or_else(|| Error::corrupt(format!("element run of {count} overflows")))
    }

    /// Hand `f` byte runs holding whole elements only; an element split by a
    /// seam is reassembled in a scratch buffer first.
    fn visit_elements<T: Element, F: FnMut(&[u8])>(&self, pos: u64, count: usize, mut f: F) -> Result<u64> {
        let bytes = Self::run_bytes::<T>(count)?;
        let mut carry = [0u8; 8];
        let mut carried = 0usize;
        for mut chunk in self.chunks(pos, bytes)? {
            if carried > 0 {
                let take = (T::WIDTH - carried).min(chunk.len());
                carry[carried..carried + take].copy_from_slice(&chunk[..take]);
                carried += take;
                chunk = &chunk[take..];
                if carried == T::WIDTH {
                    f(&carry[..T::WIDTH]);
                    carried = 0;
                }
            }
            let whole = chunk.len() - chunk.len() % T::WIDTH;
            if whole > 0 {
                f(&chunk[..whole]);
            }
            let rest = &chunk[whole..];
            if !rest.is_empty() {
                carry[..rest.len()].copy_from_slice(rest);
                carried = rest.len();
            }
        }
        Ok(pos + bytes)
    }

    /// Write the whole stream to `w`, segment by segment.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for segment in self.segments.iter() {
            w.write_all(segment)?;
        }
        Ok(())
    }

    /// Copy the whole stream into one contiguous buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len as usize);
        for segment in self.segments.iter() {
            out.extend_from_slice(segment);
        }
        out
    }
}

impl fmt::Debug for SegmentedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedBuffer")
            .field("len", &self.len)
            .field("segment_size", &self.segment_size)
            .field("segments", &self.segments.len())
            .finish()
    }
}

/// Iterator over the contiguous pieces of a stream range.
pub struct Chunks<'a> {
    buf: &'a SegmentedBuffer,
    segment: usize,
    offset: usize,
    remaining: u64,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.remaining == 0 {
            return None;
        }
        let segment = &self.buf.segments[self.segment];
        let available = segment.len() - self.offset;
        let take = (available as u64).min(self.remaining) as usize;
        let piece = &segment[self.offset..self.offset + take];
        self.remaining -= take as u64;
        self.segment += 1;
        self.offset = 0;
        Some(piece)
    }
}

// ---------------------------------------------------------------------------
// SegmentWriter
// ---------------------------------------------------------------------------

/// Append-only builder for a `SegmentedBuffer`.
///
/// Seals the current segment whenever it reaches `segment_size`, so no
/// segment ever needs to grow past that capacity.
#[derive(Debug)]
pub struct SegmentWriter {
    sealed: Vec<Box<[u8]>>,
    current: Vec<u8>,
    segment_size: usize,
    len: u64,
}

impl SegmentWriter {
    /// `segment_size` must be non-zero.
    pub fn new(segment_size: usize) -> Self {
        debug_assert!(segment_size > 0);
        Self {
            sealed: Vec::new(),
            current: Vec::new(),
            segment_size,
            len: 0,
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(mut self) -> SegmentedBuffer {
        if !self.current.is_empty() {
            self.sealed.push(self.current.into_boxed_slice());
        }
        SegmentedBuffer {
            segments: self.sealed.into(),
            segment_size: self.segment_size,
            len: self.len,
        }
    }
}

impl Write for SegmentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.segment_size - self.current.len();
        let n = room.min(buf.len());
        self.current.extend_from_slice(&buf[..n]);
        self.len += n as u64;
        if self.current.len() == self.segment_size {
            let full = std::mem::take(&mut self.current);
            self.sealed.push(full.into_boxed_slice());
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(data: &[u8], segment_size: usize) -> SegmentedBuffer {
        let mut w = SegmentWriter::new(segment_size);
        w.write_all(data).unwrap();
        w.finish()
    }

    #[test]
    fn writer_seals_full_segments() {
        let buf = buffer(&[0u8; 10], 4);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.segment_count(), 3);
        assert_eq!(buffer(&[0u8; 8], 4).segment_count(), 2);
        assert_eq!(buffer(&[], 4).segment_count(), 0);
    }

    #[test]
    fn byte_addressing_matches_flat_layout() {
        let data: Vec<u8> = (0..=99).collect();
        let buf = buffer(&data, 7);
        for (i, &b) in data.iter().enumerate() {
            let piece: Vec<&[u8]> = buf.chunks(i as u64, 1).unwrap().collect();
            assert_eq!(piece, [&[b][..]]);
        }
        assert!(buf.chunks(100, 1).is_err());
        assert_eq!(buf.to_vec(), data);
    }

    #[test]
    fn chunks_stitch_across_seams() {
        let data: Vec<u8> = (0..20).collect();
        let buf = buffer(&data, 6);
        let pieces: Vec<&[u8]> = buf.chunks(4, 10).unwrap().collect();
        assert_eq!(pieces, [&data[4..6], &data[6..12], &data[12..14]]);
        assert!(buf.chunks(15, 6).is_err());
        assert_eq!(buf.chunks(20, 0).unwrap().count(), 0);
    }

    #[test]
    fn varint_straddling_a_seam() {
        let mut raw = vec![0xAA, 0xBB];
        varint::write_u64(&mut raw, 1 << 40).unwrap();
        raw.push(0x05);
        let buf = buffer(&raw, 3);
        let (value, next) = buf.read_varint(2).unwrap();
        assert_eq!(value, 1 << 40);
        assert_eq!(buf.read_varint(next).unwrap(), (5, raw.len() as u64));
    }

    #[test]
    fn truncated_varint_is_corrupt() {
        let buf = buffer(&[0x80, 0x80], 1);
        assert!(matches!(buf.read_varint(0), Err(Error::CorruptPersistedData(_))));
        assert!(buf.read_varint(5).is_err());
    }

    #[test]
    fn wide_elements_straddling_seams() {
        let values: Vec<u32> = vec![0xDEAD_BEEF, 1, 0x0102_0304, u32::MAX];
        let mut raw = vec![0xFF];
        u32::write_all(&values, &mut raw).unwrap();
        for segment_size in 1..=9 {
            let buf = buffer(&raw, segment_size);
            let mut out = Vec::new();
            let end = buf.read_elements::<u32>(1, values.len(), &mut out).unwrap();
            assert_eq!(out, values, "segment size {segment_size}");
            assert_eq!(end, raw.len() as u64);
        }
    }

    #[test]
    fn clipped_reads_drop_overflow() {
        let buf = buffer(&[1, 2, 3, 4, 5], 2);
        let mut dst = [0u8; 3];
        let end = buf.read_elements_clipped::<u8>(0, 5, &mut dst, 1).unwrap();
        assert_eq!(dst, [0, 1, 2]);
        assert_eq!(end, 5);
    }

    #[test]
    fn skip_is_bounds_checked() {
        let buf = buffer(&[0u8; 16], 5);
        assert_eq!(buf.skip_elements::<u32>(4, 3).unwrap(), 16);
        assert!(buf.skip_elements::<u32>(4, 4).is_err());
        assert!(buf.skip_elements::<u64>(0, usize::MAX).is_err());
    }
}
