// Front-coded list: construction and random access.
//
// Entries are grouped into blocks of `ratio` records, each starting with an
// anchor. A lookup seeks through the anchor table to the block start and
// replays at most `ratio - 1` deltas, so it never touches earlier blocks.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::decoder::RecordReader;
use crate::codec::element::Element;
use crate::codec::encoder::{Encoder, FrontCodedOptions};
use crate::cursor::{Cursor, Iter};
use crate::error::{Error, Result};
use crate::storage::segmented::SegmentedBuffer;
use crate::storage::width::{Big, IndexWidth, Standard};

/// An immutable, compressed sequence of element strings.
///
/// `T` is the element type (bytes by default) and `W` the index width:
/// [`Standard`] lists hold up to `i32::MAX` entries in one buffer, [`Big`]
/// lists up to `i64::MAX` entries spread over fixed-size segments.
///
/// Cloning is cheap: the compressed bytes and anchor table are shared.
///
/// # Example
/// ```
/// use frontcode::FrontCodedList;
///
/// let words = ["alpha", "alphabet", "alpine", "beta"];
/// let list = FrontCodedList::<u8>::build(words.iter().map(|w| w.as_bytes()), 2).unwrap();
/// assert_eq!(list.len(), 4);
/// assert_eq!(list.get(2).unwrap(), b"alpine");
/// ```
pub struct FrontCodedList<T: Element = u8, W: IndexWidth = Standard> {
    ratio: u32,
    len: u64,
    anchors: Arc<[u64]>,
    stream: SegmentedBuffer,
    _marker: PhantomData<fn() -> (T, W)>,
}

/// A front-coded list addressed by 64-bit indices over segmented storage.
pub type FrontCodedBigList<T = u8> = FrontCodedList<T, Big>;

/// Size and layout figures for a built list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
    pub width: &'static str,
    pub entries: u64,
    pub ratio: u32,
    pub anchors: u64,
    pub stream_bytes: u64,
    pub segments: usize,
    pub segment_size: usize,
    /// Size of the persisted form (header + anchor table + stream).
    pub persisted_bytes: u64,
}

impl<T: Element, W: IndexWidth> FrontCodedList<T, W> {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build a list from `entries` with anchor interval `ratio`.
    pub fn build<I, S>(entries: I, ratio: u32) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[T]>,
    {
        Self::build_with(entries, &FrontCodedOptions::with_ratio(ratio))
    }

    pub fn build_with<I, S>(entries: I, options: &FrontCodedOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[T]>,
    {
        let mut encoder = Encoder::<T, W>::new(options)?;
        for entry in entries {
            encoder.push(entry.as_ref())?;
        }
        Ok(Self::from_encoder(encoder))
    }

    /// Build a list from a fallible source, such as lines read from a file.
    ///
    /// The first source error aborts construction and is returned as
    /// [`Error::SourceFailure`] holding the original error.
    pub fn try_build<I, S, E>(entries: I, options: &FrontCodedOptions) -> Result<Self>
    where
        I: IntoIterator<Item = std::result::Result<S, E>>,
        S: AsRef<[T]>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut encoder = Encoder::<T, W>::new(options)?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::SourceFailure(e.into()))?;
            encoder.push(entry.as_ref())?;
        }
        Ok(Self::from_encoder(encoder))
    }

    fn from_encoder(encoder: Encoder<T, W>) -> Self {
        let encoded = encoder.finish();
        let list = Self::from_parts(encoded.ratio, encoded.len, encoded.anchors, encoded.stream);
        log::debug!(
            "built {} front-coded list: {} entries, ratio {}, {} stream bytes in {} segment(s)",
            W::NAME,
            list.len,
            list.ratio,
            list.stream.len(),
            list.stream.segment_count()
        );
        list
    }

    /// Assemble a list from already-checked parts.
    pub(crate) fn from_parts(ratio: u32, len: u64, anchors: Vec<u64>, stream: SegmentedBuffer) -> Self {
        Self {
            ratio,
            len,
            anchors: anchors.into(),
            stream,
            _marker: PhantomData,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Anchor interval.
    #[inline]
    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    pub(crate) fn stream(&self) -> &SegmentedBuffer {
        &self.stream
    }

    pub(crate) fn anchors(&self) -> &[u64] {
        &self.anchors
    }

    /// Stream offset of the anchor that starts `block`.
    #[inline]
    pub(crate) fn anchor_offset(&self, block: u64) -> u64 {
        self.anchors[block as usize]
    }

    pub fn stats(&self) -> ListStats {
        let field = W::FIELD_BYTES as u64;
        let anchors = self.anchors.len() as u64;
        ListStats {
            width: W::NAME,
            entries: self.len,
            ratio: self.ratio,
            anchors,
            stream_bytes: self.stream.len(),
            segments: self.stream.segment_count(),
            segment_size: self.stream.segment_size(),
            persisted_bytes: 4 + field + anchors * field + self.stream.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Random access
    // -----------------------------------------------------------------------

    fn check_index(&self, index: u64) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(Error::out_of_range(index, self.len))
        }
    }

    /// Reader positioned at the anchor of `index`'s block, plus the number
    /// of deltas to replay after it.
    fn seek(&self, index: u64) -> (RecordReader<'_>, u64) {
        let ratio = u64::from(self.ratio);
        let reader = RecordReader::new(&self.stream, self.anchor_offset(index / ratio));
        (reader, index % ratio)
    }

    /// Decode the entry at `index`.
    pub fn get(&self, index: u64) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.get_into(index, &mut out)?;
        Ok(out)
    }

    /// Decode the entry at `index` into `out`, replacing its contents and
    /// reusing its capacity. Returns the entry length.
    pub fn get_into(&self, index: u64, out: &mut Vec<T>) -> Result<usize> {
        self.check_index(index)?;
        let (mut reader, deltas) = self.seek(index);
        reader.read_anchor(out)?;
        for _ in 0..deltas {
            reader.read_delta_in_place(out)?;
        }
        Ok(out.len())
    }

    /// Decode the entry at `index` into the front of `dst` without
    /// allocating. Returns the entry length, or [`Error::BufferTooSmall`]
    /// if `dst` cannot hold it (the contents of `dst` are then unspecified).
    pub fn get_into_slice(&self, index: u64, dst: &mut [T]) -> Result<usize> {
        self.check_index(index)?;
        let (mut reader, deltas) = self.seek(index);
        let mut len = reader.read_anchor_clipped(dst)?;
        for _ in 0..deltas {
            len = reader.read_delta_clipped(dst, len)?;
        }
        if len > dst.len() {
            return Err(Error::BufferTooSmall { needed: len });
        }
        Ok(len)
    }

    /// Length of the entry at `index`, without decoding its elements.
    pub fn entry_len(&self, index: u64) -> Result<usize> {
        self.check_index(index)?;
        let (mut reader, deltas) = self.seek(index);
        let mut len = reader.skip_anchor::<T>()?;
        for _ in 0..deltas {
            len = reader.skip_delta::<T>(len)?;
        }
        Ok(len)
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Cursor positioned before the first entry.
    pub fn cursor(&self) -> Cursor<'_, T, W> {
        Cursor::unloaded(self, 0)
    }

    /// Cursor whose next entry is `from` (`from == len()` places it after
    /// the last entry). The surrounding block is decoded eagerly.
    pub fn cursor_at(&self, from: u64) -> Result<Cursor<'_, T, W>> {
        Cursor::new(self, from)
    }

    /// Double-ended iterator over owned entries.
    pub fn iter(&self) -> Iter<'_, T, W> {
        Iter::new(self)
    }

    /// Decode every entry.
    pub fn to_vec(&self) -> Result<Vec<Vec<T>>> {
        self.iter().collect()
    }

    /// Decode every entry, one rayon task per block.
    #[cfg(feature = "parallel")]
    pub fn par_to_vec(&self) -> Result<Vec<Vec<T>>> {
        use rayon::prelude::*;

        let blocks: Vec<Vec<Vec<T>>> = (0..self.anchors.len())
            .into_par_iter()
            .map(|block| self.decode_block(block))
            .collect::<Result<_>>()?;
        Ok(blocks.into_iter().flatten().collect())
    }

    #[cfg(feature = "parallel")]
    fn decode_block(&self, block: usize) -> Result<Vec<Vec<T>>> {
        let ratio = u64::from(self.ratio);
        let first = block as u64 * ratio;
        let count = ratio.min(self.len - first) as usize;
        let mut reader = RecordReader::new(&self.stream, self.anchors[block]);
        let mut entry = Vec::new();
        reader.read_anchor(&mut entry)?;
        let mut out = Vec::with_capacity(count);
        out.push(entry.clone());
        for _ in 1..count {
            reader.read_delta_in_place(&mut entry)?;
            out.push(entry.clone());
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Walk every block and check that its records decode consistently and
    /// end exactly where the next block begins.
    pub fn validate(&self) -> Result<()> {
        let ratio = u64::from(self.ratio);
        for (block, &start) in self.anchors.iter().enumerate() {
            let end = self
                .anchors
                .get(block + 1)
                .copied()
                .unwrap_or(self.stream.len());
            let first = block as u64 * ratio;
            let count = ratio.min(self.len - first);

            let mut reader = RecordReader::new(&self.stream, start);
            let mut len = reader.skip_anchor::<T>()?;
            for _ in 1..count {
                len = reader.skip_delta::<T>(len)?;
            }
            if reader.position() != end {
                return Err(Error::corrupt(format!(
                    "block {block} ends at byte {}, next block starts at {end}",
                    reader.position()
                )));
            }
        }
        Ok(())
    }
}

impl<T: Element, W: IndexWidth> Clone for FrontCodedList<T, W> {
    fn clone(&self) -> Self {
        Self {
            ratio: self.ratio,
            len: self.len,
            anchors: Arc::clone(&self.anchors),
            stream: self.stream.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Element, W: IndexWidth> fmt::Debug for FrontCodedList<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontCodedList")
            .field("width", &W::NAME)
            .field("len", &self.len)
            .field("ratio", &self.ratio)
            .field("anchors", &self.anchors.len())
            .field("stream", &self.stream)
            .finish()
    }
}

impl<'a, T: Element, W: IndexWidth> IntoIterator for &'a FrontCodedList<T, W> {
    type Item = Result<Vec<T>>;
    type IntoIter = Iter<'a, T, W>;

    fn into_iter(self) -> Iter<'a, T, W> {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
