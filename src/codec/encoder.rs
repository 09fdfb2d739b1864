// Front-coding encoder.
//
// Entries are consumed once, in order:
//   - every `ratio`-th entry is an anchor: varint(len) + elements
//   - every other entry is a delta against its predecessor:
//     varint(suffix_len) + varint(prefix_len) + suffix elements
// The stream offset of each anchor is recorded in a separate table so that
// lookups can seek straight to a block.

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::storage::segmented::{SegmentWriter, SegmentedBuffer};
use crate::storage::width::{IndexWidth, Standard};

use super::element::{Element, common_prefix_len};
use super::varint;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Anchor interval used when none is given.
pub const DEFAULT_RATIO: u32 = 4;

/// Construction options for a front-coded list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontCodedOptions {
    /// Anchor interval (k). Larger values compress better but slow down
    /// random access. Must be at least 1.
    pub ratio: u32,
    /// Capacity of each storage segment in bytes. `None` uses the index
    /// width's default: one buffer for standard lists, 128 MiB segments for
    /// big lists.
    pub segment_size: Option<usize>,
}

impl Default for FrontCodedOptions {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            segment_size: None,
        }
    }
}

impl FrontCodedOptions {
    pub fn with_ratio(ratio: u32) -> Self {
        Self {
            ratio,
            ..Default::default()
        }
    }

    pub fn segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = Some(segment_size);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.ratio == 0 {
            return Err(Error::InvalidConfiguration(
                "ratio must be at least 1".into(),
            ));
        }
        if self.segment_size == Some(0) {
            return Err(Error::InvalidConfiguration(
                "segment size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn resolved_segment_size<W: IndexWidth>(&self) -> usize {
        self.segment_size.unwrap_or(W::DEFAULT_SEGMENT_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Output of a finished encoder.
#[derive(Debug)]
pub struct Encoded {
    pub stream: SegmentedBuffer,
    pub anchors: Vec<u64>,
    pub len: u64,
    pub ratio: u32,
}

/// Incremental front-coding encoder.
///
/// # Example
/// ```
/// use frontcode::codec::encoder::{Encoder, FrontCodedOptions};
/// use frontcode::Standard;
///
/// let mut enc = Encoder::<u8, Standard>::new(&FrontCodedOptions::with_ratio(2)).unwrap();
/// enc.push(b"apple").unwrap();
/// enc.push(b"apply").unwrap();
/// let encoded = enc.finish();
/// assert_eq!(encoded.len, 2);
/// assert_eq!(encoded.anchors, [0]);
/// ```
#[derive(Debug)]
pub struct Encoder<T: Element, W: IndexWidth = Standard> {
    ratio: u32,
    stream: SegmentWriter,
    anchors: Vec<u64>,
    previous: Vec<T>,
    count: u64,
    _width: PhantomData<W>,
}

impl<T: Element, W: IndexWidth> Encoder<T, W> {
    pub fn new(options: &FrontCodedOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            ratio: options.ratio,
            stream: SegmentWriter::new(options.resolved_segment_size::<W>()),
            anchors: Vec::new(),
            previous: Vec::new(),
            count: 0,
            _width: PhantomData,
        })
    }

    /// Append the next entry.
    ///
    /// Limits are checked before anything is written, so a rejected entry
    /// leaves the encoder unchanged.
    pub fn push(&mut self, entry: &[T]) -> Result<()> {
        if self.count >= W::MAX_ENTRIES {
            return Err(Error::CapacityExceeded(
                "entry count exceeds the index width",
            ));
        }

        let anchor = self.count % u64::from(self.ratio) == 0;
        let common = if anchor {
            0
        } else {
            common_prefix_len(&self.previous, entry)
        };
        let suffix = &entry[common..];

        let mut header = varint::sizeof_u64(suffix.len() as u64) as u64;
        if !anchor {
            header += varint::sizeof_u64(common as u64) as u64;
        }
        let fits = (suffix.len() as u64)
            .checked_mul(T::WIDTH as u64)
            .and_then(|body| body.checked_add(header))
            .and_then(|record| record.checked_add(self.stream.len()))
            .is_some_and(|end| end <= W::MAX_STREAM_LEN);
        if !fits {
            return Err(Error::CapacityExceeded(
                "compressed stream exceeds the index width",
            ));
        }

        if anchor {
            self.anchors.push(self.stream.len());
            varint::write_usize(&mut self.stream, entry.len())?;
        } else {
            varint::write_usize(&mut self.stream, suffix.len())?;
            varint::write_usize(&mut self.stream, common)?;
        }
        T::write_all(suffix, &mut self.stream)?;

        // The predecessor only matters if the next entry is a delta.
        if self.ratio > 1 {
            self.previous.clear();
            self.previous.extend_from_slice(entry);
        }
        self.count += 1;
        Ok(())
    }

    pub fn finish(self) -> Encoded {
        Encoded {
            stream: self.stream.finish(),
            anchors: self.anchors,
            len: self.count,
            ratio: self.ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::width::Big;

    fn encode(entries: &[&[u8]], ratio: u32) -> Encoded {
        let mut enc = Encoder::<u8, Standard>::new(&FrontCodedOptions::with_ratio(ratio)).unwrap();
        for e in entries {
            enc.push(e).unwrap();
        }
        enc.finish()
    }

    #[test]
    fn zero_ratio_is_rejected() {
        let err = Encoder::<u8, Standard>::new(&FrontCodedOptions::with_ratio(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_segment_size_is_rejected() {
        let opts = FrontCodedOptions::default().segment_size(0);
        assert!(matches!(
            Encoder::<u8, Big>::new(&opts),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn anchor_and_delta_records() {
        let enc = encode(&[&[1, 2, 3], &[1, 2, 4], &[9]], 2);
        assert_eq!(enc.len, 3);
        // anchor [1,2,3] | delta suffix=1 prefix=2 [4] | anchor [9]
        assert_eq!(enc.stream.to_vec(), [3, 1, 2, 3, 1, 2, 4, 1, 9]);
        assert_eq!(enc.anchors, [0, 7]);
    }

    #[test]
    fn ratio_one_stores_every_entry_verbatim() {
        let enc = encode(&[b"ab", b"ab", b""], 1);
        assert_eq!(enc.stream.to_vec(), [2, b'a', b'b', 2, b'a', b'b', 0]);
        assert_eq!(enc.anchors, [0, 3, 6]);
    }

    #[test]
    fn empty_entries_encode_uniformly() {
        let enc = encode(&[b"", b"", b"x", b""], 4);
        assert_eq!(enc.stream.to_vec(), [0, 0, 0, 1, 0, b'x', 0, 0]);
    }

    #[test]
    fn duplicates_cost_two_bytes() {
        let enc = encode(&[b"same-entry", b"same-entry"], 8);
        assert_eq!(enc.stream.len(), 11 + 2);
    }

    #[test]
    fn wide_elements_count_prefix_in_elements() {
        let mut enc = Encoder::<u16, Standard>::new(&FrontCodedOptions::with_ratio(4)).unwrap();
        enc.push(&[0x0101, 0x0202]).unwrap();
        enc.push(&[0x0101, 0x0303]).unwrap();
        let encoded = enc.finish();
        assert_eq!(
            encoded.stream.to_vec(),
            [2, 1, 1, 2, 2, 1, 1, 3, 3]
        );
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct Tiny;

    impl IndexWidth for Tiny {
        const NAME: &'static str = "tiny";
        const MAX_ENTRIES: u64 = 4;
        const MAX_STREAM_LEN: u64 = 12;
        const DEFAULT_SEGMENT_SIZE: usize = 5;
        const FIELD_BYTES: usize = 1;

        fn write_field<Wr: std::io::Write>(w: &mut Wr, value: u64) -> std::io::Result<()> {
            w.write_all(&[value as u8])
        }

        fn read_field<R: std::io::Read>(r: &mut R) -> std::io::Result<u64> {
            let mut b = [0u8; 1];
            r.read_exact(&mut b)?;
            Ok(u64::from(b[0]))
        }
    }

    #[test]
    fn rejected_entry_leaves_encoder_unchanged() {
        let mut enc = Encoder::<u8, Tiny>::new(&FrontCodedOptions::with_ratio(2)).unwrap();
        enc.push(b"abcd").unwrap(); // anchor, 5 bytes
        // delta: 1 + 1 + 8 = 10 bytes, stream would reach 15
        assert!(matches!(
            enc.push(b"abzzzzzzzz"),
            Err(Error::CapacityExceeded(_))
        ));
        enc.push(b"abcdef").unwrap(); // delta, 4 bytes -> 9
        enc.push(b"xy").unwrap(); // anchor, 3 bytes -> exactly 12
        assert!(matches!(enc.push(b""), Err(Error::CapacityExceeded(_))));

        let encoded = enc.finish();
        assert_eq!(encoded.len, 3);
        assert_eq!(encoded.anchors, [0, 9]);
        assert_eq!(
            encoded.stream.to_vec(),
            [4, b'a', b'b', b'c', b'd', 2, 4, b'e', b'f', 2, b'x', b'y']
        );
    }

    #[test]
    fn entry_count_limit() {
        let mut enc = Encoder::<u8, Tiny>::new(&FrontCodedOptions::with_ratio(8)).unwrap();
        for _ in 0..4 {
            enc.push(b"").unwrap();
        }
        assert!(matches!(enc.push(b""), Err(Error::CapacityExceeded(_))));
        let encoded = enc.finish();
        assert_eq!(encoded.len, 4);
        assert_eq!(encoded.stream.len(), 1 + 3 * 2);
    }

    #[test]
    fn small_segments_split_the_stream() {
        let mut enc = Encoder::<u8, Big>::new(&FrontCodedOptions::with_ratio(3).segment_size(4)).unwrap();
        for e in [b"abcdef".as_slice(), b"abcxyz", b"q"] {
            enc.push(e).unwrap();
        }
        let encoded = enc.finish();
        assert_eq!(encoded.stream.segment_size(), 4);
        assert_eq!(encoded.stream.segment_count(), encoded.stream.len().div_ceil(4) as usize);
    }
}
