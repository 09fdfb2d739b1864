// Index widths: the only difference between standard and big lists.

use std::fmt::Debug;
use std::io::{self, Read, Write};

/// Compile-time limits and persisted field widths for a list variant.
pub trait IndexWidth: Copy + Debug + Default + Send + Sync + 'static {
    /// Short name used in logs and stats.
    const NAME: &'static str;
    /// Maximum number of entries.
    const MAX_ENTRIES: u64;
    /// Maximum compressed stream length in bytes.
    const MAX_STREAM_LEN: u64;
    /// Segment size used when the options leave it unset.
    const DEFAULT_SEGMENT_SIZE: usize;
    /// Byte width of the persisted entry count and of each anchor offset.
    const FIELD_BYTES: usize;

    /// Write a count or offset at this width (big-endian).
    fn write_field<W: Write>(w: &mut W, value: u64) -> io::Result<()>;

    /// Read a count or offset at this width (big-endian).
    fn read_field<R: Read>(r: &mut R) -> io::Result<u64>;
}

/// Lists addressable by a signed 32-bit index, stored in a single buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standard;

/// Lists addressable by a signed 64-bit index, stored across many segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Big;

/// Big-list segment size (128 MiB).
pub const BIG_SEGMENT_SIZE: usize = 1 << 27;

impl IndexWidth for Standard {
    const NAME: &'static str = "standard";
    const MAX_ENTRIES: u64 = i32::MAX as u64;
    const MAX_STREAM_LEN: u64 = i32::MAX as u64;
    const DEFAULT_SEGMENT_SIZE: usize = i32::MAX as usize;
    const FIELD_BYTES: usize = 4;

    fn write_field<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
        let value = u32::try_from(value)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "value exceeds 32 bits"))?;
        w.write_all(&value.to_be_bytes())
    }

    fn read_field<R: Read>(r: &mut R) -> io::Result<u64> {
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf)?;
        Ok(u64::from(u32::from_be_bytes(buf)))
    }
}

impl IndexWidth for Big {
    const NAME: &'static str = "big";
    const MAX_ENTRIES: u64 = i64::MAX as u64;
    const MAX_STREAM_LEN: u64 = i64::MAX as u64;
    const DEFAULT_SEGMENT_SIZE: usize = BIG_SEGMENT_SIZE;
    const FIELD_BYTES: usize = 8;

    fn write_field<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
        w.write_all(&value.to_be_bytes())
    }

    fn read_field<R: Read>(r: &mut R) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }
}
