// Variable-length integers used for record lengths in the compressed stream.
//
// Base-128, big-endian: most-significant group first.
// Each byte has bit 7 set except the final byte.

use std::io::{self, Write};

use thiserror::Error;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

/// Overflow guard for the 64-bit accumulator: if these bits are set before a
/// shift, the next `<< 7` would overflow.
const U64_OVERFLOW_MASK: u64 = 0xFE00_0000_0000_0000;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into the tail of `buf`.
/// Returns the number of bytes written (1..=10); the encoding occupies
/// `buf[MAX_VARINT_LEN - len..]`.
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = MAX_VARINT_LEN;
    loop {
        i -= 1;
        buf[i] = (num as u8 & 0x7F) | 0x80;
        num >>= 7;
        if num == 0 {
            break;
        }
    }
    buf[MAX_VARINT_LEN - 1] &= 0x7F; // clear MSB on last byte
    MAX_VARINT_LEN - i
}

/// Encode a `u64` and write it to a `Write` sink.
pub fn write_u64<W: Write>(w: &mut W, num: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_u64(num, &mut buf);
    w.write_all(&buf[MAX_VARINT_LEN - len..])
}

/// Encode a `usize` and write it to a `Write` sink.
pub fn write_usize<W: Write>(w: &mut W, num: usize) -> io::Result<()> {
    write_u64(w, num as u64)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `u64` from any byte iterator, e.g. one that walks across
/// segment boundaries. Returns `(value, bytes_consumed)`.
pub fn read_u64_from<I: IntoIterator<Item = u8>>(bytes: I) -> Result<(u64, usize), VarIntError> {
    let mut val: u64 = 0;
    for (i, byte) in bytes.into_iter().enumerate() {
        if val & U64_OVERFLOW_MASK != 0 {
            return Err(VarIntError::Overflow);
        }
        val = (val << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarIntError::Underflow)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encoded byte length of `num`; lets the encoder size a record before
/// writing it.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    (bits.max(1).div_ceil(7) as usize).min(MAX_VARINT_LEN)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Not enough input bytes to complete the integer.
    #[error("varint underflow (truncated input)")]
    Underflow,
    /// Value would overflow the target integer type.
    #[error("varint overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
        read_u64_from(data.iter().copied())
    }

    #[test]
    fn boundary_values() {
        let cases: &[u64] = &[0, 1, 127, 128, 16383, 16384, u32::MAX as u64, u64::MAX];
        let mut buf = [0u8; MAX_VARINT_LEN];
        for &val in cases {
            let len = encode_u64(val, &mut buf);
            let (decoded, consumed) = read_u64(&buf[MAX_VARINT_LEN - len..]).unwrap();
            assert_eq!(decoded, val, "decode failed for {val}");
            assert_eq!(consumed, len, "length mismatch for {val}");
            assert_eq!(sizeof_u64(val), len, "sizeof mismatch for {val}");
        }
    }

    #[test]
    fn encoding_is_big_endian() {
        // 300 = 0b100101100 = two groups: (10) (0101100) = 0x82 0x2C
        let mut out = Vec::new();
        write_u64(&mut out, 300).unwrap();
        assert_eq!(out, [0x82, 0x2C]);
    }

    #[test]
    fn small_lengths_take_one_byte() {
        for val in 0..=127usize {
            let mut out = Vec::new();
            write_usize(&mut out, val).unwrap();
            assert_eq!(out, [val as u8]);
        }
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let (val, len) = read_u64(&[0x81, 0x00, 0xFF, 0xFF]).unwrap();
        assert_eq!(val, 128);
        assert_eq!(len, 2);
    }

    #[test]
    fn overflow_detection() {
        let data = [0xFF; 11];
        assert_eq!(read_u64(&data), Err(VarIntError::Overflow));
    }

    #[test]
    fn underflow_detection() {
        // Truncated: all continuation bytes, no terminator.
        assert_eq!(read_u64(&[0x80, 0x80, 0x80]), Err(VarIntError::Underflow));
        assert_eq!(read_u64(&[]), Err(VarIntError::Underflow));
    }
}
