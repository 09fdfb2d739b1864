// Element types that can be front coded.
//
// Entries are sequences of a fixed-width primitive. Each element is stored
// big-endian in `WIDTH` bytes; lengths and prefixes count elements, not bytes.

use std::fmt::Debug;
use std::io::{self, Write};

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width primitive usable as the element type of a front-coded list.
///
/// Implemented for `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `u64` and `i64`;
/// sealed, so `WIDTH` never exceeds 8.
pub trait Element: sealed::Sealed + Copy + Eq + Default + Debug + Send + Sync + 'static {
    /// Encoded size of one element in bytes.
    const WIDTH: usize;

    /// Append the big-endian encoding of `items` to `w`.
    fn write_all<W: Write>(items: &[Self], w: &mut W) -> io::Result<()>;

    /// Decode one element from exactly `WIDTH` bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;

    /// Decode every whole element in `bytes` and append it to `out`.
    /// `bytes.len()` must be a multiple of `WIDTH`.
    fn extend_from_bytes(out: &mut Vec<Self>, bytes: &[u8]) {
        debug_assert_eq!(bytes.len() % Self::WIDTH, 0);
        out.extend(bytes.chunks_exact(Self::WIDTH).map(Self::from_be_slice));
    }
}

impl sealed::Sealed for u8 {}

impl Element for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn write_all<W: Write>(items: &[Self], w: &mut W) -> io::Result<()> {
        w.write_all(items)
    }

    #[inline]
    fn from_be_slice(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn extend_from_bytes(out: &mut Vec<Self>, bytes: &[u8]) {
        out.extend_from_slice(bytes);
    }
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn write_all<W: Write>(items: &[Self], w: &mut W) -> io::Result<()> {
                for item in items {
                    w.write_all(&item.to_be_bytes())?;
                }
                Ok(())
            }

            #[inline]
            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_be_bytes(raw)
            }
        }
    )*};
}

impl_element!(i8, u16, i16, u32, i32, u64, i64);

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub fn common_prefix_len<T: Element>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
