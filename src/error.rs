// Error type shared by the encoder, lookup paths, cursors and persistence.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::codec::varint::VarIntError;

/// Errors produced by front-coded list construction, lookup and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// An index (or cursor move) fell outside `0..len`. `index` is `None`
    /// when a cursor tried to step back from the front (position -1).
    #[error("index {} out of range for list of {len} entries", DisplayIndex(.index))]
    IndexOutOfRange { index: Option<u64>, len: u64 },

    /// Construction options were rejected (ratio 0, segment size 0, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The list would exceed the entry count or stream size of its index width.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),

    /// The entry source failed during construction. The original error is kept.
    #[error("entry source failed: {0}")]
    SourceFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persisted or decoded data is structurally inconsistent.
    #[error("corrupt persisted data: {0}")]
    CorruptPersistedData(String),

    /// A caller-supplied slice is shorter than the entry being copied into it.
    #[error("buffer too small: entry needs {needed} elements")]
    BufferTooSmall { needed: usize },

    /// Underlying reader/writer error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn out_of_range(index: u64, len: u64) -> Self {
        Self::IndexOutOfRange {
            index: Some(index),
            len,
        }
    }

    pub(crate) fn before_start(len: u64) -> Self {
        Self::IndexOutOfRange { index: None, len }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptPersistedData(msg.into())
    }

    /// Recover the original source error of a failed construction.
    pub fn into_source_failure(self) -> Option<Box<dyn std::error::Error + Send + Sync>> {
        match self {
            Self::SourceFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VarIntError> for Error {
    fn from(e: VarIntError) -> Self {
        Self::CorruptPersistedData(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

struct DisplayIndex<'a>(&'a Option<u64>);

impl fmt::Display for DisplayIndex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Some(index) => write!(f, "{index}"),
            None => f.write_str("-1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reports_the_full_index() {
        let err = Error::out_of_range(u64::MAX, 3);
        assert_eq!(
            err.to_string(),
            format!("index {} out of range for list of 3 entries", u64::MAX)
        );
        assert!(matches!(err, Error::IndexOutOfRange { index: Some(u64::MAX), len: 3 }));
    }

    #[test]
    fn before_start_reads_as_minus_one() {
        let err = Error::before_start(0);
        assert_eq!(err.to_string(), "index -1 out of range for list of 0 entries");
    }
}
