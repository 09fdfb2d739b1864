// Persisted layout of a front-coded list.
//
// All fields are big-endian:
//
//   ratio    u32
//   len      u32 (standard) | u64 (big)
//   anchors  ceil(len / ratio) offsets, u32 (standard) | u64 (big)
//   stream   raw compressed records, to the end of the input
//
// Loading checks the header and anchor table against the stream, then walks
// every block (`FrontCodedList::validate`) before handing out the list.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::codec::element::Element;
use crate::codec::encoder::FrontCodedOptions;
use crate::error::{Error, Result};
use crate::list::FrontCodedList;
use crate::storage::segmented::SegmentWriter;
use crate::storage::width::IndexWidth;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Map an early EOF to a corruption error naming the truncated part.
fn truncated(what: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::corrupt(format!("truncated {what}"))
        } else {
            Error::Io(e)
        }
    }
}

impl<T: Element, W: IndexWidth> FrontCodedList<T, W> {
    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Write the persisted form to `w`.
    pub fn write_to<Wr: Write>(&self, w: &mut Wr) -> Result<()> {
        w.write_all(&self.ratio().to_be_bytes())?;
        W::write_field(w, self.len())?;
        for &offset in self.anchors() {
            W::write_field(w, offset)?;
        }
        self.stream().write_to(w)?;
        Ok(())
    }

    /// The persisted form as one buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.stats().persisted_bytes as usize);
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Persist to a file, replacing it if it exists.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Read a persisted list, storing the stream in default-sized segments.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Self::read_from_with(r, &FrontCodedOptions::default())
    }

    /// Read a persisted list. Only `options.segment_size` is used; the ratio
    /// comes from the data.
    pub fn read_from_with<R: Read>(r: &mut R, options: &FrontCodedOptions) -> Result<Self> {
        options.validate()?;

        let mut raw = [0u8; 4];
        r.read_exact(&mut raw).map_err(truncated("header"))?;
        let ratio = u32::from_be_bytes(raw);
        if ratio == 0 {
            return Err(Error::corrupt("ratio is zero"));
        }
        let len = W::read_field(r).map_err(truncated("header"))?;
        if len > W::MAX_ENTRIES {
            return Err(Error::corrupt(format!(
                "entry count {len} exceeds the {} index width",
                W::NAME
            )));
        }

        let anchor_count = len.div_ceil(u64::from(ratio));
        // Cap the up-front allocation; a corrupt count fails on EOF instead.
        let mut anchors = Vec::with_capacity(anchor_count.min(1 << 16) as usize);
        for _ in 0..anchor_count {
            anchors.push(W::read_field(r).map_err(truncated("anchor table"))?);
        }

        let mut stream = SegmentWriter::new(options.resolved_segment_size::<W>());
        io::copy(&mut r.take(W::MAX_STREAM_LEN + 1), &mut stream)?;
        if stream.len() > W::MAX_STREAM_LEN {
            return Err(Error::corrupt("stream exceeds the index width"));
        }
        let stream = stream.finish();

        check_anchors(&anchors, stream.len())?;
        let list = Self::from_parts(ratio, len, anchors, stream);
        list.validate()?;
        log::debug!(
            "loaded {} front-coded list: {} entries, ratio {}, {} stream bytes",
            W::NAME,
            len,
            ratio,
            list.stream().len()
        );
        Ok(list)
    }

    /// Decode a list from its persisted form.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut bytes)
    }

    /// Load a list persisted with [`write_file`](Self::write_file).
    pub fn read_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(BUF_SIZE, file);
        Self::read_from(&mut reader)
    }
}

/// Anchors must start at 0, strictly increase, and lie inside the stream;
/// an empty list must have an empty stream.
fn check_anchors(anchors: &[u64], stream_len: u64) -> Result<()> {
    let Some(&first) = anchors.first() else {
        if stream_len != 0 {
            return Err(Error::corrupt(format!(
                "empty list carries {stream_len} stream bytes"
            )));
        }
        return Ok(());
    };
    if first != 0 {
        return Err(Error::corrupt(format!("first anchor at {first}, expected 0")));
    }
    if let Some(pair) = anchors.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(Error::corrupt(format!(
            "anchor offsets not increasing: {} then {}",
            pair[0], pair[1]
        )));
    }
    let last = anchors[anchors.len() - 1];
    if last >= stream_len {
        return Err(Error::corrupt(format!(
            "anchor at {last} lies outside {stream_len}-byte stream"
        )));
    }
    Ok(())
}
