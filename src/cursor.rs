// Bidirectional cursors over a front-coded list.
//
// Deltas only point backwards (each entry is coded against its predecessor),
// so stepping forward is cheap once the predecessor is known, while stepping
// backward past what has been decoded needs a replay from the block anchor.
//
// A cursor keeps two decoded entries in slots keyed by index parity, which
// means an entry and its predecessor never evict each other:
//   - target already in its slot          -> no decoding
//   - target is an anchor                 -> read the anchor record
//   - predecessor in the other slot       -> apply one delta
//   - otherwise                           -> replay from the anchor, O(ratio)
// Alternating next/previous therefore costs nothing after the first step, and
// a backward walk replays once per two entries.

use std::iter::FusedIterator;

use crate::codec::decoder::RecordReader;
use crate::codec::element::Element;
use crate::error::{Error, Result};
use crate::list::FrontCodedList;
use crate::storage::width::IndexWidth;

#[derive(Debug)]
struct Slot<T> {
    /// Index of the entry held in `data`, if any.
    index: Option<u64>,
    /// Stream offset just past the entry's record.
    end: u64,
    data: Vec<T>,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            index: None,
            end: 0,
            data: Vec::new(),
        }
    }
}

#[inline]
fn parity(index: u64) -> usize {
    (index & 1) as usize
}

/// Split the slots into (predecessor, target) for a target of parity `out`.
fn split<T>(slots: &mut [Slot<T>; 2], out: usize) -> (&Slot<T>, &mut Slot<T>) {
    let [even, odd] = slots;
    if out == 0 { (&*odd, even) } else { (&*even, odd) }
}

/// Stateful position over a list, between entries.
///
/// `next_index()` ranges over `0..=len`; entries returned by
/// [`next_entry`](Self::next_entry) and
/// [`previous_entry`](Self::previous_entry) borrow the cursor's own storage
/// and stay valid until the next move.
///
/// A cursor is cheap to create and owns all of its state, so any number of
/// cursors may walk the same list concurrently.
#[derive(Debug)]
pub struct Cursor<'a, T: Element, W: IndexWidth> {
    list: &'a FrontCodedList<T, W>,
    next_index: u64,
    slots: [Slot<T>; 2],
}

impl<'a, T: Element, W: IndexWidth> Cursor<'a, T, W> {
    /// Cursor at `from`, with the entries around it decoded up front.
    pub(crate) fn new(list: &'a FrontCodedList<T, W>, from: u64) -> Result<Self> {
        if from > list.len() {
            return Err(Error::out_of_range(from, list.len()));
        }
        let mut cursor = Self::unloaded(list, from);
        if !list.is_empty() {
            cursor.load(from.min(list.len() - 1))?;
        }
        Ok(cursor)
    }

    /// Cursor at `from` that decodes nothing until it first moves.
    pub(crate) fn unloaded(list: &'a FrontCodedList<T, W>, from: u64) -> Self {
        debug_assert!(from <= list.len());
        Self {
            list,
            next_index: from,
            slots: [Slot::empty(), Slot::empty()],
        }
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.next_index < self.list.len()
    }

    #[inline]
    pub fn has_previous(&self) -> bool {
        self.next_index > 0
    }

    /// Index of the entry the next call to `next_entry` returns
    /// (`len()` at the end).
    #[inline]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Index of the entry the next call to `previous_entry` returns, or
    /// `None` at the front.
    #[inline]
    pub fn previous_index(&self) -> Option<u64> {
        self.next_index.checked_sub(1)
    }

    /// Step forward and return the entry stepped over.
    pub fn next_entry(&mut self) -> Result<&[T]> {
        if !self.has_next() {
            return Err(Error::out_of_range(self.next_index, self.list.len()));
        }
        let target = self.next_index;
        self.ensure(target)?;
        self.next_index += 1;
        Ok(self.slots[parity(target)].data.as_slice())
    }

    /// Step backward and return the entry stepped over.
    pub fn previous_entry(&mut self) -> Result<&[T]> {
        let Some(target) = self.previous_index() else {
            return Err(Error::before_start(self.list.len()));
        };
        self.ensure(target)?;
        self.next_index = target;
        Ok(self.slots[parity(target)].data.as_slice())
    }

    /// Make sure the slot for `target` holds it, as cheaply as possible.
    fn ensure(&mut self, target: u64) -> Result<()> {
        if self.slots[parity(target)].index == Some(target) {
            return Ok(());
        }
        let ratio = u64::from(self.list.ratio());
        if target % ratio == 0 {
            return self.read_anchor(target);
        }
        if self.slots[parity(target - 1)].index == Some(target - 1) {
            return self.step_to(target);
        }
        self.load(target)
    }

    /// Replay from the anchor of `target`'s block, leaving `target` and (when
    /// in the same block) its predecessor cached.
    fn load(&mut self, target: u64) -> Result<()> {
        let ratio = u64::from(self.list.ratio());
        let anchor = target - target % ratio;
        log::trace!(
            "cursor replaying {} deltas from anchor {anchor} to reach {target}",
            target - anchor
        );
        self.read_anchor(anchor)?;
        for index in anchor + 1..=target {
            self.step_to(index)?;
        }
        Ok(())
    }

    fn read_anchor(&mut self, index: u64) -> Result<()> {
        let ratio = u64::from(self.list.ratio());
        let slot = &mut self.slots[parity(index)];
        slot.index = None;
        let mut reader = RecordReader::new(self.list.stream(), self.list.anchor_offset(index / ratio));
        reader.read_anchor(&mut slot.data)?;
        slot.end = reader.position();
        slot.index = Some(index);
        Ok(())
    }

    /// Decode `index` from its cached predecessor.
    fn step_to(&mut self, index: u64) -> Result<()> {
        let (base, slot) = split(&mut self.slots, parity(index));
        debug_assert_eq!(base.index, Some(index - 1));
        slot.index = None;
        let mut reader = RecordReader::new(self.list.stream(), base.end);
        reader.read_delta(&base.data, &mut slot.data)?;
        slot.end = reader.position();
        slot.index = Some(index);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Owned iterator
// ---------------------------------------------------------------------------

/// Double-ended iterator yielding owned copies of each entry.
///
/// Created by [`FrontCodedList::iter`]. Decoding stops after the first
/// error.
#[derive(Debug)]
pub struct Iter<'a, T: Element, W: IndexWidth> {
    front: Cursor<'a, T, W>,
    back: Cursor<'a, T, W>,
}

impl<'a, T: Element, W: IndexWidth> Iter<'a, T, W> {
    pub(crate) fn new(list: &'a FrontCodedList<T, W>) -> Self {
        Self {
            front: Cursor::unloaded(list, 0),
            back: Cursor::unloaded(list, list.len()),
        }
    }

    fn remaining(&self) -> u64 {
        self.back.next_index - self.front.next_index
    }

    fn fuse(&mut self) {
        self.front.next_index = self.back.next_index;
    }
}

impl<T: Element, W: IndexWidth> Iterator for Iter<'_, T, W> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }
        let item = self.front.next_entry().map(<[T]>::to_vec);
        if item.is_err() {
            self.fuse();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl<T: Element, W: IndexWidth> DoubleEndedIterator for Iter<'_, T, W> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }
        let item = self.back.previous_entry().map(<[T]>::to_vec);
        if item.is_err() {
            self.fuse();
        }
        Some(item)
    }
}

impl<T: Element, W: IndexWidth> ExactSizeIterator for Iter<'_, T, W> {}

impl<T: Element, W: IndexWidth> FusedIterator for Iter<'_, T, W> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
