use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::error::TreeError;
use crate::raw::{Branch, NodeId, RangeKind, RawWavlMap};

use super::WavlMap;
use super::cursor::Cursor;

/// A contiguous key interval of a [`WavlMap`].
///
/// Created by [`WavlMap::range`]. Like cursors, ranges are detached tokens:
/// operations take the map the range was created from. A range is resolved
/// to a closed slice of entries at creation time; when the interval holds no
/// entries the range is empty and iteration yields nothing.
///
/// Destructive operations ([`delete`](Range::delete) and
/// [`remove`](Range::remove)) consume the range: afterwards further
/// destructive calls return zero or an empty vector, and
/// [`first`](Range::first)/[`last`](Range::last) report
/// [`TreeError::ConsumedRange`].
///
/// # Examples
///
/// ```
/// use wavl_tree::WavlMap;
///
/// let mut map = WavlMap::from([(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")]);
///
/// let range = map.range(Some(&2), Some(&4), false).unwrap();
/// let keys: Vec<i32> = range.keys(&map).copied().collect();
/// assert_eq!(keys, [2, 3, 4]);
///
/// let mut range = map.range(Some(&2), Some(&4), false).unwrap();
/// let extracted = range.remove(&mut map).unwrap();
/// assert_eq!(extracted, [(2, "b"), (3, "c"), (4, "d")]);
/// assert_eq!(map.size(), 2);
/// ```
#[derive(Debug)]
pub struct Range {
    lower: NodeId,
    upper: NodeId,
    kind: RangeKind,
}

impl Range {
    pub(crate) fn new(lower: NodeId, upper: NodeId, kind: RangeKind) -> Range {
        Range { lower, upper, kind }
    }

    /// Returns `true` when the range holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind != RangeKind::Default
    }

    /// Returns `true` once a destructive operation has consumed the range.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.kind == RangeKind::Removed
    }

    // Whether both endpoints still address live nodes.
    fn endpoints_live<K, V, C>(&self, raw: &RawWavlMap<K, V, C>) -> bool {
        (self.lower.is_sentinel() || raw.contains_id(self.lower))
            && (self.upper.is_sentinel() || raw.contains_id(self.upper))
    }

    fn ensure_live<K, V, C>(&self, raw: &RawWavlMap<K, V, C>) -> Result<(), TreeError> {
        if self.endpoints_live(raw) {
            Ok(())
        } else {
            Err(TreeError::StaleCursor)
        }
    }

    /// Counts the entries in the range by walking the slice.
    ///
    /// # Complexity
    ///
    /// O(k + log n) for a slice of k entries.
    #[must_use]
    pub fn count<K, V, C>(&self, map: &WavlMap<K, V, C>) -> usize {
        if self.kind != RangeKind::Default || !self.endpoints_live(&map.raw) {
            return 0;
        }
        let mut count = 1;
        let mut cur = self.lower;
        while cur != self.upper {
            cur = map.raw.successor(cur);
            count += 1;
        }
        count
    }

    /// Returns a cursor at the first entry of the range. On an empty range
    /// the cursor is vacant: at the gap the interval collapsed into, or at
    /// the nearest end of the map when the interval lies entirely off one
    /// side.
    ///
    /// # Errors
    ///
    /// [`TreeError::ConsumedRange`] after a destructive call;
    /// [`TreeError::StaleCursor`] when an endpoint entry has been removed
    /// through the map.
    pub fn first<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        match self.kind {
            RangeKind::Default => {
                self.ensure_live(&map.raw)?;
                Ok(Cursor::occupied(self.lower))
            }
            RangeKind::Exclusive => {
                self.ensure_live(&map.raw)?;
                Ok(self.gap_cursor(map))
            }
            RangeKind::Before => Ok(before_all(map)),
            RangeKind::After => Ok(after_all(map)),
            RangeKind::Removed => Err(TreeError::ConsumedRange),
        }
    }

    /// Returns a cursor at the last entry of the range; vacant fallbacks as
    /// for [`first`](Range::first).
    ///
    /// # Errors
    ///
    /// [`TreeError::ConsumedRange`] after a destructive call;
    /// [`TreeError::StaleCursor`] when an endpoint entry has been removed
    /// through the map.
    pub fn last<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        match self.kind {
            RangeKind::Default => {
                self.ensure_live(&map.raw)?;
                Ok(Cursor::occupied(self.upper))
            }
            RangeKind::Exclusive => {
                self.ensure_live(&map.raw)?;
                Ok(self.gap_cursor(map))
            }
            RangeKind::Before => Ok(before_all(map)),
            RangeKind::After => Ok(after_all(map)),
            RangeKind::Removed => Err(TreeError::ConsumedRange),
        }
    }

    // The vacant slot immediately left of the stored upper endpoint; for a
    // collapsed pair this is exactly the gap the pair brackets.
    fn gap_cursor<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Cursor {
        let raw = &map.raw;
        let left = raw.left_of(self.upper);
        if left.is_sentinel() {
            Cursor::vacant(self.upper, Branch::Left)
        } else {
            Cursor::vacant(raw.max_of(left), Branch::Right)
        }
    }

    /// Removes every entry in the range from the map and returns how many
    /// were removed. Consumes the range.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when an endpoint entry has been removed
    /// through the map.
    ///
    /// # Complexity
    ///
    /// O(k log n) for a slice of k entries.
    pub fn delete<K, V, C>(&mut self, map: &mut WavlMap<K, V, C>) -> Result<usize, TreeError> {
        if self.kind != RangeKind::Default {
            return Ok(0);
        }
        self.ensure_live(&map.raw)?;

        let mut removed = 0;
        let mut cur = self.lower;
        loop {
            // The next pointer is fetched before the removal invalidates
            // `cur`; the removal itself never disturbs the successor.
            let last = cur == self.upper;
            let next = if last { NodeId::SENTINEL } else { map.raw.successor(cur) };
            map.raw.remove_node(cur);
            removed += 1;
            if last {
                break;
            }
            cur = next;
        }
        self.kind = RangeKind::Removed;
        Ok(removed)
    }

    /// Removes every entry in the range from the map and returns them in
    /// key order. Consumes the range.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when an endpoint entry has been removed
    /// through the map.
    ///
    /// # Complexity
    ///
    /// O(k log n) for a slice of k entries.
    pub fn remove<K, V, C>(&mut self, map: &mut WavlMap<K, V, C>) -> Result<Vec<(K, V)>, TreeError> {
        if self.kind != RangeKind::Default {
            return Ok(Vec::new());
        }
        self.ensure_live(&map.raw)?;

        let mut removed = Vec::new();
        let mut cur = self.lower;
        loop {
            let last = cur == self.upper;
            let next = if last { NodeId::SENTINEL } else { map.raw.successor(cur) };
            removed.push(map.raw.remove_node(cur));
            if last {
                break;
            }
            cur = next;
        }
        self.kind = RangeKind::Removed;
        Ok(removed)
    }

    /// Gets an iterator over the entries of the range in key order. Empty
    /// and consumed ranges yield nothing.
    pub fn entries<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> RangeIter<'a, K, V, C> {
        if self.kind != RangeKind::Default || !self.endpoints_live(&map.raw) {
            RangeIter {
                raw: &map.raw,
                front: NodeId::SENTINEL,
                back: NodeId::SENTINEL,
                finished: true,
            }
        } else {
            RangeIter {
                raw: &map.raw,
                front: self.lower,
                back: self.upper,
                finished: false,
            }
        }
    }

    /// Gets an iterator over the keys of the range, in sorted order.
    pub fn keys<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> RangeKeys<'a, K, V, C> {
        RangeKeys {
            inner: self.entries(map),
        }
    }

    /// Gets an iterator over the values of the range, in key order.
    pub fn values<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> RangeValues<'a, K, V, C> {
        RangeValues {
            inner: self.entries(map),
        }
    }

    /// Calls `f` for every entry of the range in key order. The map is
    /// passed as the third argument, mirroring the dictionary-level
    /// [`WavlMap::for_each`].
    pub fn for_each<K, V, C, F>(&self, map: &WavlMap<K, V, C>, mut f: F)
    where
        F: FnMut(&K, &V, &WavlMap<K, V, C>),
    {
        for (key, value) in self.entries(map) {
            f(key, value, map);
        }
    }

    /// Calls `f` for every entry of the range in reverse key order.
    pub fn for_each_reverse<K, V, C, F>(&self, map: &WavlMap<K, V, C>, mut f: F)
    where
        F: FnMut(&K, &V, &WavlMap<K, V, C>),
    {
        for (key, value) in self.entries(map).rev() {
            f(key, value, map);
        }
    }

    /// Materialises the range as a vector of `(key, value)` pairs in key
    /// order, the array-of-pairs JSON shape.
    #[must_use]
    pub fn to_entries<K: Clone, V: Clone, C>(&self, map: &WavlMap<K, V, C>) -> Vec<(K, V)> {
        self.entries(map).map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

// The vacant slot before the first entry, or the empty-map slot.
fn before_all<K, V, C>(map: &WavlMap<K, V, C>) -> Cursor {
    Cursor::at_gap_before(map.raw.first())
}

// The vacant slot after the last entry, or the empty-map slot.
fn after_all<K, V, C>(map: &WavlMap<K, V, C>) -> Cursor {
    Cursor::at_gap_after(map.raw.last())
}

/// An iterator over the entries of a [`Range`].
///
/// This `struct` is created by the [`entries`] method on [`Range`].
///
/// [`entries`]: Range::entries
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RangeIter<'a, K, V, C> {
    raw: &'a RawWavlMap<K, V, C>,
    front: NodeId,
    back: NodeId,
    // Set once the two ends have crossed.
    finished: bool,
}

impl<'a, K, V, C> Iterator for RangeIter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let id = self.front;
        if id == self.back {
            self.finished = true;
        } else {
            self.front = self.raw.successor(id);
        }
        Some(self.raw.entry_of(id))
    }
}

impl<K, V, C> DoubleEndedIterator for RangeIter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let id = self.back;
        if id == self.front {
            self.finished = true;
        } else {
            self.back = self.raw.predecessor(id);
        }
        Some(self.raw.entry_of(id))
    }
}

impl<K, V, C> FusedIterator for RangeIter<'_, K, V, C> {}

/// An iterator over the keys of a [`Range`].
///
/// This `struct` is created by the [`keys`] method on [`Range`].
///
/// [`keys`]: Range::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RangeKeys<'a, K, V, C> {
    inner: RangeIter<'a, K, V, C>,
}

impl<'a, K, V, C> Iterator for RangeKeys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }
}

impl<K, V, C> DoubleEndedIterator for RangeKeys<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V, C> FusedIterator for RangeKeys<'_, K, V, C> {}

/// An iterator over the values of a [`Range`].
///
/// This `struct` is created by the [`values`] method on [`Range`].
///
/// [`values`]: Range::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RangeValues<'a, K, V, C> {
    inner: RangeIter<'a, K, V, C>,
}

impl<'a, K, V, C> Iterator for RangeValues<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

impl<K, V, C> DoubleEndedIterator for RangeValues<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V, C> FusedIterator for RangeValues<'_, K, V, C> {}
