use core::cmp::Ordering;

use crate::error::TreeError;
use crate::raw::{Branch, NodeId, RawWavlMap, Slot};

use super::WavlMap;

/// A position in a [`WavlMap`]: either a live entry (*occupied*) or an
/// insertion slot between entries (*vacant*).
///
/// Cursors are plain `Copy` tokens. They borrow nothing; every operation
/// takes the map the cursor came from, and starts by validating the
/// position. A cursor whose entry has been removed — through another
/// cursor, [`WavlMap::delete`], a range operation, or [`WavlMap::clear`] —
/// fails that validation with [`TreeError::StaleCursor`]. Cursors on
/// surviving entries remain valid: removal splices the *predecessor* into a
/// two-child node's place, so in particular a cursor on the successor of a
/// removed entry is never disturbed.
///
/// # Examples
///
/// ```
/// use wavl_tree::WavlMap;
///
/// let mut map = WavlMap::from([(1, "one"), (3, "three")]);
///
/// let first = map.first();
/// assert_eq!(first.key(&map).unwrap(), Some(&1));
///
/// // Insert relative to an existing position.
/// let two = first.insert_after(&mut map, 2, "two").unwrap();
/// assert_eq!(two.prev(&map).unwrap().key(&map).unwrap(), Some(&1));
/// assert_eq!(two.next(&map).unwrap().key(&map).unwrap(), Some(&3));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    kind: CursorKind,
}

#[derive(Clone, Copy, Debug)]
enum CursorKind {
    Occupied(NodeId),
    Vacant { anchor: NodeId, branch: Branch },
}

impl Cursor {
    pub(crate) fn occupied(id: NodeId) -> Cursor {
        debug_assert!(!id.is_sentinel());
        Cursor {
            kind: CursorKind::Occupied(id),
        }
    }

    pub(crate) fn vacant(anchor: NodeId, branch: Branch) -> Cursor {
        Cursor {
            kind: CursorKind::Vacant { anchor, branch },
        }
    }

    /// Occupied at `id`, or the empty-map slot when `id` is the sentinel.
    pub(crate) fn at(id: NodeId) -> Cursor {
        if id.is_sentinel() {
            Cursor::vacant(NodeId::SENTINEL, Branch::Left)
        } else {
            Cursor::occupied(id)
        }
    }

    /// The vacant slot directly before the tree minimum `id`, or the
    /// empty-map slot when `id` is the sentinel.
    pub(crate) fn at_gap_before(id: NodeId) -> Cursor {
        if id.is_sentinel() {
            Cursor::vacant(NodeId::SENTINEL, Branch::Left)
        } else {
            Cursor::vacant(id, Branch::Left)
        }
    }

    /// The vacant slot directly after the tree maximum `id`, or the
    /// empty-map slot when `id` is the sentinel.
    pub(crate) fn at_gap_after(id: NodeId) -> Cursor {
        if id.is_sentinel() {
            Cursor::vacant(NodeId::SENTINEL, Branch::Left)
        } else {
            Cursor::vacant(id, Branch::Right)
        }
    }

    fn anchor(&self) -> NodeId {
        match self.kind {
            CursorKind::Occupied(id) => id,
            CursorKind::Vacant { anchor, .. } => anchor,
        }
    }

    fn ensure_valid<K, V, C>(&self, raw: &RawWavlMap<K, V, C>) -> Result<(), TreeError> {
        let anchor = self.anchor();
        if anchor.is_sentinel() || raw.contains_id(anchor) {
            Ok(())
        } else {
            Err(TreeError::StaleCursor)
        }
    }

    /// Returns `true` when the cursor points at a vacant slot rather than a
    /// live entry.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn is_empty<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Result<bool, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(matches!(self.kind, CursorKind::Vacant { .. }))
    }

    /// Returns the key at the cursor, or `None` on a vacant slot.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn key<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> Result<Option<&'a K>, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(match self.kind {
            CursorKind::Occupied(id) => Some(map.raw.key_of(id)),
            CursorKind::Vacant { .. } => None,
        })
    }

    /// Returns the value at the cursor, or `None` on a vacant slot.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn value<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> Result<Option<&'a V>, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(match self.kind {
            CursorKind::Occupied(id) => Some(map.raw.value_of(id)),
            CursorKind::Vacant { .. } => None,
        })
    }

    /// Returns a mutable reference to the value at the cursor, or `None` on
    /// a vacant slot.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn value_mut<'a, K, V, C>(&self, map: &'a mut WavlMap<K, V, C>) -> Result<Option<&'a mut V>, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(match self.kind {
            CursorKind::Occupied(id) => Some(map.raw.value_of_mut(id)),
            CursorKind::Vacant { .. } => None,
        })
    }

    /// Returns the key-value pair at the cursor, or `None` on a vacant
    /// slot.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn entry<'a, K, V, C>(&self, map: &'a WavlMap<K, V, C>) -> Result<Option<(&'a K, &'a V)>, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(match self.kind {
            CursorKind::Occupied(id) => Some(map.raw.entry_of(id)),
            CursorKind::Vacant { .. } => None,
        })
    }

    /// Steps to the previous position.
    ///
    /// From an occupied cursor this is the predecessor entry, or the vacant
    /// slot before the first entry when there is none. From a vacant slot
    /// it is the entry on the slot's left, falling back to the slot itself
    /// at the front of the map.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavl_tree::WavlMap;
    ///
    /// let map = WavlMap::from([(1, "a"), (2, "b")]);
    /// let last = map.last();
    /// assert_eq!(last.prev(&map).unwrap().key(&map).unwrap(), Some(&1));
    /// ```
    pub fn prev<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        self.ensure_valid(&map.raw)?;
        let raw = &map.raw;
        Ok(match self.kind {
            CursorKind::Occupied(id) => {
                let pred = raw.predecessor(id);
                if pred.is_sentinel() {
                    Cursor::vacant(id, Branch::Left)
                } else {
                    Cursor::occupied(pred)
                }
            }
            CursorKind::Vacant { anchor, .. } if anchor.is_sentinel() => *self,
            CursorKind::Vacant {
                anchor,
                branch: Branch::Right,
            } => Cursor::occupied(anchor),
            CursorKind::Vacant {
                anchor,
                branch: Branch::Left,
            } => {
                let pred = raw.predecessor(anchor);
                if pred.is_sentinel() {
                    // Already at the front.
                    *self
                } else {
                    Cursor::occupied(pred)
                }
            }
        })
    }

    /// Steps to the next position; the mirror of [`prev`](Cursor::prev).
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn next<K, V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        self.ensure_valid(&map.raw)?;
        let raw = &map.raw;
        Ok(match self.kind {
            CursorKind::Occupied(id) => {
                let succ = raw.successor(id);
                if succ.is_sentinel() {
                    Cursor::vacant(id, Branch::Right)
                } else {
                    Cursor::occupied(succ)
                }
            }
            CursorKind::Vacant { anchor, .. } if anchor.is_sentinel() => *self,
            CursorKind::Vacant {
                anchor,
                branch: Branch::Left,
            } => Cursor::occupied(anchor),
            CursorKind::Vacant {
                anchor,
                branch: Branch::Right,
            } => {
                let succ = raw.successor(anchor);
                if succ.is_sentinel() {
                    // Already at the back.
                    *self
                } else {
                    Cursor::occupied(succ)
                }
            }
        })
    }

    /// Inserts `key` directly before this position and returns a cursor at
    /// the new entry.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed;
    /// [`TreeError::KeyOrderViolation`] unless `key` orders strictly
    /// between the cursor's predecessor and the cursor itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavl_tree::{TreeError, WavlMap};
    ///
    /// let mut map = WavlMap::from([(1, "a"), (3, "c")]);
    /// let three = map.entry(3);
    /// three.insert_before(&mut map, 2, "b").unwrap();
    ///
    /// // 0 does not fall between 1 and 3:
    /// assert_eq!(
    ///     three.insert_before(&mut map, 0, "zero").unwrap_err(),
    ///     TreeError::KeyOrderViolation,
    /// );
    /// ```
    pub fn insert_before<K, V, C>(&self, map: &mut WavlMap<K, V, C>, key: K, value: V) -> Result<Cursor, TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.ensure_valid(&map.raw)?;
        match self.kind {
            CursorKind::Occupied(id) => {
                let pred = map.raw.predecessor(id);
                check_gap(&map.raw, pred, &key, id)?;
                let (parent, branch) = if map.raw.left_of(id).is_sentinel() {
                    (id, Branch::Left)
                } else {
                    // The predecessor is the left subtree's maximum, so its
                    // right slot is free.
                    (pred, Branch::Right)
                };
                Ok(Cursor::occupied(map.raw.insert_at_slot(parent, branch, key, value)))
            }
            CursorKind::Vacant { anchor, branch } => {
                insert_into_slot(map, anchor, branch, key, value).map(Cursor::occupied)
            }
        }
    }

    /// Inserts `key` directly after this position and returns a cursor at
    /// the new entry; the mirror of [`insert_before`](Cursor::insert_before).
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed;
    /// [`TreeError::KeyOrderViolation`] unless `key` orders strictly
    /// between the cursor and its successor.
    pub fn insert_after<K, V, C>(&self, map: &mut WavlMap<K, V, C>, key: K, value: V) -> Result<Cursor, TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.ensure_valid(&map.raw)?;
        match self.kind {
            CursorKind::Occupied(id) => {
                let succ = map.raw.successor(id);
                check_gap(&map.raw, id, &key, succ)?;
                let (parent, branch) = if map.raw.right_of(id).is_sentinel() {
                    (id, Branch::Right)
                } else {
                    (succ, Branch::Left)
                };
                Ok(Cursor::occupied(map.raw.insert_at_slot(parent, branch, key, value)))
            }
            CursorKind::Vacant { anchor, branch } => {
                insert_into_slot(map, anchor, branch, key, value).map(Cursor::occupied)
            }
        }
    }

    /// Removes the entry at the cursor. Returns `false` on a vacant slot.
    ///
    /// The cursor itself becomes stale once the entry is removed.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry was already
    /// removed.
    pub fn delete<K, V, C>(&self, map: &mut WavlMap<K, V, C>) -> Result<bool, TreeError> {
        Ok(self.remove(map)?.is_some())
    }

    /// Removes and returns the entry at the cursor. Returns `None` on a
    /// vacant slot.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry was already
    /// removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavl_tree::WavlMap;
    ///
    /// let mut map = WavlMap::from([(1, "a")]);
    /// assert_eq!(map.first().remove(&mut map).unwrap(), Some((1, "a")));
    /// assert!(map.is_empty());
    /// ```
    pub fn remove<K, V, C>(&self, map: &mut WavlMap<K, V, C>) -> Result<Option<(K, V)>, TreeError> {
        self.ensure_valid(&map.raw)?;
        Ok(match self.kind {
            CursorKind::Occupied(id) => Some(map.raw.remove_node(id)),
            CursorKind::Vacant { .. } => None,
        })
    }
}

// Checks `prev < key < next`, with a sentinel on either side standing for
// an open end.
fn check_gap<K, V, C>(raw: &RawWavlMap<K, V, C>, prev: NodeId, key: &K, next: NodeId) -> Result<(), TreeError>
where
    C: Fn(&K, &K) -> Ordering,
{
    let cmp = raw.comparator();
    if !prev.is_sentinel() && cmp(raw.key_of(prev), key) != Ordering::Less {
        return Err(TreeError::KeyOrderViolation);
    }
    if !next.is_sentinel() && cmp(key, raw.key_of(next)) != Ordering::Less {
        return Err(TreeError::KeyOrderViolation);
    }
    Ok(())
}

// Inserts through a vacant slot after checking that `key` fits the gap the
// slot denotes. If the cached slot has been filled since the cursor was
// created, the current slot for the key is derived instead.
fn insert_into_slot<K, V, C>(
    map: &mut WavlMap<K, V, C>,
    anchor: NodeId,
    branch: Branch,
    key: K,
    value: V,
) -> Result<NodeId, TreeError>
where
    C: Fn(&K, &K) -> Ordering,
{
    let raw = &map.raw;
    let (prev, next) = if anchor.is_sentinel() {
        (NodeId::SENTINEL, NodeId::SENTINEL)
    } else {
        match branch {
            Branch::Left => (raw.predecessor(anchor), anchor),
            Branch::Right => (anchor, raw.successor(anchor)),
        }
    };
    check_gap(raw, prev, &key, next)?;

    if anchor.is_sentinel() {
        if raw.root().is_sentinel() {
            return Ok(map.raw.insert_at_slot(NodeId::SENTINEL, Branch::Left, key, value));
        }
    } else if raw.child_of(anchor, branch).is_sentinel() {
        return Ok(map.raw.insert_at_slot(anchor, branch, key, value));
    }

    match map.raw.search_slot(&key) {
        Slot::Found(_) => Err(TreeError::KeyOrderViolation),
        Slot::Miss { parent, branch } => Ok(map.raw.insert_at_slot(parent, branch, key, value)),
    }
}

/// A cursor produced by a keyed lookup ([`WavlMap::entry`]).
///
/// While vacant it remembers the probe key, and inserting through it morphs
/// this same cursor into an occupied one, so chained calls address the new
/// entry.
///
/// # Examples
///
/// ```
/// use wavl_tree::WavlMap;
///
/// let mut map = WavlMap::from([(1, 10)]);
///
/// let mut two = map.entry(2);
/// assert!(two.is_empty(&map).unwrap());
/// assert_eq!(two.insert(&mut map, 20).unwrap(), None);
/// assert!(!two.is_empty(&map).unwrap());
/// assert_eq!(two.insert(&mut map, 21).unwrap(), Some(20));
/// ```
#[derive(Debug)]
pub struct KeyedCursor<K> {
    cursor: Cursor,
    // The probe key; present exactly while the cursor is vacant.
    key: Option<K>,
}

impl<K> KeyedCursor<K> {
    pub(crate) fn occupied(id: NodeId) -> Self {
        KeyedCursor {
            cursor: Cursor::occupied(id),
            key: None,
        }
    }

    pub(crate) fn vacant(anchor: NodeId, branch: Branch, key: K) -> Self {
        KeyedCursor {
            cursor: Cursor::vacant(anchor, branch),
            key: Some(key),
        }
    }

    /// The plain cursor at this position. The copy does not morph when this
    /// keyed cursor later inserts.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the key: the entry's key when occupied, the probe key when
    /// vacant.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn key<'a, V, C>(&'a self, map: &'a WavlMap<K, V, C>) -> Result<&'a K, TreeError> {
        self.cursor.ensure_valid(&map.raw)?;
        Ok(match self.cursor.kind {
            CursorKind::Occupied(id) => map.raw.key_of(id),
            CursorKind::Vacant { .. } => self.key.as_ref().expect("vacant keyed cursor keeps its probe key"),
        })
    }

    /// Sets the value at this key. On a vacant cursor the entry is created
    /// at the already-located slot and the cursor morphs into an occupied
    /// one; on an occupied cursor the previous value is replaced and
    /// returned.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn insert<V, C>(&mut self, map: &mut WavlMap<K, V, C>, value: V) -> Result<Option<V>, TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.cursor.ensure_valid(&map.raw)?;
        match self.cursor.kind {
            CursorKind::Occupied(id) => Ok(Some(core::mem::replace(map.raw.value_of_mut(id), value))),
            CursorKind::Vacant { anchor, branch } => {
                let key = self.key.take().expect("vacant keyed cursor keeps its probe key");

                let id = if anchor.is_sentinel() && map.raw.root().is_sentinel() {
                    map.raw.insert_at_slot(NodeId::SENTINEL, Branch::Left, key, value)
                } else if !anchor.is_sentinel() && map.raw.child_of(anchor, branch).is_sentinel() {
                    map.raw.insert_at_slot(anchor, branch, key, value)
                } else {
                    // The cached slot has been filled since the lookup;
                    // derive the current slot for the key.
                    match map.raw.search_slot(&key) {
                        Slot::Found(id) => {
                            let old = core::mem::replace(map.raw.value_of_mut(id), value);
                            self.cursor = Cursor::occupied(id);
                            return Ok(Some(old));
                        }
                        Slot::Miss { parent, branch } => map.raw.insert_at_slot(parent, branch, key, value),
                    }
                };
                self.cursor = Cursor::occupied(id);
                Ok(None)
            }
        }
    }

    /// Sets the value at this key, discarding any previous value.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn set<V, C>(&mut self, map: &mut WavlMap<K, V, C>, value: V) -> Result<(), TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.insert(map, value).map(|_| ())
    }

    /// See [`Cursor::is_empty`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn is_empty<V, C>(&self, map: &WavlMap<K, V, C>) -> Result<bool, TreeError> {
        self.cursor.is_empty(map)
    }

    /// See [`Cursor::value`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn value<'a, V, C>(&self, map: &'a WavlMap<K, V, C>) -> Result<Option<&'a V>, TreeError> {
        self.cursor.value(map)
    }

    /// See [`Cursor::value_mut`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn value_mut<'a, V, C>(&self, map: &'a mut WavlMap<K, V, C>) -> Result<Option<&'a mut V>, TreeError> {
        self.cursor.value_mut(map)
    }

    /// See [`Cursor::entry`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn entry<'a, V, C>(&self, map: &'a WavlMap<K, V, C>) -> Result<Option<(&'a K, &'a V)>, TreeError> {
        self.cursor.entry(map)
    }

    /// See [`Cursor::prev`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn prev<V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        self.cursor.prev(map)
    }

    /// See [`Cursor::next`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed.
    pub fn next<V, C>(&self, map: &WavlMap<K, V, C>) -> Result<Cursor, TreeError> {
        self.cursor.next(map)
    }

    /// See [`Cursor::insert_before`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed;
    /// [`TreeError::KeyOrderViolation`] when `key` does not fit before this
    /// position.
    pub fn insert_before<V, C>(&self, map: &mut WavlMap<K, V, C>, key: K, value: V) -> Result<Cursor, TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.cursor.insert_before(map, key, value)
    }

    /// See [`Cursor::insert_after`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry has been removed;
    /// [`TreeError::KeyOrderViolation`] when `key` does not fit after this
    /// position.
    pub fn insert_after<V, C>(&self, map: &mut WavlMap<K, V, C>, key: K, value: V) -> Result<Cursor, TreeError>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.cursor.insert_after(map, key, value)
    }

    /// See [`Cursor::delete`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry was already
    /// removed.
    pub fn delete<V, C>(&self, map: &mut WavlMap<K, V, C>) -> Result<bool, TreeError> {
        self.cursor.delete(map)
    }

    /// See [`Cursor::remove`].
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleCursor`] when the cursor's entry was already
    /// removed.
    pub fn remove<V, C>(&self, map: &mut WavlMap<K, V, C>) -> Result<Option<(K, V)>, TreeError> {
        self.cursor.remove(map)
    }
}
