use alloc::vec::Vec;
use core::cmp::Ordering;

use super::arena::Arena;
use super::node::{Branch, Node, Parity};
use super::node_id::NodeId;
use crate::error::TreeError;

// Conventions in the comments below are from Haupler, Sen and Tarjan,
// "Rank-Balanced Trees":
// - A node is an `i`-child if the rank difference to its parent is `i`.
// - A node is `i,j` if one child is an `i`-child and the other a `j`-child.
//
// The WAVL invariants: every rank difference is 1 or 2, and every leaf has
// rank 0. Only rank parities are stored; an edge with equal parities has an
// even rank difference, one with unequal parities an odd difference. The
// sentinel is rank -1 (parity `Odd`), which makes the fringe arithmetic
// uniform: a leaf is `1,1` and a unary node is always rank 1.

/// Result of a slot search: the node holding the key, or the leaf position
/// where it would be grafted. On an empty tree the miss parent is the
/// sentinel.
pub(crate) enum Slot {
    Found(NodeId),
    Miss { parent: NodeId, branch: Branch },
}

/// Classification of a resolved key interval.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RangeKind {
    /// Non-empty closed slice `[lower, upper]`.
    Default,
    /// Empty interval; the stored pair brackets the gap it fell into.
    Exclusive,
    /// Interval lies before the first key, or the tree is empty.
    Before,
    /// Interval lies after the last key.
    After,
    /// A destructive range operation has consumed the slice.
    Removed,
}

/// The WAVL tree core backing `WavlMap`.
pub(crate) struct RawWavlMap<K, V, C> {
    nodes: Arena<Node<K, V>>,
    root: NodeId,
    len: usize,
    cmp: C,
}

impl<K: Clone, V: Clone, C: Clone> Clone for RawWavlMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
            cmp: self.cmp.clone(),
        }
    }
}

impl<K, V, C> RawWavlMap<K, V, C> {
    pub(crate) const fn new(cmp: C) -> Self {
        Self {
            nodes: Arena::new(),
            root: NodeId::SENTINEL,
            len: 0,
            cmp,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Whether `id` still addresses a live node.
    pub(crate) fn contains_id(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes.get(id)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub(crate) fn key_of(&self, id: NodeId) -> &K {
        self.node(id).key()
    }

    #[inline]
    pub(crate) fn value_of(&self, id: NodeId) -> &V {
        self.node(id).value()
    }

    #[inline]
    pub(crate) fn value_of_mut(&mut self, id: NodeId) -> &mut V {
        self.node_mut(id).value_mut()
    }

    #[inline]
    pub(crate) fn entry_of(&self, id: NodeId) -> (&K, &V) {
        let node = self.node(id);
        (node.key(), node.value())
    }

    #[inline]
    pub(crate) fn parent_of(&self, id: NodeId) -> NodeId {
        self.node(id).parent()
    }

    #[inline]
    pub(crate) fn left_of(&self, id: NodeId) -> NodeId {
        self.node(id).left()
    }

    #[inline]
    pub(crate) fn right_of(&self, id: NodeId) -> NodeId {
        self.node(id).right()
    }

    #[inline]
    pub(crate) fn child_of(&self, id: NodeId, branch: Branch) -> NodeId {
        self.node(id).child(branch)
    }

    // Rank parity with the sentinel folded in: the sentinel is rank -1.
    #[inline]
    fn parity_of(&self, id: NodeId) -> Parity {
        if id.is_sentinel() {
            Parity::Odd
        } else {
            self.node(id).parity()
        }
    }

    #[inline]
    fn flip_parity(&mut self, id: NodeId) {
        self.node_mut(id).flip_parity();
    }

    #[inline]
    pub(crate) fn is_leaf(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.left().is_sentinel() && node.right().is_sentinel()
    }

    fn branch_of(&self, parent: NodeId, child: NodeId) -> Branch {
        if self.left_of(parent) == child {
            Branch::Left
        } else {
            Branch::Right
        }
    }

    fn sibling_of(&self, parent: NodeId, child: NodeId) -> NodeId {
        if self.left_of(parent) == child {
            self.right_of(parent)
        } else {
            self.left_of(parent)
        }
    }

    // Points `parent`'s slot for `old` at `new`; that slot is the tree root
    // when `parent` is the sentinel. `new`'s parent link is not updated.
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent.is_sentinel() {
            self.root = new;
        } else if self.left_of(parent) == old {
            self.node_mut(parent).set_left(new);
        } else {
            debug_assert_eq!(self.right_of(parent), old);
            self.node_mut(parent).set_right(new);
        }
    }

    fn set_parent_if_live(&mut self, id: NodeId, parent: NodeId) {
        if !id.is_sentinel() {
            self.node_mut(id).set_parent(parent);
        }
    }

    /// Minimum of the subtree rooted at `id`; `id` must not be the sentinel.
    pub(crate) fn min_of(&self, mut id: NodeId) -> NodeId {
        debug_assert!(!id.is_sentinel());
        loop {
            let left = self.left_of(id);
            if left.is_sentinel() {
                return id;
            }
            id = left;
        }
    }

    /// Maximum of the subtree rooted at `id`; `id` must not be the sentinel.
    pub(crate) fn max_of(&self, mut id: NodeId) -> NodeId {
        debug_assert!(!id.is_sentinel());
        loop {
            let right = self.right_of(id);
            if right.is_sentinel() {
                return id;
            }
            id = right;
        }
    }

    /// The minimum node of the tree, or the sentinel when empty.
    pub(crate) fn first(&self) -> NodeId {
        if self.root.is_sentinel() {
            NodeId::SENTINEL
        } else {
            self.min_of(self.root)
        }
    }

    /// The maximum node of the tree, or the sentinel when empty.
    pub(crate) fn last(&self) -> NodeId {
        if self.root.is_sentinel() {
            NodeId::SENTINEL
        } else {
            self.max_of(self.root)
        }
    }

    /// In-order successor of `id`, or the sentinel if `id` is the maximum.
    pub(crate) fn successor(&self, id: NodeId) -> NodeId {
        let right = self.right_of(id);
        if !right.is_sentinel() {
            return self.min_of(right);
        }
        let mut cur = id;
        let mut parent = self.parent_of(cur);
        while !parent.is_sentinel() && self.right_of(parent) == cur {
            cur = parent;
            parent = self.parent_of(parent);
        }
        parent
    }

    /// In-order predecessor of `id`, or the sentinel if `id` is the minimum.
    pub(crate) fn predecessor(&self, id: NodeId) -> NodeId {
        let left = self.left_of(id);
        if !left.is_sentinel() {
            return self.max_of(left);
        }
        let mut cur = id;
        let mut parent = self.parent_of(cur);
        while !parent.is_sentinel() && self.left_of(parent) == cur {
            cur = parent;
            parent = self.parent_of(parent);
        }
        parent
    }

    // `x` is the right child of `p`; `x` rises and `p` becomes its left
    // child. Purely structural; rank updates are the caller's concern.
    fn rotate_left(&mut self, p: NodeId, x: NodeId) {
        debug_assert_eq!(self.right_of(p), x);
        let across = self.left_of(x);
        let grandparent = self.parent_of(p);

        self.node_mut(p).set_right(across);
        self.set_parent_if_live(across, p);

        self.node_mut(x).set_left(p);
        self.node_mut(p).set_parent(x);
        self.node_mut(x).set_parent(grandparent);
        self.replace_child(grandparent, p, x);
    }

    // Mirror of `rotate_left`.
    fn rotate_right(&mut self, p: NodeId, x: NodeId) {
        debug_assert_eq!(self.left_of(p), x);
        let across = self.right_of(x);
        let grandparent = self.parent_of(p);

        self.node_mut(p).set_left(across);
        self.set_parent_if_live(across, p);

        self.node_mut(x).set_right(p);
        self.node_mut(p).set_parent(x);
        self.node_mut(x).set_parent(grandparent);
        self.replace_child(grandparent, p, x);
    }

    // `x = p.left`, `c = x.right`; `c` ends up on top of the triangle.
    fn rotate_left_right(&mut self, p: NodeId, x: NodeId, c: NodeId) {
        debug_assert_eq!(self.left_of(p), x);
        debug_assert_eq!(self.right_of(x), c);
        self.rotate_left(x, c);
        self.rotate_right(p, c);
    }

    // `x = p.right`, `c = x.left`; `c` ends up on top of the triangle.
    fn rotate_right_left(&mut self, p: NodeId, x: NodeId, c: NodeId) {
        debug_assert_eq!(self.right_of(p), x);
        debug_assert_eq!(self.left_of(x), c);
        self.rotate_right(x, c);
        self.rotate_left(p, c);
    }

    // Bottom-up rebalance after grafting the rank-0 leaf `x` under a parent
    // that was itself a leaf. Loop invariant: `x` is a 0-child, i.e. its
    // parity equals its parent's.
    fn insert_fixup(&mut self, mut x: NodeId) {
        loop {
            let p = self.parent_of(x);
            if p.is_sentinel() || self.parity_of(p) != self.parity_of(x) {
                return;
            }

            let sibling = self.sibling_of(p, x);
            if self.parity_of(sibling) != self.parity_of(p) {
                // The sibling is a 1-child, so `p` is 0,1: promote and ascend.
                self.flip_parity(p);
                x = p;
                continue;
            }

            // The sibling is a 2-child, so `p` is 0,2: one or two rotations
            // restore the rank rule. `x` has rank >= 1 here, so its inner
            // child is never rotated while sentinel.
            if self.left_of(p) == x {
                let c = self.right_of(x);
                if self.parity_of(c) == self.parity_of(x) {
                    self.rotate_right(p, x);
                } else {
                    self.rotate_left_right(p, x, c);
                    self.flip_parity(x);
                    self.flip_parity(c);
                }
            } else {
                let c = self.left_of(x);
                if self.parity_of(c) == self.parity_of(x) {
                    self.rotate_left(p, x);
                } else {
                    self.rotate_right_left(p, x, c);
                    self.flip_parity(x);
                    self.flip_parity(c);
                }
            }
            self.flip_parity(p);
            return;
        }
    }

    /// Grafts a new leaf at a known slot and rebalances. The caller must
    /// have established that the slot is empty and that `key` preserves the
    /// ordering there.
    pub(crate) fn insert_at_slot(&mut self, parent: NodeId, branch: Branch, key: K, value: V) -> NodeId {
        let id = self.nodes.alloc(Node::new(key, value, parent));
        if parent.is_sentinel() {
            debug_assert!(self.root.is_sentinel());
            self.root = id;
        } else {
            debug_assert!(self.child_of(parent, branch).is_sentinel());
            let parent_was_leaf = self.is_leaf(parent);
            self.node_mut(parent).set_child(branch, id);
            if parent_was_leaf {
                // The parent was rank 0 and now has a rank-0 child.
                self.insert_fixup(id);
            }
        }
        self.len += 1;
        id
    }

    /// Detaches `n`, rebalances, and returns its entry. The node's slot
    /// generation is bumped, so ids pointing at `n` become stale.
    pub(crate) fn remove_node(&mut self, n: NodeId) -> (K, V) {
        let parent = self.parent_of(n);
        let left = self.left_of(n);
        let right = self.right_of(n);

        if left.is_sentinel() || right.is_sentinel() {
            let child = if left.is_sentinel() { right } else { left };
            self.replace_child(parent, n, child);
            self.set_parent_if_live(child, parent);
            if !parent.is_sentinel() {
                self.remove_fixup(parent, child);
            }
        } else {
            // Two children: splice in the in-order predecessor. Taking the
            // predecessor rather than the successor keeps ids pointing at
            // the successor of `n` valid across the removal.
            let pred = self.max_of(left);
            let pred_left = self.left_of(pred);
            let parity = self.node(n).parity();

            if pred == left {
                // `pred` keeps its own left subtree; only its right side,
                // parent and rank change.
                self.replace_child(parent, n, pred);
                let node = self.node_mut(pred);
                node.set_parent(parent);
                node.set_right(right);
                node.set_parity(parity);
                self.node_mut(right).set_parent(pred);
                self.remove_fixup(pred, pred_left);
            } else {
                // Splice `pred` out of its position (it has no right child),
                // then install it in `n`'s slot with `n`'s rank.
                let pred_parent = self.parent_of(pred);
                self.node_mut(pred_parent).set_right(pred_left);
                self.set_parent_if_live(pred_left, pred_parent);

                self.replace_child(parent, n, pred);
                let node = self.node_mut(pred);
                node.set_parent(parent);
                node.set_left(left);
                node.set_right(right);
                node.set_parity(parity);
                self.node_mut(left).set_parent(pred);
                self.node_mut(right).set_parent(pred);
                self.remove_fixup(pred_parent, pred_left);
            }
        }

        self.len -= 1;
        self.nodes.take(n).into_entry()
    }

    // Restores the rank rule after `node` (possibly the sentinel) replaced a
    // removed child of `parent`.
    fn remove_fixup(&mut self, mut parent: NodeId, mut node: NodeId) {
        // A unary parent that lost its last real child is now a rank-1
        // leaf: demote it back to rank 0 and continue above.
        if node.is_sentinel() && self.is_leaf(parent) {
            if self.parity_of(parent) == Parity::Even {
                return;
            }
            self.flip_parity(parent);
            node = parent;
            parent = self.parent_of(parent);
        }

        // Every edge examined below has a rank difference of 2 or 3, so
        // unequal parity is exactly the 3-child test.
        loop {
            if parent.is_sentinel() || self.parity_of(parent) == self.parity_of(node) {
                return;
            }

            let sibling = self.sibling_of(parent, node);
            debug_assert!(!sibling.is_sentinel());

            if self.parity_of(sibling) == self.parity_of(parent) {
                // The sibling is a 2-child: demote the parent and ascend.
                self.flip_parity(parent);
                node = parent;
                parent = self.parent_of(parent);
                continue;
            }

            // The sibling is a 1-child; its children decide the repair.
            let node_branch = self.branch_of(parent, node);
            let (near, far) = match node_branch {
                Branch::Left => (self.left_of(sibling), self.right_of(sibling)),
                Branch::Right => (self.right_of(sibling), self.left_of(sibling)),
            };

            if self.parity_of(far) == self.parity_of(sibling) {
                if self.parity_of(near) == self.parity_of(sibling) {
                    // Both nephews are 2-children: double demote and ascend.
                    self.flip_parity(sibling);
                    self.flip_parity(parent);
                    node = parent;
                    parent = self.parent_of(parent);
                    continue;
                }
                // The near nephew is a 1-child: raise it with a double
                // rotation. Its double promotion and the parent's double
                // demotion cancel in parity, leaving only the sibling's
                // demotion.
                match node_branch {
                    Branch::Left => self.rotate_right_left(parent, sibling, near),
                    Branch::Right => self.rotate_left_right(parent, sibling, near),
                }
                self.flip_parity(sibling);
                return;
            }

            // The far nephew is a 1-child: a single rotation raising the
            // sibling finishes the repair. The parent is demoted once, or
            // twice (a parity no-op) when the rotation left it a leaf.
            match node_branch {
                Branch::Left => self.rotate_left(parent, sibling),
                Branch::Right => self.rotate_right(parent, sibling),
            }
            self.flip_parity(sibling);
            if !self.is_leaf(parent) {
                self.flip_parity(parent);
            }
            return;
        }
    }

    /// Drops every node. Slot generations are bumped, so ids from before
    /// the clear stay stale.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        debug_assert_eq!(self.nodes.len(), 0);
        self.root = NodeId::SENTINEL;
        self.len = 0;
    }

    /// Empties the tree into a vector of entries in key order, without
    /// per-node rebalancing.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut ids = Vec::with_capacity(self.len);
        let mut cur = self.first();
        while !cur.is_sentinel() {
            ids.push(cur);
            cur = self.successor(cur);
        }
        self.root = NodeId::SENTINEL;
        self.len = 0;
        ids.into_iter().map(|id| self.nodes.take(id).into_entry()).collect()
    }
}

impl<K, V, C: Fn(&K, &K) -> Ordering> RawWavlMap<K, V, C> {
    /// Standard BST descent; the sentinel on a miss.
    pub(crate) fn search(&self, key: &K) -> NodeId {
        let mut cur = self.root;
        while !cur.is_sentinel() {
            cur = match (self.cmp)(key, self.key_of(cur)) {
                Ordering::Less => self.left_of(cur),
                Ordering::Equal => return cur,
                Ordering::Greater => self.right_of(cur),
            };
        }
        NodeId::SENTINEL
    }

    /// Descent that reports the would-be graft position on a miss.
    pub(crate) fn search_slot(&self, key: &K) -> Slot {
        if self.root.is_sentinel() {
            return Slot::Miss {
                parent: NodeId::SENTINEL,
                branch: Branch::Left,
            };
        }
        let mut cur = self.root;
        loop {
            match (self.cmp)(key, self.key_of(cur)) {
                Ordering::Less => {
                    let left = self.left_of(cur);
                    if left.is_sentinel() {
                        return Slot::Miss {
                            parent: cur,
                            branch: Branch::Left,
                        };
                    }
                    cur = left;
                }
                Ordering::Equal => return Slot::Found(cur),
                Ordering::Greater => {
                    let right = self.right_of(cur);
                    if right.is_sentinel() {
                        return Slot::Miss {
                            parent: cur,
                            branch: Branch::Right,
                        };
                    }
                    cur = right;
                }
            }
        }
    }

    /// Inserts `key`, replacing and returning the previous value if the key
    /// is already present (no structural change in that case).
    pub(crate) fn insert_or_replace(&mut self, key: K, value: V) -> Option<V> {
        match self.search_slot(&key) {
            Slot::Found(id) => Some(core::mem::replace(self.value_of_mut(id), value)),
            Slot::Miss { parent, branch } => {
                self.insert_at_slot(parent, branch, key, value);
                None
            }
        }
    }

    pub(crate) fn remove_key(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.search(key);
        if id.is_sentinel() {
            None
        } else {
            Some(self.remove_node(id))
        }
    }

    /// Resolves a key interval to a closed node slice and its
    /// classification.
    ///
    /// `exclusive` drops the end key from the slice. `Exclusive`, `Before`
    /// and `After` all denote empty slices; for `Exclusive` the returned
    /// pair brackets the gap the interval collapsed into.
    pub(crate) fn search_range(
        &self,
        start: Option<&K>,
        end: Option<&K>,
        exclusive: bool,
    ) -> Result<(NodeId, NodeId, RangeKind), TreeError> {
        if let (Some(s), Some(e)) = (start, end)
            && (self.cmp)(s, e) == Ordering::Greater
        {
            return Err(TreeError::InvalidRange);
        }
        if self.root.is_sentinel() {
            return Ok((NodeId::SENTINEL, NodeId::SENTINEL, RangeKind::Before));
        }

        // Lower endpoint: the first node >= `start`.
        let lower = match start {
            None => self.min_of(self.root),
            Some(s) => match self.search_slot(s) {
                Slot::Found(id) => id,
                Slot::Miss {
                    parent,
                    branch: Branch::Left,
                } => parent,
                Slot::Miss {
                    parent,
                    branch: Branch::Right,
                } => {
                    let next = self.successor(parent);
                    if next.is_sentinel() {
                        return Ok((NodeId::SENTINEL, NodeId::SENTINEL, RangeKind::After));
                    }
                    next
                }
            },
        };

        // Upper endpoint: the last node <= `end` (< `end` when exclusive).
        let upper = match end {
            None => self.max_of(self.root),
            Some(e) => match self.search_slot(e) {
                Slot::Found(id) => {
                    if exclusive {
                        if lower == id {
                            return Ok((id, id, RangeKind::Exclusive));
                        }
                        self.predecessor(id)
                    } else {
                        id
                    }
                }
                Slot::Miss {
                    parent,
                    branch: Branch::Right,
                } => parent,
                Slot::Miss {
                    parent,
                    branch: Branch::Left,
                } => self.predecessor(parent),
            },
        };
        if upper.is_sentinel() {
            return Ok((NodeId::SENTINEL, NodeId::SENTINEL, RangeKind::Before));
        }

        // Both endpoints resolved into the same gap between two adjacent
        // keys; store the pair bracketing that gap.
        if (self.cmp)(self.key_of(lower), self.key_of(upper)) == Ordering::Greater {
            return Ok((upper, lower, RangeKind::Exclusive));
        }

        Ok((lower, upper, RangeKind::Default))
    }
}

#[cfg(test)]
impl<K, V, C: Fn(&K, &K) -> Ordering> RawWavlMap<K, V, C> {
    /// Validates the WAVL and BST invariants. Panics on violation; intended
    /// for tests only.
    pub(crate) fn assert_invariants(&self) {
        if self.root.is_sentinel() {
            assert_eq!(self.len, 0, "empty tree must have len 0");
            return;
        }
        assert!(
            self.parent_of(self.root).is_sentinel(),
            "root parent must be the sentinel"
        );

        let (_, count) = self.check_subtree(self.root, NodeId::SENTINEL);
        assert_eq!(count, self.len, "len must match the live node count");

        // Strict key order along the in-order walk.
        let mut cur = self.first();
        let mut prev = NodeId::SENTINEL;
        while !cur.is_sentinel() {
            if !prev.is_sentinel() {
                assert_eq!(
                    (self.cmp)(self.key_of(prev), self.key_of(cur)),
                    Ordering::Less,
                    "in-order keys must be strictly increasing"
                );
            }
            prev = cur;
            cur = self.successor(cur);
        }
    }

    // Recomputes integer ranks bottom-up from parities and checks the rank
    // rule on every edge. Returns (rank, node count).
    fn check_subtree(&self, id: NodeId, parent: NodeId) -> (i32, usize) {
        if id.is_sentinel() {
            return (-1, 0);
        }
        let node = self.node(id);
        assert_eq!(node.parent(), parent, "parent link mismatch");

        let (left_rank, left_count) = self.check_subtree(node.left(), id);
        let (right_rank, right_count) = self.check_subtree(node.right(), id);

        // The parity pins the rank to one of the two candidates above the
        // left child.
        let candidate = left_rank + 1;
        let rank = if (candidate.rem_euclid(2) == 0) == (node.parity() == Parity::Even) {
            candidate
        } else {
            candidate + 1
        };

        let right_diff = rank - right_rank;
        assert!(
            (1..=2).contains(&right_diff),
            "rank rule violated: right difference {right_diff}"
        );
        if node.left().is_sentinel() && node.right().is_sentinel() {
            assert_eq!(rank, 0, "leaf must have rank 0");
        }

        (rank, left_count + right_count + 1)
    }
}
