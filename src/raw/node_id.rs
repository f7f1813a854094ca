use core::num::NonZero;

type RawIndex = u32;

/// Arena position of a tree node, paired with the slot generation at which
/// the node was allocated.
///
/// Index 0 is reserved for the shared sentinel that stands in for every
/// absent child and for the parent of the root, so links are always a
/// `NodeId` rather than an option and rank arithmetic is uniform at the
/// fringe. The generation lets a handle captured before a removal be told
/// apart from the slot's next occupant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NodeId {
    // Stores `index + 1` so the niche optimization applies.
    index: NonZero<RawIndex>,
    generation: u32,
}

impl NodeId {
    pub(crate) const MAX: usize = (RawIndex::MAX - 1) as usize;

    /// The shared sentinel: index 0, never allocated and never freed.
    pub(crate) const SENTINEL: NodeId = NodeId::new(0, 0);

    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        assert!(index <= Self::MAX, "`NodeId::new()` - `index` > `NodeId::MAX`!");
        // `index + 1` cannot be zero and cannot overflow.
        #[allow(clippy::cast_possible_truncation)]
        Self {
            index: NonZero::new((index + 1) as RawIndex).unwrap(),
            generation,
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.index.get() - 1) as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) const fn is_sentinel(self) -> bool {
        self.index.get() == 1
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // Verify our assumptions about `NodeId` and the niche optimization.
    assert_eq_size!(NodeId, Option<NodeId>);
    assert_eq_size!(NodeId, u64);

    #[test]
    fn sentinel_is_sentinel() {
        assert!(NodeId::SENTINEL.is_sentinel());
        assert!(!NodeId::new(1, 0).is_sentinel());
    }

    #[test]
    #[should_panic(expected = "`NodeId::new()` - `index` > `NodeId::MAX`!")]
    fn invalid_node_id() {
        let _ = NodeId::new(NodeId::MAX + 1, 0);
    }

    proptest! {
        #[test]
        fn node_id_round_trip(index in 0..=NodeId::MAX, generation in any::<u32>()) {
            let id = NodeId::new(index, generation);
            prop_assert_eq!(id.index(), index);
            prop_assert_eq!(id.generation(), generation);
        }
    }
}
