use alloc::vec::Vec;

use super::node_id::NodeId;

/// Slot storage for tree nodes.
///
/// The slot backing a `NodeId` lives at `index - 1`; index 0 belongs to the
/// sentinel and never touches the arena. Every `take` bumps the slot's
/// generation, so ids captured before the removal stay detectably stale even
/// after the slot is reused.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    entry: Option<T>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        if let Some(slot_index) = self.free.pop() {
            // Reuse a free slot under its current generation.
            let slot = &mut self.slots[slot_index];
            slot.entry = Some(element);
            NodeId::new(slot_index + 1, slot.generation)
        } else {
            // Use strict less-than so the highest id index stays <= NodeId::MAX.
            assert!(
                self.slots.len() < NodeId::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                NodeId::MAX
            );
            self.slots.push(Slot {
                generation: 0,
                entry: Some(element),
            });
            NodeId::new(self.slots.len(), 0)
        }
    }

    /// Returns whether `id` still addresses a live element.
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        if id.is_sentinel() {
            return false;
        }
        match self.slots.get(id.index() - 1) {
            Some(slot) => slot.generation == id.generation() && slot.entry.is_some(),
            None => false,
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        debug_assert!(!id.is_sentinel());
        let slot = &self.slots[id.index() - 1];
        debug_assert_eq!(slot.generation, id.generation());
        slot.entry.as_ref().expect("`Arena::get()` - `id` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        debug_assert!(!id.is_sentinel());
        let slot = &mut self.slots[id.index() - 1];
        debug_assert_eq!(slot.generation, id.generation());
        slot.entry.as_mut().expect("`Arena::get_mut()` - `id` is invalid!")
    }

    pub(crate) fn take(&mut self, id: NodeId) -> T {
        debug_assert!(!id.is_sentinel());
        let slot_index = id.index() - 1;
        let slot = &mut self.slots[slot_index];
        debug_assert_eq!(slot.generation, id.generation());
        let element = slot.entry.take().expect("`Arena::take()` - `id` is invalid!");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(slot_index);
        element
    }

    /// Drops every element. Generations are bumped, not reset, so ids from
    /// before the clear stay stale.
    pub(crate) fn clear(&mut self) {
        for (slot_index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(slot_index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn take_makes_id_stale_even_after_reuse() {
        let mut arena: Arena<u32> = Arena::new();
        let id = arena.alloc(7);
        assert!(arena.contains(id));

        assert_eq!(arena.take(id), 7);
        assert!(!arena.contains(id));

        // The slot is reused, but under a new generation.
        let reused = arena.alloc(8);
        assert_eq!(reused.index(), id.index());
        assert!(!arena.contains(id));
        assert!(arena.contains(reused));
    }

    #[test]
    fn clear_makes_all_ids_stale() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(NodeId, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let id = arena.alloc(value);
                        model.push((id, value));
                    }
                    Operation::Get(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let id = model[index].0;
                        prop_assert_eq!(*arena.get(id), model[index].1);
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let id = model[index].0;
                        *arena.get_mut(id) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let (id, value) = model.swap_remove(index);
                        prop_assert_eq!(arena.take(id), value);
                        prop_assert!(!arena.contains(id));
                    }
                    Operation::Clear => {
                        arena.clear();
                        for &(id, _) in &model {
                            prop_assert!(!arena.contains(id));
                        }
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());

                for &(id, value) in &model {
                    prop_assert!(arena.contains(id));
                    prop_assert_eq!(*arena.get(id), value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        Get(usize),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => any::<usize>().prop_map(Operation::Get),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            5 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
