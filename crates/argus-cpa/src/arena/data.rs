use super::id::{Id, Identifier};
use super::item::Slot;

/// Append-only storage with tombstones. Identifiers are never reused, so the
/// allocation order doubles as a creation timestamp.
#[derive(Debug, Clone)]
pub struct Arena<I: Identifier, T> {
    slots: Vec<Slot<T>>,
    live: usize,
    marker: std::marker::PhantomData<I>,
}

impl<I: Identifier, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            marker: std::marker::PhantomData,
        }
    }
}

impl<I: Identifier, T> Arena<I, T> {
    pub fn next_id(&self) -> I {
        I::from(Id(self.slots.len()))
    }

    /// Number of items that have not been deleted.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.slots.push(Slot::builder().data(item).build());
        self.live += 1;
        id
    }

    /// Live item for `id`; deleted items are invisible.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.into().raw()).and_then(Slot::live)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.into().raw()).and_then(Slot::live_mut)
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn delete(&mut self, id: I) -> bool {
        let buried = self
            .slots
            .get_mut(id.into().raw())
            .is_some_and(Slot::bury);
        if buried {
            self.live -= 1;
        }
        buried
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.live().map(|data| (I::from(Id(i)), data)))
    }
}
