/// One arena slot: the payload and its tombstone flag.
#[derive(Debug, Clone)]
pub(super) struct Slot<T> {
    data: T,
    tombstone: bool,
}

#[bon::bon]
impl<T> Slot<T> {
    #[builder]
    pub(super) fn new(data: T, tombstone: Option<bool>) -> Self {
        Self {
            data,
            tombstone: tombstone.unwrap_or(false),
        }
    }
}

impl<T> Slot<T> {
    pub(super) fn live(&self) -> Option<&T> {
        (!self.tombstone).then_some(&self.data)
    }

    pub(super) fn live_mut(&mut self) -> Option<&mut T> {
        (!self.tombstone).then_some(&mut self.data)
    }

    /// Returns `false` if the slot was already dead.
    pub(super) fn bury(&mut self) -> bool {
        !std::mem::replace(&mut self.tombstone, true)
    }
}
