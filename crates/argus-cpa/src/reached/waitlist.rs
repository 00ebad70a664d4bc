use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::FxHashSet;

use crate::NodeId;

/// Exploration order of the frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitlistOrder {
    BreadthFirst,
    DepthFirst,
    /// Lowest reverse-postorder rank of the CFA location first, breadth-first
    /// among equal ranks. Approximates topological order, so branches tend to
    /// be merged before they diverge further.
    #[default]
    ReversePostorder,
    /// Fewest CFA edges to an error location first.
    DistanceToError,
}

impl WaitlistOrder {
    fn is_prioritized(self) -> bool {
        matches!(self, Self::ReversePostorder | Self::DistanceToError)
    }
}

/// The frontier of not yet expanded nodes.
///
/// Removal is lazy: queue entries of nodes that left the waitlist stay in the
/// queue and are skipped when popped.
#[derive(Debug, Clone)]
pub struct Waitlist {
    order: WaitlistOrder,
    queue: VecDeque<NodeId>,
    heap: BinaryHeap<Reverse<(u32, u64, NodeId)>>,
    members: FxHashSet<NodeId>,
    seq: u64,
}

impl Waitlist {
    pub fn new(order: WaitlistOrder) -> Self {
        Self {
            order,
            queue: VecDeque::new(),
            heap: BinaryHeap::new(),
            members: FxHashSet::default(),
            seq: 0,
        }
    }

    pub fn order(&self) -> WaitlistOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Add `node` with the given priority (ignored by unprioritized orders).
    /// Returns `false` if it was already waiting.
    pub fn push(&mut self, node: NodeId, priority: u32) -> bool {
        if !self.members.insert(node) {
            return false;
        }
        if self.order.is_prioritized() {
            self.heap.push(Reverse((priority, self.seq, node)));
            self.seq += 1;
        } else {
            self.queue.push_back(node);
        }
        true
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        loop {
            let node = match self.order {
                WaitlistOrder::BreadthFirst => self.queue.pop_front()?,
                WaitlistOrder::DepthFirst => self.queue.pop_back()?,
                WaitlistOrder::ReversePostorder | WaitlistOrder::DistanceToError => {
                    let Reverse((_, _, node)) = self.heap.pop()?;
                    node
                }
            };
            if self.members.remove(&node) {
                return Some(node);
            }
        }
    }

    pub fn remove(&mut self, node: NodeId) -> bool {
        self.members.remove(&node)
    }
}
