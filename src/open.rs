use crate::cost::Cost;
use crate::search::NodeIndex;

/// The ranking tuple of the open list.
///
/// Lower `f` first, ties go to the node discovered first. Re-queued nodes keep
/// their discovery order, so this matches a stable sort by `f` over the
/// nodes in the order they were first reached.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OpenRank<C: Cost> {
    f: C,
    order: u64,
}

impl<C: Cost> OpenRank<C> {
    pub fn f(&self) -> C {
        self.f
    }
    pub fn order(&self) -> u64 {
        self.order
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OpenEntry<C: Cost> {
    /// The rank of this node that defines how good it is.
    pub rank: OpenRank<C>,
    /// The index of this node in the Node Store
    pub node_index: NodeIndex,
}

const HEAP_ARITY: usize = 4usize;
#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    crate::heap_primitives::index_parent::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    crate::heap_primitives::index_first_children::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_right(i: usize) -> usize {
    crate::heap_primitives::index_last_children::<HEAP_ARITY>(i)
}

/// The open list: a heap of `(f, NodeIndex)` entries with lazy deletion.
///
/// Improving a node pushes a fresh entry instead of re-ranking the old one,
/// so a node may appear several times. Callers discard entries for closed
/// nodes, or whose `f` no longer matches the node, when they pop them.
#[derive(Debug)]
pub struct OpenList<C: Cost> {
    heap: Vec<OpenEntry<C>>,
}

impl<C: Cost> OpenList<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(2048)
    }
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn peek(&self) -> Option<&OpenEntry<C>> {
        self.heap.first()
    }

    /// Queues a node under `f`, with `order` being when it was first reached.
    pub fn push(&mut self, f: C, order: u64, node_index: NodeIndex) {
        let rank = OpenRank { f, order };
        self.heap.push(OpenEntry { rank, node_index });
        self.sift_up(self.heap.len() - 1);
        self.verify_heap();
    }

    pub fn pop(&mut self) -> Option<OpenEntry<C>> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Pop");

        let len = self.heap.len();
        if len <= 1 {
            return self.heap.pop();
        }
        self.heap.swap(0, len - 1);
        let top = self.heap.pop();
        self.sift_down(0);
        self.verify_heap();
        top
    }

    /// Raises a node
    /// Returns it's new index
    fn sift_up(&mut self, mut pos: usize) -> usize {
        debug_assert!(pos < self.heap.len());

        while pos > 0 {
            let parent = up(pos);
            if self.heap[parent].rank <= self.heap[pos].rank {
                break;
            }
            self.heap.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        loop {
            // Find the best child
            let first = down_left(pos);
            if first >= len {
                break;
            }
            let last = std::cmp::min(down_right(pos), len - 1);
            let child = first + crate::heap_primitives::min_index(&self.heap[first..=last]);

            if self.heap[pos].rank <= self.heap[child].rank {
                break;
            }
            self.heap.swap(pos, child);
            pos = child;
        }
        pos
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        // Every node goes after its parent node, if any.
        for i in 1..self.heap.len() {
            let p = up(i);
            debug_assert!(
                self.heap[p].rank <= self.heap[i].rank,
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                self.heap[i],
                self.heap.len(),
            );
        }
    }
}

impl<C: Cost> Default for OpenList<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking() {
        let low = OpenRank { f: 1u32, order: 9 };
        let high = OpenRank { f: 2u32, order: 0 };
        assert!(low < high);

        // Same f-value, the node discovered first goes first.
        let old = OpenRank { f: 2u32, order: 1 };
        let new = OpenRank { f: 2u32, order: 5 };
        assert!(old < new);
    }

    #[test]
    fn pops_in_order() {
        let mut open = OpenList::<u32>::new();
        for (i, f) in [5u32, 3, 8, 1, 9, 2, 7, 4, 6, 0].into_iter().enumerate() {
            open.push(f, i as u64, NodeIndex::new(i));
        }
        assert_eq!(open.len(), 10);

        let mut fs = vec![];
        while let Some(e) = open.pop() {
            fs.push(e.rank.f());
        }
        assert_eq!(fs, (0..10).collect::<Vec<u32>>());
        assert!(open.is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut open = OpenList::<u32>::new();
        for i in 0..20usize {
            open.push((i % 2) as u32, i as u64, NodeIndex::new(i));
        }

        let order: Vec<usize> = std::iter::from_fn(|| open.pop())
            .map(|e| e.node_index.get())
            .collect();
        let evens = (0..20).step_by(2);
        let odds = (1..20).step_by(2);
        assert_eq!(order, evens.chain(odds).collect::<Vec<usize>>());
    }

    #[test]
    fn ties_follow_discovery_not_push_order() {
        let mut open = OpenList::<u32>::new();
        // Discovered second, queued first.
        open.push(2, 7, NodeIndex::new(7));
        // Discovered first, re-queued later with a better f.
        open.push(2, 3, NodeIndex::new(3));
        assert_eq!(open.pop().map(|e| e.node_index), Some(NodeIndex::new(3)));
        assert_eq!(open.pop().map(|e| e.node_index), Some(NodeIndex::new(7)));
    }

    #[test]
    fn clear_empties() {
        let mut open = OpenList::<u32>::new();
        open.push(3, 0, NodeIndex::new(0));
        open.clear();
        assert!(open.is_empty());
        assert!(open.pop().is_none());
        open.push(3, 0, NodeIndex::new(1));
        assert_eq!(open.peek().map(|e| e.node_index), Some(NodeIndex::new(1)));
    }
}
