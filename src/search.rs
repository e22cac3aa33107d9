use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::cost::Cost;
use crate::space::Action;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// A reference to a `SearchTreeNode<St, A, C>` within its `NodeStore`.
///
/// Parent links are stored as these indices, so the search tree holds no
/// references and dropping it is just clearing the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    #[inline(always)]
    pub fn new(index: usize) -> Self {
        Self(index)
    }
    #[inline(always)]
    pub fn get(&self) -> usize {
        self.0
    }
}

/// A search vertex with its cost bookkeeping.
#[derive(Clone, Debug)]
pub struct SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Predecessor on the best known path, and the move taken from it.
    pub(crate) parent: Option<(NodeIndex, A)>,
    pub(crate) state: St,
    /// Accumulated cost from the start (`local_goal`).
    pub(crate) g: C,
    /// `g + h`, the open-list key (`global_goal`).
    pub(crate) f: C,
    /// Whether this node was expanded already.
    pub(crate) visited: bool,
    /// When this node was first reached in the current search. Breaks `f` ties.
    pub(crate) order: u64,
}

impl<St, A, C> SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn new(s: St) -> Self {
        Self {
            parent: None,
            state: s,
            g: C::infinity(),
            f: C::infinity(),
            visited: false,
            order: u64::MAX,
        }
    }

    /// Forgets everything but the state.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.parent = None;
        self.g = C::infinity();
        self.f = C::infinity();
        self.visited = false;
        self.order = u64::MAX;
    }

    /// Seeds this Node as the root of a search.
    #[inline(always)]
    pub(crate) fn root(&mut self, h: C) {
        self.parent = None;
        self.g = C::zero();
        self.f = h;
        self.order = 0;
    }

    /// Gives this Node a better path through a new parent.
    ///
    /// `order` only sticks the first time the node is reached. Returns the
    /// node's discovery order.
    #[inline(always)]
    pub(crate) fn reach(&mut self, new_parent: (NodeIndex, A), g: C, f: C, order: u64) -> u64 {
        debug_assert!(g < self.g);
        debug_assert!(!self.visited);
        if !self.reached() {
            self.order = order;
        }
        self.parent = Some(new_parent);
        self.g = g;
        self.f = f;
        self.order
    }

    pub fn state(&self) -> &St {
        &self.state
    }
    pub fn parent(&self) -> Option<(NodeIndex, A)> {
        self.parent
    }
    pub fn local_goal(&self) -> C {
        self.g
    }
    pub fn global_goal(&self) -> C {
        self.f
    }
    pub fn visited(&self) -> bool {
        self.visited
    }
    /// Whether some path reached this node.
    pub fn reached(&self) -> bool {
        self.g.valid()
    }
    /// How many nodes were reached before this one, if it was reached.
    pub fn discovery_order(&self) -> Option<u64> {
        self.reached().then_some(self.order)
    }
}

/// Owner of the search nodes of a single solve.
///
/// Implementations decide how a `State` maps to its node, which lets explicit
/// graphs pre-allocate every node while implicit ones discover them lazily.
pub trait NodeStore<St, A, C>: Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Forgets all bookkeeping from a previous solve.
    fn reset(&mut self);

    /// Finds the node of a state, if it has one.
    fn find(&self, s: &St) -> Option<NodeIndex>;

    /// Finds the node of a state, creating a fresh one if needed.
    fn fetch(&mut self, s: &St) -> NodeIndex;

    fn as_slice(&self) -> &[SearchTreeNode<St, A, C>];
    fn as_mut_slice(&mut self) -> &mut [SearchTreeNode<St, A, C>];

    #[inline(always)]
    fn len(&self) -> usize {
        self.as_slice().len()
    }
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    #[inline(always)]
    fn node(&self, i: NodeIndex) -> &SearchTreeNode<St, A, C> {
        &self.as_slice()[i.get()]
    }
    #[inline(always)]
    fn node_mut(&mut self, i: NodeIndex) -> &mut SearchTreeNode<St, A, C> {
        &mut self.as_mut_slice()[i.get()]
    }

    /// Walks the parent links from `node_index` back to the root.
    #[must_use]
    fn path<Sp: Space<St, A, C>>(&self, space: &Sp, mut node_index: NodeIndex) -> Path<St, A, C> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("PathReconstruction");

        let e = self.node(node_index);
        let mut path = Path::<St, A, C>::new_from_start(*e.state());

        while let Some((parent_index, a)) = self.node(node_index).parent {
            debug_assert!(node_index != parent_index);
            let s = *self.node(parent_index).state();
            let c: C = space.cost(&s, &a);

            path.append((s, a), c);
            node_index = parent_index;
        }

        path.reverse();
        path
    }
}

/// Nodes created on demand and found through their hashed `State`.
pub struct HashedNodes<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchTreeNode<St, A, C>>,
    node_map: FxHashMap<St, NodeIndex>,
}

impl<St, A, C> HashedNodes<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024),
            node_map: FxHashMap::default(),
        }
    }
}

impl<St, A, C> Default for HashedNodes<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<St, A, C> NodeStore<St, A, C> for HashedNodes<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn reset(&mut self) {
        self.nodes.clear();
        self.node_map.clear();
    }

    #[inline(always)]
    fn find(&self, s: &St) -> Option<NodeIndex> {
        self.node_map.get(s).copied()
    }

    fn fetch(&mut self, s: &St) -> NodeIndex {
        if let Some(i) = self.node_map.get(s) {
            return *i;
        }
        let i = NodeIndex::new(self.nodes.len());
        self.nodes.push(SearchTreeNode::new(*s));
        self.node_map.insert(*s, i);
        i
    }

    #[inline(always)]
    fn as_slice(&self) -> &[SearchTreeNode<St, A, C>] {
        &self.nodes
    }
    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [SearchTreeNode<St, A, C>] {
        &mut self.nodes
    }
}

impl<St, A, C> std::fmt::Debug for HashedNodes<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "HashedNodes{{({} nodes)}}", self.nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    struct Spot(u8);
    impl State for Spot {}
    impl Action for Spot {}

    #[test]
    fn fresh_nodes_are_unreached() {
        let n = SearchTreeNode::<Spot, Spot, u32>::new(Spot(3));
        assert!(!n.reached());
        assert!(!n.visited());
        assert_eq!(n.local_goal(), u32::MAX);
        assert_eq!(n.global_goal(), u32::MAX);
        assert!(n.parent().is_none());
    }

    #[test]
    fn fetch_deduplicates_states() {
        let mut nodes = HashedNodes::<Spot, Spot, u32>::new();
        let a = nodes.fetch(&Spot(1));
        let b = nodes.fetch(&Spot(2));
        assert_ne!(a, b);
        assert_eq!(nodes.fetch(&Spot(1)), a);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.find(&Spot(2)), Some(b));
        assert_eq!(nodes.find(&Spot(9)), None);

        nodes.reset();
        assert!(nodes.is_empty());
        assert_eq!(nodes.find(&Spot(1)), None);
    }

    #[test]
    fn reach_updates_costs() {
        let mut nodes = HashedNodes::<Spot, Spot, u32>::new();
        let root = nodes.fetch(&Spot(0));
        nodes.node_mut(root).root(4);
        let child = nodes.fetch(&Spot(1));
        assert_eq!(nodes.node(child).discovery_order(), None);
        assert_eq!(nodes.node_mut(child).reach((root, Spot(1)), 5, 8, 1), 1);
        // A better path keeps the first discovery order.
        assert_eq!(nodes.node_mut(child).reach((root, Spot(1)), 1, 4, 9), 1);

        let n = nodes.node(child);
        assert_eq!(n.local_goal(), 1);
        assert_eq!(n.global_goal(), 4);
        assert_eq!(n.parent(), Some((root, Spot(1))));
        assert_eq!(n.discovery_order(), Some(1));
        assert_eq!(nodes.node(root).discovery_order(), Some(0));

        nodes.node_mut(child).reset();
        assert!(!nodes.node(child).reached());
        assert_eq!(nodes.node(child).discovery_order(), None);
    }
}
