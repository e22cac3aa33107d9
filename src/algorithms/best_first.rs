use std::fmt::Debug;
use std::marker::PhantomData;

use crate::cost::Cost;
use crate::error::SearchError;
use crate::heuristic::Heuristic;
use crate::open::OpenList;
use crate::search::NodeIndex;
use crate::search::NodeStore;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// Where a search stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Nothing to search yet. Call `begin`.
    Ready,
    /// There are open nodes left and the goal was not expanded yet.
    Running,
    /// The goal was expanded; `path()` has the answer.
    Found,
    /// The open list ran out before reaching the goal.
    Exhausted,
}

impl SearchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStatus::Found | SearchStatus::Exhausted)
    }
}

/// Best-first search (A*, or Dijkstra under a constant heuristic).
///
/// The search owns its space and node store, and keeps both across solves.
/// Each solve resets the store first, so explicit graphs (the grid) reuse
/// their pre-allocated nodes while implicit ones (the puzzle) start empty.
///
/// ```
/// use bestfirst::algorithms::best_first::BestFirstSearch;
/// use bestfirst::problems::grid::GridHeuristic;
/// use bestfirst::problems::grid::GridProblem;
///
/// let problem = GridProblem::try_from("S.#\n..#\n..G").unwrap();
/// let (space, start, goal) = problem.into_parts();
/// let mut search = BestFirstSearch::new(space, GridHeuristic::Euclidean);
/// let path = search.solve(start, goal).unwrap().unwrap();
/// assert_eq!(path.len(), 2);
/// ```
#[derive(Debug)]
pub struct BestFirstSearch<H, Sp, St, A, C>
where
    H: Heuristic<St, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    space: Sp,
    heuristic: H,

    /// All the Search Nodes. Naturally forms a Search Tree as each node may
    /// have a parent Node.
    nodes: <Sp as Space<St, A, C>>::Nodes,

    /// Pending nodes, best `f` first. May hold stale duplicates.
    open: OpenList<C>,

    start: Option<St>,
    goal: Option<St>,
    found: Option<NodeIndex>,
    status: SearchStatus,

    expanded: usize,
    discovered: usize,

    _phantom_action: PhantomData<A>,
}

impl<H, Sp, St, A, C> BestFirstSearch<H, Sp, St, A, C>
where
    H: Heuristic<St, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(space: Sp, heuristic: H) -> Self {
        let nodes = space.nodes();
        Self {
            space,
            heuristic,
            nodes,
            open: OpenList::new(),
            start: None,
            goal: None,
            found: None,
            status: SearchStatus::Ready,
            expanded: 0,
            discovered: 0,
            _phantom_action: PhantomData,
        }
    }

    pub fn space(&self) -> &Sp {
        &self.space
    }

    /// Mutable access to the space.
    ///
    /// Any ongoing search is abandoned, as its nodes may no longer agree with
    /// the space.
    pub fn space_mut(&mut self) -> &mut Sp {
        self.abandon();
        &mut self.space
    }

    pub fn heuristic(&self) -> &H {
        &self.heuristic
    }

    /// Swaps the heuristic, abandoning any ongoing search.
    pub fn set_heuristic(&mut self, heuristic: H) {
        self.abandon();
        self.heuristic = heuristic;
    }

    fn abandon(&mut self) {
        if self.status != SearchStatus::Ready {
            log::trace!("Abandoning search in status {:?}", self.status);
        }
        self.status = SearchStatus::Ready;
        self.found = None;
        self.open.clear();
    }

    /// Solves from `start` to `goal` from scratch.
    ///
    /// Returns `Ok(None)` when the goal is unreachable, which is a normal
    /// outcome (obstacles may legally disconnect the graph).
    pub fn solve(&mut self, start: St, goal: St) -> Result<Option<Path<St, A, C>>, SearchError> {
        self.begin(start, goal)?;
        match self.run(None)? {
            SearchStatus::Found => Ok(self.path()),
            SearchStatus::Exhausted => Ok(None),
            status @ (SearchStatus::Ready | SearchStatus::Running) => {
                unreachable!("Unbounded runs stop on terminal states, not {status:?}")
            }
        }
    }

    /// Prepares a fresh search without expanding anything.
    ///
    /// Invalid endpoints are rejected here, before any node is touched.
    pub fn begin(&mut self, start: St, goal: St) -> Result<(), SearchError> {
        self.abandon();
        self.space.check_endpoints(&start, &goal)?;

        if !self.space.fits(&self.nodes) {
            log::debug!("Rebuilding the node store for {:?}", self.space);
            self.nodes = self.space.nodes();
        }
        self.nodes.reset();
        self.open.clear();
        self.expanded = 0;
        self.found = None;

        let h = self.heuristic.h(&start, &goal);
        let start_index = self.nodes.fetch(&start);
        self.nodes.node_mut(start_index).root(h);
        self.open.push(h, 0, start_index);
        self.discovered = 1;

        self.start = Some(start);
        self.goal = Some(goal);
        self.status = SearchStatus::Running;
        log::debug!("Searching from {start:?} to {goal:?} (h={h})");
        Ok(())
    }

    /// Steps until the search ends or `budget` steps were taken.
    pub fn run(&mut self, budget: Option<usize>) -> Result<SearchStatus, SearchError> {
        if self.status == SearchStatus::Ready {
            return Err(SearchError::NotStarted);
        }
        let mut steps = 0usize;
        loop {
            if budget.is_some_and(|b| steps >= b) {
                return Ok(self.status);
            }
            let status = self.step()?;
            if status.is_terminal() {
                return Ok(status);
            }
            steps += 1;
        }
    }

    /// Like `solve`, but gives up after `budget` steps.
    pub fn solve_within(
        &mut self,
        start: St,
        goal: St,
        budget: usize,
    ) -> Result<Option<Path<St, A, C>>, SearchError> {
        self.begin(start, goal)?;
        match self.run(Some(budget))? {
            SearchStatus::Found => Ok(self.path()),
            SearchStatus::Exhausted => Ok(None),
            SearchStatus::Ready | SearchStatus::Running => Err(SearchError::OutOfBudget {
                expanded: self.expanded,
            }),
        }
    }

    /// Expands (at most) one node.
    pub fn step(&mut self) -> Result<SearchStatus, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("NodeExpansion");

        match self.status {
            SearchStatus::Ready => return Err(SearchError::NotStarted),
            SearchStatus::Found | SearchStatus::Exhausted => return Ok(self.status),
            SearchStatus::Running => {}
        }
        let Some(goal) = self.goal else {
            return Err(SearchError::NotStarted);
        };

        let Some(node_index) = self.pop() else {
            self.status = SearchStatus::Exhausted;
            log::debug!(
                "Open list exhausted after {} expansions, {goal:?} is unreachable",
                self.expanded
            );
            return Ok(self.status);
        };

        let node = self.nodes.node_mut(node_index);
        node.visited = true;
        let state = node.state;
        let g: C = node.g;
        self.expanded += 1;

        if state == goal {
            #[cfg(feature = "coz_profile")]
            coz::progress!("GoalFound");
            log::debug!(
                "Reached {goal:?} with cost {g} after {} expansions",
                self.expanded
            );
            self.found = Some(node_index);
            self.status = SearchStatus::Found;
            return Ok(self.status);
        }

        // Expand state
        for (s, a) in self.space.neighbours(&state) {
            #[cfg(feature = "coz_profile")]
            coz::scope!("ReachNode");

            if self.space.blocked(&s) {
                continue;
            }
            let neigh_index = self.nodes.fetch(&s);
            let neigh = self.nodes.node(neigh_index);
            if neigh.visited {
                // Closed already, its best path is final.
                continue;
            }

            let c: C = self.space.cost(&state, &a);
            let new_g = g.saturating_add(&c);
            if new_g < neigh.g {
                let order = self.discovered as u64;
                if !neigh.reached() {
                    self.discovered += 1;
                }
                let new_f = new_g.saturating_add(&self.heuristic.h(&s, &goal));
                log::trace!("Relaxing {s:?}: g {} -> {new_g}", neigh.g);
                let order = self
                    .nodes
                    .node_mut(neigh_index)
                    .reach((node_index, a), new_g, new_f, order);
                self.open.push(new_f, order, neigh_index);
            }
        }

        Ok(self.status)
    }

    /// Pops the best open node, dropping stale entries on the way.
    #[inline(always)]
    fn pop(&mut self) -> Option<NodeIndex> {
        while let Some(entry) = self.open.pop() {
            let node = self.nodes.node(entry.node_index);
            if node.visited || node.f != entry.rank.f() {
                continue;
            }
            return Some(entry.node_index);
        }
        None
    }

    /// The path to the goal, once found.
    #[must_use]
    pub fn path(&self) -> Option<Path<St, A, C>> {
        self.found.map(|i| self.nodes.path(&self.space, i))
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }
    pub fn start(&self) -> Option<&St> {
        self.start.as_ref()
    }
    pub fn goal(&self) -> Option<&St> {
        self.goal.as_ref()
    }

    /// The node store, for visualising explored states.
    pub fn nodes(&self) -> &<Sp as Space<St, A, C>>::Nodes {
        &self.nodes
    }
    pub fn node(&self, s: &St) -> Option<&SearchTreeNode<St, A, C>> {
        self.nodes.find(s).map(|i| self.nodes.node(i))
    }
    pub fn is_visited(&self, s: &St) -> bool {
        self.node(s).is_some_and(|n| n.visited())
    }
    /// Best known cost to reach `s`, infinite if unreached.
    pub fn local_goal(&self, s: &St) -> C {
        self.node(s).map_or_else(C::infinity, |n| n.local_goal())
    }

    /// Nodes expanded in the current search.
    pub fn expanded(&self) -> usize {
        self.expanded
    }
    /// Nodes reached in the current search.
    pub fn discovered(&self) -> usize {
        self.discovered
    }
    /// Entries in the open list, stale ones included.
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "BestFirstSearch Stats:")?;
        let s = size_of::<SearchTreeNode<St, A, C>>();
        let l = self.nodes.len();
        writeln!(
            out,
            "  - |Nodes|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;

        let s = size_of::<crate::open::OpenEntry<C>>();
        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(
            out,
            "  - |Open|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Open|*:  {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        writeln!(
            out,
            "  - Discovered nodes: {}",
            self.discovered.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Expanded nodes: {}",
            self.expanded.separate_with_commas()
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::Blind;
    use crate::search::HashedNodes;
    use crate::space::Neighbours;

    /// A weighted line graph 0 - 1 - ... - n, with a costly shortcut 0 - n.
    #[derive(Debug)]
    struct Line {
        n: u8,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    struct Stop(u8);
    impl State for Stop {}
    impl Action for Stop {}

    impl Space<Stop, Stop, u32> for Line {
        type Nodes = HashedNodes<Stop, Stop, u32>;

        fn nodes(&self) -> Self::Nodes {
            HashedNodes::new()
        }
        fn apply(&self, _s: &Stop, a: &Stop) -> Option<Stop> {
            Some(*a)
        }
        fn cost(&self, s: &Stop, a: &Stop) -> u32 {
            if s.0.abs_diff(a.0) == 1 { 1 } else { 100 }
        }
        fn neighbours(&self, s: &Stop) -> Neighbours<Stop, Stop> {
            let mut v = Neighbours::new();
            if s.0 > 0 {
                v.push((Stop(s.0 - 1), Stop(s.0 - 1)));
            }
            if s.0 < self.n {
                v.push((Stop(s.0 + 1), Stop(s.0 + 1)));
            }
            if s.0 == 0 {
                v.push((Stop(self.n), Stop(self.n)));
            }
            v
        }
        fn valid(&self, s: &Stop) -> bool {
            s.0 <= self.n
        }
    }

    type LineSearch = BestFirstSearch<Blind, Line, Stop, Stop, u32>;

    /// Two equally short routes, S-B-A-G and S-C-G, where A is found first
    /// through an expensive edge and only later improved through B.
    #[derive(Debug)]
    struct Diamond;

    const DIAMOND_EDGES: [(u8, u8, u32); 6] = [
        (0, 1, 5), // S-A
        (0, 2, 2), // S-C
        (0, 3, 1), // S-B
        (3, 1, 1), // B-A
        (1, 4, 1), // A-G
        (2, 4, 1), // C-G
    ];

    impl Space<Stop, Stop, u32> for Diamond {
        type Nodes = HashedNodes<Stop, Stop, u32>;

        fn nodes(&self) -> Self::Nodes {
            HashedNodes::new()
        }
        fn apply(&self, _s: &Stop, a: &Stop) -> Option<Stop> {
            Some(*a)
        }
        fn cost(&self, s: &Stop, a: &Stop) -> u32 {
            DIAMOND_EDGES
                .iter()
                .find(|(x, y, _)| (*x, *y) == (s.0, a.0) || (*y, *x) == (s.0, a.0))
                .map_or(u32::MAX, |(_, _, c)| *c)
        }
        fn neighbours(&self, s: &Stop) -> Neighbours<Stop, Stop> {
            let mut v = Neighbours::new();
            for (x, y, _) in DIAMOND_EDGES {
                if x == s.0 {
                    v.push((Stop(y), Stop(y)));
                } else if y == s.0 {
                    v.push((Stop(x), Stop(x)));
                }
            }
            v
        }
        fn valid(&self, s: &Stop) -> bool {
            s.0 <= 4
        }
    }

    #[test]
    fn prefers_cheap_detour() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        let path = search.solve(Stop(0), Stop(5)).unwrap().unwrap();
        assert_eq!(path.cost, 5);
        assert_eq!(path.actions, (1..=5).map(Stop).collect::<Vec<_>>());
        assert!(search.space().valid_path(&path));
        assert_eq!(search.status(), SearchStatus::Found);
    }

    #[test]
    fn start_is_goal() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        let path = search.solve(Stop(3), Stop(3)).unwrap().unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost, 0);
        assert_eq!(search.expanded(), 1);
    }

    #[test]
    fn rejects_invalid_endpoints() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        assert_eq!(
            search.solve(Stop(9), Stop(1)),
            Err(SearchError::InvalidStart("Stop(9)".to_string()))
        );
        assert_eq!(
            search.solve(Stop(1), Stop(6)),
            Err(SearchError::InvalidGoal("Stop(6)".to_string()))
        );
        assert_eq!(search.status(), SearchStatus::Ready);
    }

    #[test]
    fn step_before_begin() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        assert_eq!(search.step(), Err(SearchError::NotStarted));
    }

    #[test]
    fn ties_prefer_earlier_discoveries() {
        let mut search = BestFirstSearch::<Blind, Diamond, Stop, Stop, u32>::new(Diamond, Blind);
        let path = search.solve(Stop(0), Stop(4)).unwrap().unwrap();
        assert_eq!(path.cost, 3);
        // A and C tie at g=2, A was discovered first even though it was
        // queued again after C.
        assert_eq!(path.actions, vec![Stop(3), Stop(1), Stop(4)]);
        assert_eq!(search.node(&Stop(1)).unwrap().discovery_order(), Some(1));
        assert_eq!(search.node(&Stop(2)).unwrap().discovery_order(), Some(2));
        assert_eq!(search.node(&Stop(4)).unwrap().discovery_order(), Some(4));
    }

    #[test]
    fn failed_begin_forgets_previous_path() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        assert!(search.solve(Stop(0), Stop(5)).unwrap().is_some());
        assert!(search.path().is_some());

        assert!(search.solve(Stop(0), Stop(9)).is_err());
        assert_eq!(search.status(), SearchStatus::Ready);
        assert!(search.path().is_none());
        assert_eq!(search.run(None), Err(SearchError::NotStarted));
    }

    #[test]
    fn zero_budget_expands_nothing() {
        let mut search = LineSearch::new(Line { n: 5 }, Blind);
        assert_eq!(search.run(Some(0)), Err(SearchError::NotStarted));

        search.begin(Stop(0), Stop(5)).unwrap();
        assert_eq!(search.run(Some(0)).unwrap(), SearchStatus::Running);
        assert_eq!(search.expanded(), 0);
        assert_eq!(search.run(Some(1)).unwrap(), SearchStatus::Running);
        assert_eq!(search.expanded(), 1);
    }

    #[test]
    fn solve_within_gives_up() {
        let mut search = LineSearch::new(Line { n: 9 }, Blind);
        assert_eq!(
            search.solve_within(Stop(0), Stop(9), 4),
            Err(SearchError::OutOfBudget { expanded: 4 })
        );
        let path = search.solve_within(Stop(0), Stop(9), 100).unwrap().unwrap();
        assert_eq!(path.cost, 9);
    }

    #[test]
    fn budgeted_runs_resume() {
        let mut search = LineSearch::new(Line { n: 9 }, Blind);
        search.begin(Stop(0), Stop(9)).unwrap();

        assert_eq!(search.run(Some(3)).unwrap(), SearchStatus::Running);
        assert_eq!(search.expanded(), 3);
        assert!(search.path().is_none());

        assert_eq!(search.run(None).unwrap(), SearchStatus::Found);
        assert_eq!(search.path().unwrap().cost, 9);
        // Terminal searches stay put.
        assert_eq!(search.step().unwrap(), SearchStatus::Found);
    }

    #[test]
    fn introspection() {
        let mut search = LineSearch::new(Line { n: 4 }, Blind);
        search.solve(Stop(0), Stop(2)).unwrap();
        assert!(search.is_visited(&Stop(1)));
        assert_eq!(search.local_goal(&Stop(1)), 1);
        // Reached through the shortcut, never expanded.
        assert!(!search.is_visited(&Stop(4)));
        assert_eq!(search.local_goal(&Stop(4)), 100);
        assert_eq!(search.local_goal(&Stop(3)), u32::MAX);
        assert_eq!(search.discovered(), 4);

        let mut out = Vec::<u8>::new();
        search.write_memory_stats(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Expanded nodes: 3"));
    }
}
