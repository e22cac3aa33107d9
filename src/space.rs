use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::cost::Cost;
use crate::error::SearchError;
use crate::search::NodeStore;

pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash {}

/// Neighbours of a state, paired with the move that reaches them.
///
/// Both spaces in this crate have at most 8 neighbours per state.
pub type Neighbours<St, A> = SmallVec<[(St, A); 8]>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    pub start: Option<S>,
    pub end: Option<S>,
    pub cost: C,
    pub actions: Vec<A>,
}

impl<S, A, C> Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn new_from_start(start: S) -> Self {
        Self {
            start: Some(start),
            end: Some(start),
            cost: C::zero(),
            actions: vec![],
        }
    }

    #[inline(always)]
    pub fn empty() -> Self {
        Self {
            start: None,
            actions: vec![],
            end: None,
            cost: C::zero(),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs sanity checks
    #[inline(always)]
    pub fn seems_valid(&self) -> bool {
        self.start.is_some() == self.end.is_some() && self.cost.valid()
    }

    #[inline(always)]
    pub fn append(&mut self, last_action: (S, A), c: C) {
        let (s, a) = last_action;
        self.actions.push(a);
        self.end = Some(s);
        self.cost = self.cost.saturating_add(&c);
    }

    /// Reverses the Path, likely making it invalid.
    ///
    /// Useful when naturally reconstructing paths in reverse.
    pub fn reverse(&mut self) {
        (self.end, self.start) = (self.start, self.end);
        self.actions.reverse();
    }

    /// The first quarter of the moves (rounded up).
    ///
    /// Gives partial guidance without revealing the whole solution.
    ///
    /// ```
    /// use bestfirst::space::hint_len;
    /// assert_eq!(hint_len(0), 0);
    /// assert_eq!(hint_len(1), 1);
    /// assert_eq!(hint_len(4), 1);
    /// assert_eq!(hint_len(9), 3);
    /// ```
    pub fn hint(&self) -> &[A] {
        &self.actions[..hint_len(self.actions.len())]
    }
}

/// How many moves a hint reveals out of a solution of `len` moves.
#[inline(always)]
#[must_use]
pub fn hint_len(len: usize) -> usize {
    len.div_ceil(4)
}

impl<S, A, C> std::fmt::Display for Path<S, A, C>
where
    S: State,
    A: Action + std::fmt::Display,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        debug_assert!(self.start.is_none() == self.end.is_none());

        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                write!(f, "Path({}, {:?}:[", self.cost, start)?;
                for (i, a) in self.actions.iter().take(20).enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{a}")?;
                }
                if self.actions.len() > 20 {
                    write!(f, " …")?;
                }
                write!(f, "]:{end:?})")
            }
            (None, None) => write!(f, "Path()"),
            _ => unreachable!("Path::start and Path::end should both be Some or None"),
        }
    }
}

/// A graph the search can walk.
///
/// Spaces generate neighbours on demand, so they cover both explicit graphs
/// (a grid whose cells exist up-front) and implicit ones (puzzle states).
pub trait Space<St, A, C>: std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Where the search keeps its nodes for this space.
    type Nodes: NodeStore<St, A, C>;

    /// Builds an empty node store sized for this space.
    fn nodes(&self) -> Self::Nodes;

    /// Whether `nodes` can still hold this space's states.
    ///
    /// Stores built for an earlier version of the space get rebuilt when
    /// this returns false.
    fn fits(&self, _nodes: &Self::Nodes) -> bool {
        true
    }

    fn apply(&self, s: &St, a: &A) -> Option<St>;

    /// Cost of taking `a` from `s`.
    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }
    /// Expands a State
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;
    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    /// Whether a state must not be entered right now.
    ///
    /// Checked on every relaxation so changes apply without rebuilding
    /// neighbour lists.
    fn blocked(&self, _s: &St) -> bool {
        false
    }

    /// Rejects start/goal pairs before any search work happens.
    fn check_endpoints(&self, start: &St, goal: &St) -> Result<(), SearchError> {
        if !self.valid(start) {
            return Err(SearchError::InvalidStart(format!("{start:?}")));
        }
        if !self.valid(goal) {
            return Err(SearchError::InvalidGoal(format!("{goal:?}")));
        }
        Ok(())
    }

    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        if let Some(start) = p.start {
            // Verify path
            let mut state: St = start;
            for a in &p.actions {
                match self.apply(&state, a) {
                    Some(new_state) => state = new_state,
                    None => return false,
                }
            }
            if let Some(end) = p.end {
                return end == state;
            }
            false
        } else {
            // Empty paths are fine
            *p == Path::<St, A, C>::empty()
        }
    }

    fn size(&self) -> Option<usize> {
        None
    }
}
