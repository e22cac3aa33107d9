use crate::cost::Cost;
use crate::space::State;

/// An estimate of the remaining cost from a state to the goal.
///
/// Heuristics that never overestimate (admissible) keep the search optimal.
/// Returning a constant turns A* into uniform-cost search.
pub trait Heuristic<St, C>: std::fmt::Debug
where
    St: State,
    C: Cost,
{
    fn h(&self, s: &St, goal: &St) -> C;
}

/// No information at all. Plain Dijkstra.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Blind;

impl<St, C> Heuristic<St, C> for Blind
where
    St: State,
    C: Cost,
{
    #[inline(always)]
    fn h(&self, _s: &St, _goal: &St) -> C {
        C::zero()
    }
}
