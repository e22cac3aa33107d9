//! Best-first graph search.
//!
//! A generic A*/Dijkstra engine ([`algorithms::best_first::BestFirstSearch`])
//! that runs over any [`space::Space`], with two spaces built in: an
//! 8-connected grid with togglable obstacles and the sliding-tile puzzle.

use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod error;
pub mod heap_primitives;
pub mod open;

// Search space and costs
// ----------------------
pub mod cost;
pub mod distance;
pub mod heuristic;
pub mod search;
pub mod space;

// Problems
// --------
pub mod problems;

// Algorithms
// ----------
pub mod algorithms;
