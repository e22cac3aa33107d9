//! The sliding-tile puzzle (8-puzzle and friends).
//!
//! States are permutations of `0..size²` laid out row by row, with `0` as
//! the blank. Each move slides one tile next to the blank into it, at a cost
//! of 1. The state graph is implicit, so nodes are only created as the
//! search discovers them.

use derive_more::Display;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::algorithms::best_first::BestFirstSearch;
use crate::error::SearchError;
use crate::heuristic::Heuristic;
use crate::search::HashedNodes;
use crate::space::Action;
use crate::space::Neighbours;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

pub const MIN_SIZE: u8 = 2;
pub const MAX_SIZE: u8 = 4;
const MAX_TILES: usize = (MAX_SIZE as usize) * (MAX_SIZE as usize);

const BLANK: u8 = 0;

pub type PuzzleCost = u32;
pub type PuzzlePath = Path<PuzzleState, PuzzleMove, PuzzleCost>;
pub type PuzzleSearch =
    BestFirstSearch<PuzzleManhattan, PuzzleSpace, PuzzleState, PuzzleMove, PuzzleCost>;

/// Direction a tile slides towards.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Slide {
    #[display("↑")]
    Up,
    #[display("↓")]
    Down,
    #[display("←")]
    Left,
    #[display("→")]
    Right,
}

impl Slide {
    pub fn opposite(&self) -> Slide {
        match self {
            Slide::Up => Slide::Down,
            Slide::Down => Slide::Up,
            Slide::Left => Slide::Right,
            Slide::Right => Slide::Left,
        }
    }
}

/// A tile, and where it slid.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{tile}{slide}")]
pub struct PuzzleMove {
    pub tile: u8,
    pub slide: Slide,
}
impl Action for PuzzleMove {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzzleStateError {
    #[error("{len} tiles can't be laid out as a square board")]
    WrongLength { len: usize },
    #[error("Unsupported board size {size}x{size} (expected {MIN_SIZE}..={MAX_SIZE})")]
    UnsupportedSize { size: usize },
    #[error("Tile {tile} at position {position} is out of range")]
    BadTile { tile: u8, position: usize },
    #[error("Tile {tile} appears more than once")]
    DuplicateTile { tile: u8 },
}

/// A board configuration.
///
/// Boards are stored inline; positions past `size²` are always zero so the
/// derived `Eq` and `Hash` only see the meaningful tiles.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleState {
    size: u8,
    tiles: [u8; MAX_TILES],
}
impl State for PuzzleState {}

fn check_size(size: usize) -> Result<u8, PuzzleStateError> {
    if (MIN_SIZE as usize..=MAX_SIZE as usize).contains(&size) {
        Ok(size as u8)
    } else {
        Err(PuzzleStateError::UnsupportedSize { size })
    }
}

impl PuzzleState {
    /// The board with the blank first and every other tile in order.
    pub fn solved(size: u8) -> Result<Self, PuzzleStateError> {
        let size = check_size(size as usize)?;
        let mut tiles = [BLANK; MAX_TILES];
        let n = (size as usize) * (size as usize);
        for (i, t) in tiles.iter_mut().take(n).enumerate() {
            *t = i as u8;
        }
        Ok(Self { size, tiles })
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Number of positions on the board, blank included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.size() * self.size()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline(always)]
    pub fn tiles(&self) -> &[u8] {
        &self.tiles[..self.len()]
    }

    #[inline(always)]
    pub fn tile_at(&self, position: usize) -> Option<u8> {
        self.tiles().get(position).copied()
    }

    pub fn position_of(&self, tile: u8) -> Option<usize> {
        self.tiles().iter().position(|t| *t == tile)
    }

    #[inline(always)]
    pub fn blank(&self) -> usize {
        match self.position_of(BLANK) {
            Some(b) => b,
            None => unreachable!("Every board holds a blank"),
        }
    }

    /// Position -> (row, column)
    #[inline(always)]
    fn coords(&self, position: usize) -> (usize, usize) {
        (position / self.size(), position % self.size())
    }

    /// Position of each tile, indexed by tile.
    fn positions(&self) -> [u8; MAX_TILES] {
        let mut positions = [0u8; MAX_TILES];
        for (p, t) in self.tiles().iter().enumerate() {
            positions[*t as usize] = p as u8;
        }
        positions
    }

    /// Position of the tile that would slide into the blank moving towards
    /// `slide`, if there's one.
    #[inline(always)]
    fn source(&self, slide: Slide) -> Option<usize> {
        let b = self.blank();
        let (r, c) = self.coords(b);
        let size = self.size();
        match slide {
            Slide::Down => (r > 0).then(|| b - size),
            Slide::Up => (r + 1 < size).then(|| b + size),
            Slide::Right => (c > 0).then(|| b - 1),
            Slide::Left => (c + 1 < size).then(|| b + 1),
        }
    }

    /// Swaps the blank with the tile at `position`.
    #[inline(always)]
    fn swap_blank(&self, position: usize) -> Self {
        let mut next = *self;
        next.tiles.swap(self.blank(), position);
        next
    }

    fn slide_towards(&self, slide: Slide) -> Option<(PuzzleState, PuzzleMove)> {
        let position = self.source(slide)?;
        let tile = self.tiles[position];
        Some((self.swap_blank(position), PuzzleMove { tile, slide }))
    }

    /// Slides `tile` into the blank, if they are next to each other.
    pub fn slide(&self, tile: u8) -> Option<(PuzzleState, PuzzleMove)> {
        if tile == BLANK {
            return None;
        }
        let position = self.position_of(tile)?;
        [Slide::Down, Slide::Up, Slide::Right, Slide::Left]
            .into_iter()
            .find(|s| self.source(*s) == Some(position))
            .and_then(|s| self.slide_towards(s))
    }

    /// Slides whichever tile can move towards `slide`, or else the one that
    /// can move the opposite way.
    pub fn try_move(&self, slide: Slide) -> Option<(PuzzleState, PuzzleMove)> {
        self.slide_towards(slide)
            .or_else(|| self.slide_towards(slide.opposite()))
    }

    /// Whether some sequence of slides turns this board into `goal`.
    ///
    /// Every slide is a transposition with the blank and moves the blank by
    /// one step, so the parity of the permutation between both boards must
    /// match the parity of the blank's Manhattan displacement.
    pub fn is_solvable_towards(&self, goal: &PuzzleState) -> bool {
        if self.size != goal.size {
            return false;
        }
        let n = self.len();
        let goal_positions = goal.positions();

        // Cycle count of `position here -> position in goal`.
        let mut seen = [false; MAX_TILES];
        let mut cycles = 0usize;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            cycles += 1;
            let mut p = start;
            while !seen[p] {
                seen[p] = true;
                p = goal_positions[self.tiles[p] as usize] as usize;
            }
        }
        let permutation_parity = (n - cycles) % 2;

        let (r, c) = self.coords(self.blank());
        let (gr, gc) = goal.coords(goal.blank());
        let blank_parity = (r.abs_diff(gr) + c.abs_diff(gc)) % 2;

        permutation_parity == blank_parity
    }

    /// Sum of the Manhattan distances of the non-blank tiles to where `goal`
    /// has them.
    pub fn manhattan(&self, goal: &PuzzleState) -> PuzzleCost {
        let goal_positions = goal.positions();
        let mut sum = 0;
        for (p, t) in self.tiles().iter().enumerate() {
            if *t == BLANK {
                continue;
            }
            let (r, c) = self.coords(p);
            let (gr, gc) = goal.coords(goal_positions[*t as usize] as usize);
            sum += (r.abs_diff(gr) + c.abs_diff(gc)) as PuzzleCost;
        }
        sum
    }
}

impl std::convert::TryFrom<&[u8]> for PuzzleState {
    type Error = PuzzleStateError;

    fn try_from(tiles: &[u8]) -> Result<Self, Self::Error> {
        let len = tiles.len();
        let size = len.isqrt();
        if size * size != len {
            return Err(PuzzleStateError::WrongLength { len });
        }
        let size = check_size(size)?;

        let mut seen = [false; MAX_TILES];
        let mut state = Self {
            size,
            tiles: [BLANK; MAX_TILES],
        };
        for (position, tile) in tiles.iter().enumerate() {
            let t = *tile as usize;
            if t >= len {
                return Err(PuzzleStateError::BadTile {
                    tile: *tile,
                    position,
                });
            }
            if std::mem::replace(&mut seen[t], true) {
                return Err(PuzzleStateError::DuplicateTile { tile: *tile });
            }
            state.tiles[position] = *tile;
        }
        Ok(state)
    }
}

impl std::fmt::Display for PuzzleState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.tiles().chunks(self.size()) {
            for (i, t) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                match *t {
                    BLANK => write!(f, " .")?,
                    t => write!(f, "{t:>2}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PuzzleState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Puzzle{:?}", self.tiles())
    }
}

/// All boards of a given size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PuzzleSpace {
    size: u8,
}

impl PuzzleSpace {
    pub fn new(size: u8) -> Result<Self, PuzzleStateError> {
        Ok(Self {
            size: check_size(size as usize)?,
        })
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// The default goal, see `PuzzleState::solved`.
    pub fn solved(&self) -> PuzzleState {
        match PuzzleState::solved(self.size) {
            Ok(s) => s,
            Err(e) => unreachable!("Spaces only hold supported sizes: {e}"),
        }
    }

    /// A uniformly random board that can reach `goal`.
    pub fn shuffle<R: rand::Rng>(&self, r: &mut R, goal: &PuzzleState) -> PuzzleState {
        debug_assert_eq!(goal.size(), self.size());
        let mut state = *goal;
        let n = state.len();
        loop {
            state.tiles[..n].shuffle(r);
            if state.is_solvable_towards(goal) {
                return state;
            }
            log::trace!("Reshuffling unsolvable {state:?}");
        }
    }

    /// Solves a puzzle with A* under the Manhattan heuristic.
    ///
    /// Solvable puzzles always have an answer, so an exhausted search is an
    /// error here.
    pub fn solve(&self, start: PuzzleState, goal: PuzzleState) -> Result<PuzzlePath, SearchError> {
        let mut search = PuzzleSearch::new(*self, PuzzleManhattan);
        match search.solve(start, goal)? {
            Some(path) => Ok(path),
            None => {
                log::error!(
                    "Exhausted {} states without reaching {goal:?} from {start:?}",
                    search.expanded()
                );
                Err(SearchError::NoPathFound {
                    start: format!("{start:?}"),
                    goal: format!("{goal:?}"),
                })
            }
        }
    }

    /// The first few moves of a shortest solution.
    pub fn hint(&self, start: PuzzleState, goal: PuzzleState) -> Result<Vec<PuzzleMove>, SearchError> {
        Ok(self.solve(start, goal)?.hint().to_vec())
    }
}

impl Space<PuzzleState, PuzzleMove, PuzzleCost> for PuzzleSpace {
    type Nodes = HashedNodes<PuzzleState, PuzzleMove, PuzzleCost>;

    fn nodes(&self) -> Self::Nodes {
        HashedNodes::new()
    }

    fn apply(&self, s: &PuzzleState, m: &PuzzleMove) -> Option<PuzzleState> {
        if m.tile == BLANK {
            return None;
        }
        let position = s.source(m.slide)?;
        (s.tiles[position] == m.tile).then(|| s.swap_blank(position))
    }

    fn neighbours(&self, s: &PuzzleState) -> Neighbours<PuzzleState, PuzzleMove> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("StateExpansion");

        [Slide::Down, Slide::Up, Slide::Right, Slide::Left]
            .into_iter()
            .filter_map(|slide| s.slide_towards(slide))
            .collect()
    }

    #[inline(always)]
    fn valid(&self, s: &PuzzleState) -> bool {
        s.size == self.size
    }

    fn check_endpoints(&self, start: &PuzzleState, goal: &PuzzleState) -> Result<(), SearchError> {
        if !self.valid(start) {
            return Err(SearchError::InvalidStart(format!("{start:?}")));
        }
        if !self.valid(goal) {
            return Err(SearchError::InvalidGoal(format!("{goal:?}")));
        }
        if !start.is_solvable_towards(goal) {
            return Err(SearchError::IllegalShuffle {
                start: format!("{start:?}"),
                goal: format!("{goal:?}"),
            });
        }
        Ok(())
    }
}

/// Manhattan distance of every tile but the blank. Admissible and consistent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PuzzleManhattan;

impl Heuristic<PuzzleState, PuzzleCost> for PuzzleManhattan {
    #[inline(always)]
    fn h(&self, s: &PuzzleState, goal: &PuzzleState) -> PuzzleCost {
        s.manhattan(goal)
    }
}
