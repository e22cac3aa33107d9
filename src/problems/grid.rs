//! An 8-connected grid with togglable obstacles.
//!
//! Every cell is a node, allocated once per space and reused across solves.
//! Moves are labelled with the cell they lead to, and cost their Euclidean
//! length (1 orthogonally, √2 diagonally).

use derive_more::Display;
use nonmax::NonMaxU32;
use thiserror::Error;

use crate::algorithms::best_first::BestFirstSearch;
use crate::distance::Distance;
use crate::heuristic::Heuristic;
use crate::search::NodeIndex;
use crate::search::NodeStore;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Neighbours;
use crate::space::Space;
use crate::space::State;

const MAX_ELEMENTS_DISPLAYED: usize = 80;

pub(crate) type CoordIntrinsic = u32;
pub type Coord = NonMaxU32;

/// A search over a grid.
pub type GridSearch = BestFirstSearch<GridHeuristic, GridSpace, GridCell, GridCell, Distance>;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("({x},{y})")]
pub struct GridCell {
    pub(crate) x: Coord,
    pub(crate) y: Coord,
}

impl GridCell {
    pub fn new(x: usize, y: usize) -> Option<GridCell> {
        let x = (x < CoordIntrinsic::MAX as usize).then_some(x as CoordIntrinsic)?;
        let y = (y < CoordIntrinsic::MAX as usize).then_some(y as CoordIntrinsic)?;

        Some(GridCell {
            x: Coord::new(x)?,
            y: Coord::new(y)?,
        })
    }

    #[inline(always)]
    pub fn x(&self) -> usize {
        self.x.get() as usize
    }
    #[inline(always)]
    pub fn y(&self) -> usize {
        self.y.get() as usize
    }

    #[inline(always)]
    fn deltas(&self, other: &GridCell) -> (f64, f64) {
        let dx = self.x.get().abs_diff(other.x.get()) as f64;
        let dy = self.y.get().abs_diff(other.y.get()) as f64;
        (dx, dy)
    }

    /// Straight-line distance.
    pub fn euclidean(&self, other: &GridCell) -> f64 {
        let (dx, dy) = self.deltas(other);
        (dx * dx + dy * dy).sqrt()
    }

    /// Straight-line distance, squared.
    pub fn squared_euclidean(&self, other: &GridCell) -> f64 {
        let (dx, dy) = self.deltas(other);
        dx * dx + dy * dy
    }

    /// The distance of maximising useful diagonals
    pub fn octile(&self, other: &GridCell) -> f64 {
        let (dx, dy) = self.deltas(other);
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        lo * std::f64::consts::SQRT_2 + (hi - lo)
    }

    /// Whether `other` is one king move away.
    pub fn is_adjacent(&self, other: &GridCell) -> bool {
        let dx = self.x.get().abs_diff(other.x.get());
        let dy = self.y.get().abs_diff(other.y.get());
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}
impl State for GridCell {}
impl Action for GridCell {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridTile {
    #[display("░")]
    Open,
    #[display("█")]
    Obstacle,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridTileParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
}

impl std::convert::TryFrom<char> for GridTile {
    type Error = GridTileParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            ' ' | '.' | '░' => Ok(GridTile::Open),
            '#' | '█' => Ok(GridTile::Obstacle),
            ch => Err(GridTileParseError::InvalidCharacter(ch)),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GridSpace {
    width: usize,
    height: usize,
    /// Row-major tiles, `y * width + x`.
    tiles: Vec<GridTile>,
}

impl GridSpace {
    /// An obstacle-free grid.
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert!(width < CoordIntrinsic::MAX as usize);
        debug_assert!(height < CoordIntrinsic::MAX as usize);
        Self {
            width,
            height,
            tiles: vec![GridTile::Open; width * height],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline(always)]
    pub fn index(&self, cell: &GridCell) -> Option<usize> {
        (cell.x() < self.width && cell.y() < self.height).then(|| cell.y() * self.width + cell.x())
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).filter_map(move |x| GridCell::new(x, y)))
    }

    pub fn at(&self, cell: &GridCell) -> Option<GridTile> {
        self.index(cell).map(|i| self.tiles[i])
    }

    pub fn is_obstacle(&self, cell: &GridCell) -> bool {
        self.at(cell) == Some(GridTile::Obstacle)
    }

    /// Returns whether the cell is inside the grid.
    pub fn set_obstacle(&mut self, cell: &GridCell, obstacle: bool) -> bool {
        match self.index(cell) {
            Some(i) => {
                self.tiles[i] = if obstacle {
                    GridTile::Obstacle
                } else {
                    GridTile::Open
                };
                true
            }
            None => false,
        }
    }

    /// Flips a cell, returning whether it's now an obstacle.
    pub fn toggle_obstacle(&mut self, cell: &GridCell) -> Option<bool> {
        let obstacle = !self.is_obstacle(cell);
        self.set_obstacle(cell, obstacle).then_some(obstacle)
    }

    pub fn clear_obstacles(&mut self) {
        self.tiles.fill(GridTile::Open);
    }

    pub fn obstacle_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| **t == GridTile::Obstacle)
            .count()
    }

    /// Turns each cell into an obstacle with probability `density`, except
    /// for the cells in `keep`.
    pub fn randomize_obstacles<R: rand::Rng>(&mut self, r: &mut R, density: f64, keep: &[GridCell]) {
        let density = density.clamp(0.0, 1.0);
        for i in 0..self.tiles.len() {
            self.tiles[i] = if r.random_bool(density) {
                GridTile::Obstacle
            } else {
                GridTile::Open
            };
        }
        for cell in keep {
            self.set_obstacle(cell, false);
        }
    }
}

impl Space<GridCell, GridCell, Distance> for GridSpace {
    type Nodes = GridNodes;

    fn nodes(&self) -> GridNodes {
        GridNodes::new(self)
    }

    fn fits(&self, nodes: &GridNodes) -> bool {
        nodes.dimensions() == self.dimensions()
    }

    #[inline(always)]
    fn apply(&self, cell: &GridCell, to: &GridCell) -> Option<GridCell> {
        (cell.is_adjacent(to) && self.valid(to) && !self.is_obstacle(to)).then_some(*to)
    }

    #[inline(always)]
    fn cost(&self, cell: &GridCell, to: &GridCell) -> Distance {
        debug_assert!(cell.is_adjacent(to));
        if cell.x != to.x && cell.y != to.y {
            Distance::DIAGONAL
        } else {
            Distance::ORTHOGONAL
        }
    }

    /// Gets the open cells around a given position.
    fn neighbours(&self, cell: &GridCell) -> Neighbours<GridCell, GridCell> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("StateExpansion");

        let mut v = Neighbours::<GridCell, GridCell>::new();
        let (max_x, max_y) = (self.width as CoordIntrinsic, self.height as CoordIntrinsic);

        let prev = CoordIntrinsic::MAX;
        let same = 0 as CoordIntrinsic;
        let next = 1 as CoordIntrinsic;

        for (dx, dy) in [
            // Orthogonal
            (same, prev),
            (same, next),
            (prev, same),
            (next, same),
            // Diagonal
            (prev, prev),
            (prev, next),
            (next, prev),
            (next, next),
        ] {
            let new_x = cell.x.get().wrapping_add(dx);
            let new_y = cell.y.get().wrapping_add(dy);
            if new_x < max_x && new_y < max_y {
                let (Some(x), Some(y)) = (Coord::new(new_x), Coord::new(new_y)) else {
                    continue;
                };
                let s = GridCell { x, y };
                if !self.is_obstacle(&s) {
                    v.push((s, s));
                }
            }
        }
        v
    }

    #[inline(always)]
    fn valid(&self, cell: &GridCell) -> bool {
        self.index(cell).is_some()
    }

    #[inline(always)]
    fn blocked(&self, cell: &GridCell) -> bool {
        self.is_obstacle(cell)
    }

    fn size(&self) -> Option<usize> {
        Some(self.tiles.len())
    }
}

impl std::fmt::Display for GridSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Grid({}x{}):", self.width, self.height)?;
        for line in self.tiles.chunks(self.width.max(1)).take(MAX_ELEMENTS_DISPLAYED) {
            for tile in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{tile}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for GridSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Grid{:?}", self.dimensions())
    }
}

/// One pre-allocated node per grid cell.
pub struct GridNodes {
    width: usize,
    height: usize,
    nodes: Vec<SearchTreeNode<GridCell, GridCell, Distance>>,
}

impl GridNodes {
    pub fn new(space: &GridSpace) -> Self {
        let (width, height) = space.dimensions();
        Self {
            width,
            height,
            nodes: space.cells().map(SearchTreeNode::new).collect(),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

impl NodeStore<GridCell, GridCell, Distance> for GridNodes {
    fn reset(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset();
        }
    }

    #[inline(always)]
    fn find(&self, cell: &GridCell) -> Option<NodeIndex> {
        (cell.x() < self.width && cell.y() < self.height)
            .then(|| NodeIndex::new(cell.y() * self.width + cell.x()))
    }

    #[inline(always)]
    fn fetch(&mut self, cell: &GridCell) -> NodeIndex {
        match self.find(cell) {
            Some(i) => i,
            None => unreachable!("{cell} is outside the {}x{} grid", self.width, self.height),
        }
    }

    #[inline(always)]
    fn as_slice(&self) -> &[SearchTreeNode<GridCell, GridCell, Distance>] {
        &self.nodes
    }
    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [SearchTreeNode<GridCell, GridCell, Distance>] {
        &mut self.nodes
    }
}

impl std::fmt::Debug for GridNodes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "GridNodes({}x{})", self.width, self.height)
    }
}

/// Heuristics for grids.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, clap::ValueEnum)]
pub enum GridHeuristic {
    /// Constant 1. Orders nodes like uniform-cost search.
    #[display("Dijkstra")]
    Dijkstra,
    /// Squared straight-line distance.
    ///
    /// Overestimates, so paths may come out longer than the shortest one.
    #[default]
    #[display("A* (squared Euclidean)")]
    SquaredEuclidean,
    /// Straight-line distance.
    #[display("A* (Euclidean)")]
    Euclidean,
    /// Diagonal distance, the tightest admissible estimate on this grid.
    #[display("A* (octile)")]
    Octile,
}

impl GridHeuristic {
    /// Whether paths found with this heuristic are guaranteed shortest.
    pub fn is_admissible(&self) -> bool {
        !matches!(self, GridHeuristic::SquaredEuclidean)
    }
}

impl Heuristic<GridCell, Distance> for GridHeuristic {
    #[inline(always)]
    fn h(&self, cell: &GridCell, goal: &GridCell) -> Distance {
        match self {
            GridHeuristic::Dijkstra => Distance::ORTHOGONAL,
            GridHeuristic::SquaredEuclidean => Distance::new(cell.squared_euclidean(goal)),
            GridHeuristic::Euclidean => Distance::new(cell.euclidean(goal)),
            GridHeuristic::Octile => Distance::new(cell.octile(goal)),
        }
    }
}

/// A grid with a start and a goal cell.
#[derive(Clone, Debug)]
pub struct GridProblem {
    space: GridSpace,
    start: GridCell,
    goal: GridCell,
}

impl GridProblem {
    pub fn new(space: GridSpace, start: GridCell, goal: GridCell) -> Self {
        Self { space, start, goal }
    }

    pub fn space(&self) -> &GridSpace {
        &self.space
    }
    pub fn space_mut(&mut self) -> &mut GridSpace {
        &mut self.space
    }
    pub fn start(&self) -> GridCell {
        self.start
    }
    pub fn goal(&self) -> GridCell {
        self.goal
    }

    pub fn into_parts(self) -> (GridSpace, GridCell, GridCell) {
        (self.space, self.start, self.goal)
    }

    /// Picks a random start and goal among the open cells.
    pub fn randomize<R: rand::Rng>(&mut self, r: &mut R) -> bool {
        let open: Vec<GridCell> = self
            .space
            .cells()
            .filter(|c| !self.space.is_obstacle(c))
            .collect();
        if open.is_empty() {
            return false;
        }
        self.start = open[r.random_range(0..open.len())];
        self.goal = open[r.random_range(0..open.len())];
        true
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum GridProblemCell {
    Tile(GridTile),
    #[display("S")]
    Start,
    #[display("G")]
    Goal,
}

impl std::convert::TryFrom<char> for GridProblemCell {
    type Error = GridTileParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'S' => Ok(GridProblemCell::Start),
            'G' => Ok(GridProblemCell::Goal),
            ch => Ok(GridProblemCell::Tile(GridTile::try_from(ch)?)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Row {y} has {found} cells, expected {expected}")]
    RaggedRow {
        y: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid cell {e} found at ({x},{y})")]
    InvalidCell {
        e: GridTileParseError,
        x: usize,
        y: usize,
    },
    #[error("Grid is too large ({x}x{y})")]
    TooLarge { x: usize, y: usize },
    #[error("No start ('S') cell")]
    MissingStart,
    #[error("No goal ('G') cell")]
    MissingGoal,
    #[error("Second start found at ({x},{y})")]
    DuplicateStart { x: usize, y: usize },
    #[error("Second goal found at ({x},{y})")]
    DuplicateGoal { x: usize, y: usize },
}

impl std::convert::TryFrom<&str> for GridProblem {
    type Error = GridParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = s.lines().collect();

        if lines.is_empty() || lines[0].is_empty() {
            return Err(GridParseError::EmptyInput);
        }

        let max_x = lines[0].chars().count();
        let max_y = lines.len();
        if GridCell::new(max_x, max_y).is_none() {
            return Err(GridParseError::TooLarge { x: max_x, y: max_y });
        }
        let mut space = GridSpace::new(max_x, max_y);
        let mut start: Option<GridCell> = None;
        let mut goal: Option<GridCell> = None;

        for (y, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != max_x {
                return Err(GridParseError::RaggedRow {
                    y,
                    expected: max_x,
                    found,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                let cell = GridProblemCell::try_from(ch)
                    .map_err(|e| GridParseError::InvalidCell { e, x, y })?;
                let Some(here) = GridCell::new(x, y) else {
                    return Err(GridParseError::TooLarge { x: max_x, y: max_y });
                };

                match cell {
                    GridProblemCell::Start => {
                        if start.replace(here).is_some() {
                            return Err(GridParseError::DuplicateStart { x, y });
                        }
                    }
                    GridProblemCell::Goal => {
                        if goal.replace(here).is_some() {
                            return Err(GridParseError::DuplicateGoal { x, y });
                        }
                    }
                    GridProblemCell::Tile(tile) => {
                        space.set_obstacle(&here, tile == GridTile::Obstacle);
                    }
                }
            }
        }

        Ok(GridProblem {
            space,
            start: start.ok_or(GridParseError::MissingStart)?,
            goal: goal.ok_or(GridParseError::MissingGoal)?,
        })
    }
}

impl std::fmt::Display for GridProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (w, h) = self.space.dimensions();
        writeln!(
            f,
            "GridProblem({w}x{h}) (s:{}, g:{}):",
            self.start, self.goal
        )?;
        for cell in self.space.cells() {
            if cell.x() >= MAX_ELEMENTS_DISPLAYED || cell.y() >= MAX_ELEMENTS_DISPLAYED {
                continue;
            }
            match (cell == self.start, cell == self.goal) {
                (true, true) => write!(f, "!")?,
                (true, false) => write!(f, "S")?,
                (false, true) => write!(f, "G")?,
                (false, false) => match self.space.at(&cell) {
                    Some(tile) => write!(f, "{tile}")?,
                    None => unreachable!("cells() only yields cells inside the grid"),
                },
            }
            if cell.x() + 1 == w {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
