use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anstream::eprintln;
use anstream::print;
use anstream::println;
use clap::Parser;
use clap::Subcommand;
use owo_colors::OwoColorize;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use thiserror::Error;

use bestfirst::error::SearchError;
use bestfirst::problems::grid::GridCell;
use bestfirst::problems::grid::GridHeuristic;
use bestfirst::problems::grid::GridParseError;
use bestfirst::problems::grid::GridProblem;
use bestfirst::problems::grid::GridSearch;
use bestfirst::problems::puzzle::PuzzleManhattan;
use bestfirst::problems::puzzle::PuzzleSearch;
use bestfirst::problems::puzzle::PuzzleSpace;
use bestfirst::problems::puzzle::PuzzleState;
use bestfirst::problems::puzzle::PuzzleStateError;
use bestfirst::space::Space;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(long_version = bestfirst::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print node and open list usage after solving
    #[arg(long, global = true, env = "BESTFIRST_STATS")]
    pub stats: bool,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find a path between `S` and `G` on a map
    ///
    /// Maps use `.` or space for open cells and `#` for obstacles.
    Grid {
        map: PathBuf,

        #[arg(long, value_enum, env = "BESTFIRST_HEURISTIC", default_value_t = GridHeuristic::default())]
        heuristic: GridHeuristic,

        /// Only show the first quarter of the path
        #[arg(long)]
        hint: bool,

        /// Mark the cells the search expanded
        #[arg(long)]
        visited: bool,
    },
    /// Solve a sliding-tile puzzle
    Puzzle {
        /// Side of a shuffled board. 4x4 boards need `--tiles`
        #[arg(long, default_value_t = 3u8, value_parser = clap::value_parser!(u8).range(2..=3))]
        size: u8,

        /// Seed used to shuffle the board
        #[arg(long, env = "BESTFIRST_SEED", default_value_t = 0u64)]
        seed: u64,

        /// Starting board, row by row with 0 as the blank (overrides --seed)
        #[arg(long, value_delimiter = ',')]
        tiles: Option<Vec<u8>>,

        /// Only show the first quarter of the solution
        #[arg(long)]
        hint: bool,

        /// Print every board along the solution
        #[arg(long)]
        boards: bool,

        /// Give up after expanding this many nodes
        #[arg(long, env = "BESTFIRST_BUDGET", default_value_t = 2_000_000usize)]
        budget: usize,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Can't read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Bad map {path:?}: {source}")]
    Map {
        path: PathBuf,
        source: GridParseError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Puzzle(#[from] PuzzleStateError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

fn render_grid(problem: &GridProblem, search: &GridSearch, route: &[GridCell], visited: bool) {
    let space = problem.space();
    let (w, _) = space.dimensions();
    for cell in space.cells() {
        if cell == problem.start() {
            print!("{}", "S".green().bold());
        } else if cell == problem.goal() {
            print!("{}", "G".red().bold());
        } else if space.is_obstacle(&cell) {
            print!("{}", "█".dimmed());
        } else if route.contains(&cell) {
            print!("{}", "*".yellow().bold());
        } else if visited && search.is_visited(&cell) {
            print!("{}", "·".blue());
        } else {
            print!(" ");
        }
        if cell.x() + 1 == w {
            println!();
        }
    }
}

fn grid(
    map: PathBuf,
    heuristic: GridHeuristic,
    hint: bool,
    visited: bool,
    stats: bool,
) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&map).map_err(|source| CliError::Read {
        path: map.clone(),
        source,
    })?;
    let problem = GridProblem::try_from(text.as_str())
        .map_err(|source| CliError::Map { path: map, source })?;
    let (w, h) = problem.space().dimensions();
    println!(
        "{} {w}x{h} from {} to {} (straight-line distance {:.2})",
        "Grid".bold(),
        problem.start().green(),
        problem.goal().red(),
        problem.start().euclidean(&problem.goal()),
    );
    println!("Heuristic: {}", heuristic.cyan());
    if !heuristic.is_admissible() {
        println!(
            "{}",
            "warning: this heuristic overestimates, paths may not be shortest".yellow()
        );
    }

    let mut search = GridSearch::new(problem.space().clone(), heuristic);
    let path = search.solve(problem.start(), problem.goal())?;

    match &path {
        Some(path) => {
            let route = if hint { path.hint() } else { &path.actions[..] };
            render_grid(&problem, &search, route, visited);
            println!(
                "Path: {} moves, distance {}",
                path.len().bold(),
                path.cost.bold()
            );
            if hint {
                let cells: Vec<String> = route.iter().map(ToString::to_string).collect();
                println!("Hint: {}", cells.join(" ").yellow());
            }
        }
        None => {
            render_grid(&problem, &search, &[], visited);
            println!("{}", "No path found".red().bold());
        }
    }
    println!("Expanded {} nodes", search.expanded());

    if stats {
        search.write_memory_stats(std::io::stdout().lock())?;
    }
    Ok(())
}

fn puzzle(
    size: u8,
    seed: u64,
    tiles: Option<Vec<u8>>,
    hint: bool,
    boards: bool,
    budget: usize,
    stats: bool,
) -> Result<(), CliError> {
    let (space, start) = match tiles {
        Some(tiles) => {
            let start = PuzzleState::try_from(tiles.as_slice())?;
            (PuzzleSpace::new(start.size() as u8)?, start)
        }
        None => {
            let space = PuzzleSpace::new(size)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (space, space.shuffle(&mut rng, &space.solved()))
        }
    };
    let goal = space.solved();
    println!("{}", "Start".bold());
    print!("{start}");

    let mut search = PuzzleSearch::new(space, PuzzleManhattan);
    let path = search
        .solve_within(start, goal, budget)?
        .ok_or_else(|| SearchError::NoPathFound {
            start: format!("{start:?}"),
            goal: format!("{goal:?}"),
        })?;
    debug_assert!(space.valid_path(&path));

    let moves = if hint { path.hint() } else { &path.actions[..] };
    let listed: Vec<String> = moves.iter().map(ToString::to_string).collect();
    if hint {
        println!("Hint ({} of {} moves): {}", moves.len(), path.len(), listed.join(" ").yellow());
    } else {
        println!("Solution ({} moves): {}", path.len().bold(), listed.join(" ").yellow());
    }

    if boards {
        let mut board = start;
        for m in moves {
            let Some(next) = space.apply(&board, m) else {
                unreachable!("Solutions replay on their own start");
            };
            board = next;
            println!("{}", m.cyan());
            print!("{board}");
        }
    }
    println!("Expanded {} nodes", search.expanded());

    if stats {
        search.write_memory_stats(std::io::stdout().lock())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.color.write_global();

    let result = match args.command {
        Command::Grid {
            map,
            heuristic,
            hint,
            visited,
        } => grid(map, heuristic, hint, visited, args.stats),
        Command::Puzzle {
            size,
            seed,
            tiles,
            hint,
            boards,
            budget,
        } => puzzle(size, seed, tiles, hint, boards, budget, args.stats),
    };

    match result.and_then(|()| Ok(std::io::stdout().flush()?)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
