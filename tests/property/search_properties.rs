use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use bestfirst::algorithms::best_first::SearchStatus;
use bestfirst::distance::Distance;
use bestfirst::problems::grid::GridCell;
use bestfirst::problems::grid::GridHeuristic;
use bestfirst::problems::grid::GridSearch;
use bestfirst::problems::grid::GridSpace;
use bestfirst::space::Space;
use bestfirst::space::hint_len;

prop_compose! {
    // A random grid with open start and goal cells.
    fn grid_problem()(w in 2usize..16, h in 2usize..16)
        (sx in 0..w, sy in 0..h, gx in 0..w, gy in 0..h,
         seed in any::<u64>(), density in 0.0f64..0.45,
         w in Just(w), h in Just(h))
        -> (GridSpace, GridCell, GridCell) {
        let start = GridCell::new(sx, sy).unwrap();
        let goal = GridCell::new(gx, gy).unwrap();
        let mut space = GridSpace::new(w, h);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        space.randomize_obstacles(&mut rng, density, &[start, goal]);
        (space, start, goal)
    }
}

fn heuristics() -> impl Strategy<Value = GridHeuristic> {
    prop_oneof![
        Just(GridHeuristic::Dijkstra),
        Just(GridHeuristic::SquaredEuclidean),
        Just(GridHeuristic::Euclidean),
        Just(GridHeuristic::Octile),
    ]
}

proptest! {
    #[test]
    fn start_is_goal_gives_empty_path((space, start, _goal) in grid_problem(), heuristic in heuristics()) {
        let mut search = GridSearch::new(space, heuristic);
        let path = search.solve(start, start).unwrap().unwrap();
        prop_assert!(path.is_empty());
        prop_assert_eq!(path.cost, Distance::new(0.0));
        prop_assert_eq!(search.expanded(), 1);
    }

    #[test]
    fn paths_replay_on_the_grid((space, start, goal) in grid_problem(), heuristic in heuristics()) {
        let mut search = GridSearch::new(space.clone(), heuristic);
        if let Some(path) = search.solve(start, goal).unwrap() {
            prop_assert!(space.valid_path(&path));
            prop_assert_eq!(path.start, Some(start));
            prop_assert_eq!(path.end, Some(goal));
            prop_assert!(path.actions.iter().all(|c| !space.is_obstacle(c)));

            let hint = path.hint();
            prop_assert_eq!(hint.len(), hint_len(path.len()));
            prop_assert_eq!(hint, &path.actions[..hint.len()]);
        }
    }

    #[test]
    fn admissible_heuristics_agree_on_cost((space, start, goal) in grid_problem()) {
        let solve = |heuristic| GridSearch::new(space.clone(), heuristic).solve(start, goal).unwrap();
        let dijkstra = solve(GridHeuristic::Dijkstra);
        for heuristic in [GridHeuristic::Euclidean, GridHeuristic::Octile] {
            let astar = solve(heuristic);
            prop_assert_eq!(dijkstra.is_some(), astar.is_some());
            if let (Some(d), Some(a)) = (&dijkstra, &astar) {
                prop_assert!(d.cost.approx_eq(&a.cost), "{} vs {}", d.cost, a.cost);
            }
        }
    }

    #[test]
    fn dijkstra_expands_at_least_as_much((space, start, goal) in grid_problem()) {
        let mut dijkstra = GridSearch::new(space.clone(), GridHeuristic::Dijkstra);
        let mut astar = GridSearch::new(space, GridHeuristic::Euclidean);
        let d = dijkstra.solve(start, goal).unwrap();
        let a = astar.solve(start, goal).unwrap();
        if let (Some(d), Some(a)) = (&d, &a) {
            prop_assert!(d.cost.approx_eq(&a.cost));
        }
        prop_assert!(
            dijkstra.expanded() >= astar.expanded(),
            "Dijkstra {} < A* {}", dijkstra.expanded(), astar.expanded()
        );
    }

    #[test]
    fn reused_solver_matches_a_fresh_one(
        (space, start, goal) in grid_problem(),
        heuristic in heuristics(),
        toggles in prop::collection::vec((0usize..16, 0usize..16), 1..8),
    ) {
        let mut reused = GridSearch::new(space, heuristic);
        reused.solve(start, goal).unwrap();

        for (x, y) in toggles {
            let Some(cell) = GridCell::new(x, y) else { continue };
            if cell == start || cell == goal {
                continue;
            }
            reused.space_mut().toggle_obstacle(&cell);

            let again = reused.solve(start, goal).unwrap();
            let mut fresh = GridSearch::new(reused.space().clone(), heuristic);
            let expected = fresh.solve(start, goal).unwrap();
            prop_assert_eq!(&again, &expected);
            prop_assert_eq!(reused.expanded(), fresh.expanded());
            prop_assert_eq!(reused.discovered(), fresh.discovered());
        }
    }

    #[test]
    fn costs_never_increase_while_stepping((space, start, goal) in grid_problem(), heuristic in heuristics()) {
        let cells: Vec<GridCell> = space.cells().collect();
        let mut search = GridSearch::new(space, heuristic);
        search.begin(start, goal).unwrap();

        let mut before: Vec<Distance> = cells.iter().map(|c| search.local_goal(c)).collect();
        loop {
            let status = search.step().unwrap();
            let after: Vec<Distance> = cells.iter().map(|c| search.local_goal(c)).collect();
            for (b, a) in before.iter().zip(&after) {
                prop_assert!(a <= b);
            }
            before = after;
            if status.is_terminal() {
                break;
            }
        }
        prop_assert_eq!(search.step().unwrap(), search.status());
        prop_assert!(matches!(search.status(), SearchStatus::Found | SearchStatus::Exhausted));
    }

    #[test]
    fn budgeted_runs_match_solve((space, start, goal) in grid_problem(), budget in 1usize..20) {
        let mut whole = GridSearch::new(space.clone(), GridHeuristic::Octile);
        let expected = whole.solve(start, goal).unwrap();

        let mut stepped = GridSearch::new(space, GridHeuristic::Octile);
        stepped.begin(start, goal).unwrap();
        while !stepped.run(Some(budget)).unwrap().is_terminal() {}
        prop_assert_eq!(stepped.path(), expected);
        prop_assert_eq!(stepped.expanded(), whole.expanded());
    }
}

#[test]
fn walled_in_goal_exhausts_without_panicking() {
    let mut space = GridSpace::new(9, 9);
    let goal = GridCell::new(4, 4).unwrap();
    for x in 3..=5 {
        for y in 3..=5 {
            space.set_obstacle(&GridCell::new(x, y).unwrap(), (x, y) != (4, 4));
        }
    }
    for heuristic in [
        GridHeuristic::Dijkstra,
        GridHeuristic::SquaredEuclidean,
        GridHeuristic::Euclidean,
        GridHeuristic::Octile,
    ] {
        let mut search = GridSearch::new(space.clone(), heuristic);
        assert_eq!(search.solve(GridCell::new(0, 0).unwrap(), goal), Ok(None));
        assert_eq!(search.status(), SearchStatus::Exhausted);
        // Every open cell outside the wall was expanded.
        assert_eq!(search.expanded(), 81 - 9);
    }
}
