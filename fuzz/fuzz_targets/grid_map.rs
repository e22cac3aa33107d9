#![no_main]

use libfuzzer_sys::fuzz_target;

use bestfirst::problems::grid::GridHeuristic;
use bestfirst::problems::grid::GridProblem;
use bestfirst::problems::grid::GridSearch;
use bestfirst::space::Space;

fuzz_target!(|data: &str| {
    let Ok(problem) = GridProblem::try_from(data) else {
        return;
    };
    let (w, h) = problem.space().dimensions();
    if w * h > 64 * 64 {
        return;
    }
    let mut search = GridSearch::new(problem.space().clone(), GridHeuristic::Octile);
    if let Some(path) = search.solve(problem.start(), problem.goal()).unwrap() {
        assert!(problem.space().valid_path(&path));
    }
});
