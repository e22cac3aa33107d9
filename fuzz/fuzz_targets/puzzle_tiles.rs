#![no_main]

use libfuzzer_sys::fuzz_target;

use bestfirst::error::SearchError;
use bestfirst::problems::puzzle::PuzzleSpace;
use bestfirst::problems::puzzle::PuzzleState;
use bestfirst::space::Space;

fuzz_target!(|data: &[u8]| {
    let Ok(start) = PuzzleState::try_from(data) else {
        return;
    };
    // 15-puzzles may take too long to solve.
    if start.size() > 3 {
        return;
    }
    let Ok(space) = PuzzleSpace::new(start.size() as u8) else {
        return;
    };
    let goal = space.solved();
    match space.solve(start, goal) {
        Ok(path) => assert!(space.valid_path(&path)),
        Err(SearchError::IllegalShuffle { .. }) => assert!(!start.is_solvable_towards(&goal)),
        Err(e) => panic!("{e}"),
    }
});
