use thiserror::Error;

/// Why a search could not produce an answer.
///
/// States are carried pre-formatted so the error stays free of the search's
/// type parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Start state {0} is not part of the search space")]
    InvalidStart(String),
    #[error("Goal state {0} is not part of the search space")]
    InvalidGoal(String),
    #[error("Start {start} can't reach goal {goal}: their tile parities differ")]
    IllegalShuffle { start: String, goal: String },
    #[error("No path from {start} to {goal}")]
    NoPathFound { start: String, goal: String },
    #[error("The search was stepped before it began")]
    NotStarted,
    #[error("Gave up after expanding {expanded} nodes")]
    OutOfBudget { expanded: usize },
}
