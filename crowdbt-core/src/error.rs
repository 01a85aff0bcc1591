/// Error types for crowdbt-core.
///
/// Every error is raised while validating input, before the optimizer runs.
/// Hitting the iteration cap is deliberately absent from this list.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimateError {
    /// No annotators, or no edges across all annotators. The object count
    /// cannot be inferred.
    #[error("no preference data: the corpus contains no edges")]
    EmptyCorpus,

    /// An edge references a negative object index.
    #[error("invalid edge ({loser}, {winner}) from annotator {annotator}: object indices must be non-negative")]
    InvalidEdge {
        annotator: usize,
        loser: i64,
        winner: i64,
    },

    /// An edge index implies more objects than the solver accepts.
    #[error("invalid edge ({loser}, {winner}) from annotator {annotator}: object indices must be below {limit}")]
    IndexTooLarge {
        annotator: usize,
        loser: i64,
        winner: i64,
        limit: usize,
    },

    /// Per-annotator accuracies were supplied for a different number of
    /// annotators than the corpus has.
    #[error("accuracy vector has {actual} entries but the corpus has {expected} annotators")]
    AccuracyMismatch { expected: usize, actual: usize },

    /// A hyperparameter is outside its valid range.
    #[error("invalid value for {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    /// The solver failed structurally (e.g. a NaN gradient). Running out of
    /// iterations is not reported here.
    #[error("solver failure: {0}")]
    Solver(String),
}

pub type EstimateResult<T> = Result<T, EstimateError>;
