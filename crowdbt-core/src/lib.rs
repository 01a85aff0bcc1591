/// crowdbt-core: CrowdBT scoring for crowdsourced pairwise preferences.
///
/// Preference graphs → regularized Bradley-Terry likelihood → BFGS → scores or ranks.
/// No IO, no global state. Every hyperparameter is an argument.
///
/// Objects are zero-based indices. An edge `(j, i)` says object `i` was preferred
/// over object `j`; each annotator contributes one set of edges.
///
/// # Quick start
///
/// ```rust
/// use std::collections::BTreeSet;
/// use crowdbt_core::{AnnotatorGraph, estimate_ranks, estimate_scores};
///
/// // annotator 0: 0 beats 1, 1 beats 2; annotator 1: 0 beats 2
/// let corpus: Vec<AnnotatorGraph> = vec![
///     BTreeSet::from([(1, 0), (2, 1)]),
///     BTreeSet::from([(2, 0)]),
/// ];
///
/// let scores = estimate_scores(&corpus, false, 0.9, 0.5).unwrap();
/// let ranks = estimate_ranks(&corpus, 0.9, 0.5).unwrap();
///
/// assert!(scores[0] > scores[1] && scores[1] > scores[2]);
/// assert_eq!(ranks, vec![1, 2, 3]);
/// ```
///
/// For per-annotator accuracies, solver diagnostics or a custom solver, use
/// [`run_estimation`] / [`run_estimation_with`] with [`EstimateOptions`].

pub mod constants;
pub mod correlation;
pub mod crowd_bt;
pub mod error;
pub mod optimizer;
pub mod scoring;
pub mod shaping;
pub mod types;

// Re-export primary public API at crate root.
pub use constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_PREFERENCE_ACCURACY, DEFAULT_REGULARIZATION_STRENGTH, MAX_OBJECTS,
};
pub use correlation::{kendall_tau, spearman_rho};
pub use crowd_bt::CrowdBt;
pub use error::{EstimateError, EstimateResult};
pub use optimizer::{BfgsMinimizer, Minimizer, Minimum, Objective};
pub use scoring::{estimate_ranks, estimate_scores, run_estimation, run_estimation_with};
pub use shaping::{exponentiate, ranks_from_scores, standardize};
pub use types::{
    AnnotatorAccuracy, AnnotatorGraph, Edge, Estimate, EstimateOptions, GradientMode,
    SolverDiagnostics,
};
