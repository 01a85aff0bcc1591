/// Public estimation entry points.
///
/// Pure functions with no IO and no state. Objects are identified by their index in
/// the corpus edges; the returned vectors are indexed the same way.
use tracing::{debug, debug_span};

use crate::constants::INITIAL_LOG_SCORE;
use crate::crowd_bt::CrowdBt;
use crate::error::EstimateResult;
use crate::optimizer::{BfgsMinimizer, Minimizer};
use crate::shaping::{exponentiate, ranks_from_scores, standardize};
use crate::types::{AnnotatorAccuracy, AnnotatorGraph, Estimate, EstimateOptions};

/// Estimate one BT score per object from crowdsourced preferences.
///
/// Returns positive scores, or z-scores when `standardize` is set. Every
/// annotator shares `preference_accuracy`.
pub fn estimate_scores(
    corpus: &[AnnotatorGraph],
    standardize: bool,
    preference_accuracy: f64,
    regularization_strength: f64,
) -> EstimateResult<Vec<f64>> {
    let options = EstimateOptions {
        preference_accuracy: AnnotatorAccuracy::Uniform(preference_accuracy),
        regularization_strength,
        standardize,
        ..EstimateOptions::default()
    };
    run_estimation(corpus, &options).map(|estimate| estimate.scores)
}

/// Rank every object, 1 = best. Ties go to the lower object index.
pub fn estimate_ranks(
    corpus: &[AnnotatorGraph],
    preference_accuracy: f64,
    regularization_strength: f64,
) -> EstimateResult<Vec<usize>> {
    let options = EstimateOptions {
        preference_accuracy: AnnotatorAccuracy::Uniform(preference_accuracy),
        regularization_strength,
        standardize: false,
        ..EstimateOptions::default()
    };
    run_estimation(corpus, &options).map(|estimate| estimate.ranks)
}

/// Run a full estimation with the default BFGS solver.
///
/// The returned [`Estimate`] carries log-scores, shaped scores, ranks and the
/// solver diagnostics. Running out of iterations is reported through
/// `diagnostics.converged`, never as an error.
pub fn run_estimation(
    corpus: &[AnnotatorGraph],
    options: &EstimateOptions,
) -> EstimateResult<Estimate> {
    let minimizer = BfgsMinimizer::new(options.gradient_tolerance);
    run_estimation_with(corpus, options, &minimizer)
}

/// Run a full estimation with a caller-supplied solver.
pub fn run_estimation_with<M: Minimizer + ?Sized>(
    corpus: &[AnnotatorGraph],
    options: &EstimateOptions,
    minimizer: &M,
) -> EstimateResult<Estimate> {
    let span = debug_span!("crowdbt_estimate", annotators = corpus.len());
    let _guard = span.enter();

    options.validate(corpus.len())?;
    let objective = CrowdBt::from_graphs(
        corpus,
        &options.preference_accuracy,
        options.regularization_strength,
        options.gradient,
    )?;

    let num_objects = objective.num_objects();
    let initial_guess = vec![INITIAL_LOG_SCORE; num_objects];

    let minimum = minimizer.minimize(&objective, &initial_guess, options.max_iterations)?;
    let diagnostics = minimum.diagnostics;

    debug!(
        num_objects,
        iterations = diagnostics.iterations,
        evaluations = diagnostics.objective_evaluations,
        objective = diagnostics.final_objective,
        gradient_norm = diagnostics.final_gradient_norm,
        converged = diagnostics.converged,
        "CrowdBT estimation finished"
    );

    let log_scores = minimum.point;
    let raw_scores = exponentiate(&log_scores);
    let ranks = ranks_from_scores(&raw_scores);
    let scores = if options.standardize {
        standardize(&raw_scores)
    } else {
        raw_scores
    };

    Ok(Estimate { log_scores, scores, ranks, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstimateError;
    use crate::types::{Edge, GradientMode};

    fn graph(edges: &[Edge]) -> AnnotatorGraph {
        edges.iter().copied().collect()
    }

    #[test]
    fn test_single_preference_orders_scores() {
        let corpus = vec![graph(&[(1, 0)])];
        let scores = estimate_scores(&corpus, false, 0.9, 0.5).unwrap();

        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
        assert!(scores.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_chain_ranks() {
        let corpus = vec![graph(&[(1, 0)]), graph(&[(2, 1)])];
        let ranks = estimate_ranks(&corpus, 0.9, 0.5).unwrap();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_estimate_carries_consistent_shapes() {
        let corpus = vec![graph(&[(1, 0), (2, 0), (2, 1)]), graph(&[(3, 2)])];
        let options = EstimateOptions { standardize: true, ..EstimateOptions::default() };
        let estimate = run_estimation(&corpus, &options).unwrap();

        assert_eq!(estimate.log_scores.len(), 4);
        assert_eq!(estimate.scores.len(), 4);
        assert_eq!(estimate.ranks, vec![1, 2, 3, 4]);
        assert!(estimate.diagnostics.objective_evaluations > 0);

        let expected = standardize(&exponentiate(&estimate.log_scores));
        assert_eq!(estimate.scores, expected);
    }

    #[test]
    fn test_invalid_input_is_rejected_before_solving() {
        assert_eq!(estimate_scores(&[], false, 0.9, 0.5), Err(EstimateError::EmptyCorpus));

        let corpus = vec![graph(&[(0, -1)])];
        assert!(matches!(
            estimate_ranks(&corpus, 0.9, 0.5),
            Err(EstimateError::InvalidEdge { annotator: 0, loser: 0, winner: -1 })
        ));

        let corpus = vec![graph(&[(1, 0)])];
        assert!(matches!(
            estimate_scores(&corpus, false, 0.9, -0.5),
            Err(EstimateError::InvalidHyperparameter { name: "regularization_strength", .. })
        ));
    }

    #[test]
    fn test_finite_difference_gradient_reaches_same_optimum() {
        let corpus = vec![graph(&[(1, 0), (2, 1)]), graph(&[(2, 0)])];
        let analytic = run_estimation(&corpus, &EstimateOptions::default()).unwrap();
        let numeric = run_estimation(
            &corpus,
            &EstimateOptions {
                gradient: GradientMode::FiniteDifference { step: 1e-6 },
                ..EstimateOptions::default()
            },
        )
        .unwrap();

        for (a, n) in analytic.scores.iter().zip(&numeric.scores) {
            assert!((a - n).abs() < 1e-3, "analytic {a} vs numeric {n}");
        }
        assert_eq!(analytic.ranks, numeric.ranks);
    }
}
