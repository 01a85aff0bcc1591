use std::collections::BTreeSet;

use crate::constants::{
    DEFAULT_GRADIENT_TOLERANCE, DEFAULT_MAX_ITERATIONS, DEFAULT_PREFERENCE_ACCURACY,
    DEFAULT_REGULARIZATION_STRENGTH, MAX_OBJECTS,
};
use crate::error::{EstimateError, EstimateResult};

/// One pairwise judgment `(j, i)`: object `i` is preferred over object `j`.
///
/// Indices are signed so that negative values can be rejected with
/// [`EstimateError::InvalidEdge`] instead of wrapping.
pub type Edge = (i64, i64);

/// All edges contributed by a single annotator. Duplicates collapse.
///
/// A `BTreeSet` keeps iteration order fixed, so two calls on the same corpus
/// sum likelihood terms in the same order and produce identical floats.
pub type AnnotatorGraph = BTreeSet<Edge>;

/// Probability that an annotator's stated preference is correct.
///
/// Accuracy is looked up by annotator position, so switching from one shared
/// scalar to a per-annotator vector does not touch the corpus representation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnnotatorAccuracy {
    /// Same accuracy for every annotator.
    Uniform(f64),
    /// `values[k]` is the accuracy of annotator `k`.
    PerAnnotator(Vec<f64>),
}

impl AnnotatorAccuracy {
    /// Accuracy of the annotator at position `annotator`, or `None` if a
    /// per-annotator vector is too short.
    pub fn for_annotator(&self, annotator: usize) -> Option<f64> {
        match self {
            AnnotatorAccuracy::Uniform(h) => Some(*h),
            AnnotatorAccuracy::PerAnnotator(values) => values.get(annotator).copied(),
        }
    }

    pub(crate) fn validate(&self, num_annotators: usize) -> EstimateResult<()> {
        let values: &[f64] = match self {
            AnnotatorAccuracy::Uniform(h) => std::slice::from_ref(h),
            AnnotatorAccuracy::PerAnnotator(values) => {
                if values.len() != num_annotators {
                    return Err(EstimateError::AccuracyMismatch {
                        expected: num_annotators,
                        actual: values.len(),
                    });
                }
                values
            }
        };

        for &h in values {
            if !(0.0..=1.0).contains(&h) {
                return Err(EstimateError::InvalidHyperparameter {
                    name: "preference_accuracy",
                    value: h,
                });
            }
        }
        Ok(())
    }
}

impl Default for AnnotatorAccuracy {
    fn default() -> Self {
        AnnotatorAccuracy::Uniform(DEFAULT_PREFERENCE_ACCURACY)
    }
}

impl From<f64> for AnnotatorAccuracy {
    fn from(h: f64) -> Self {
        AnnotatorAccuracy::Uniform(h)
    }
}

impl From<Vec<f64>> for AnnotatorAccuracy {
    fn from(values: Vec<f64>) -> Self {
        AnnotatorAccuracy::PerAnnotator(values)
    }
}

/// How the objective's gradient is computed for the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GradientMode {
    /// Closed-form gradient of the regularized log-likelihood.
    #[default]
    Analytic,
    /// Central differences with the given step.
    FiniteDifference { step: f64 },
}

impl GradientMode {
    pub(crate) fn validate(&self) -> EstimateResult<()> {
        if let GradientMode::FiniteDifference { step } = *self {
            if !(step.is_finite() && step > 0.0) {
                return Err(EstimateError::InvalidHyperparameter {
                    name: "finite_difference_step",
                    value: step,
                });
            }
        }
        Ok(())
    }
}

/// λ must be finite and non-negative.
pub(crate) fn validate_regularization_strength(lambda: f64) -> EstimateResult<()> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(EstimateError::InvalidHyperparameter {
            name: "regularization_strength",
            value: lambda,
        });
    }
    Ok(())
}

/// Options for [`run_estimation`](crate::run_estimation).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EstimateOptions {
    /// Annotator accuracy (`h`), shared or per annotator.
    pub preference_accuracy: AnnotatorAccuracy,
    /// Weight of the anchor regularization term (`λ`).
    pub regularization_strength: f64,
    /// Z-score the exponentiated scores. Ranks are unaffected.
    pub standardize: bool,
    /// Solver iteration cap.
    pub max_iterations: usize,
    pub gradient: GradientMode,
    /// Gradient norm at which the solver stops early.
    pub gradient_tolerance: f64,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        EstimateOptions {
            preference_accuracy: AnnotatorAccuracy::default(),
            regularization_strength: DEFAULT_REGULARIZATION_STRENGTH,
            standardize: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gradient: GradientMode::default(),
            gradient_tolerance: DEFAULT_GRADIENT_TOLERANCE,
        }
    }
}

impl EstimateOptions {
    /// Check every scalar before any work is done.
    pub(crate) fn validate(&self, num_annotators: usize) -> EstimateResult<()> {
        self.preference_accuracy.validate(num_annotators)?;
        validate_regularization_strength(self.regularization_strength)?;
        if self.max_iterations == 0 {
            return Err(EstimateError::InvalidHyperparameter {
                name: "max_iterations",
                value: 0.0,
            });
        }
        if !(self.gradient_tolerance.is_finite() && self.gradient_tolerance > 0.0) {
            return Err(EstimateError::InvalidHyperparameter {
                name: "gradient_tolerance",
                value: self.gradient_tolerance,
            });
        }
        self.gradient.validate()?;
        Ok(())
    }
}

/// What the solver reports about its run.
///
/// `converged == false` means the iteration cap (or a stalled line search)
/// ended the run. The point is still the best one found and is still used.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverDiagnostics {
    pub iterations: usize,
    pub objective_evaluations: usize,
    /// Value of the minimized objective `-(L + λR)` at the returned point.
    pub final_objective: f64,
    pub final_gradient_norm: f64,
    pub converged: bool,
}

/// Full result of [`run_estimation`](crate::run_estimation).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    /// Optimized log-scores, one per object.
    pub log_scores: Vec<f64>,
    /// `exp(log_scores)`, z-scored when `standardize` was requested.
    pub scores: Vec<f64>,
    /// Rank per object, 1 = best.
    pub ranks: Vec<usize>,
    pub diagnostics: SolverDiagnostics,
}

/// Internal indexed preference: `(loser, winner, accuracy of its annotator)`.
pub(crate) type IndexedPreference = (usize, usize, f64);

/// Validated corpus flattened to object indices.
#[derive(Debug, Clone)]
pub(crate) struct IndexedCorpus {
    pub num_objects: usize,
    pub preferences: Vec<IndexedPreference>,
}

impl IndexedCorpus {
    /// Flatten `graphs`, resolving each edge's annotator accuracy.
    ///
    /// The object count is one plus the largest index seen in any edge, and
    /// may not exceed [`MAX_OBJECTS`].
    pub fn from_graphs(
        graphs: &[AnnotatorGraph],
        accuracy: &AnnotatorAccuracy,
    ) -> EstimateResult<Self> {
        let total_edges: usize = graphs.iter().map(BTreeSet::len).sum();
        let mut preferences = Vec::with_capacity(total_edges);
        let mut max_index: Option<usize> = None;

        for (annotator, edges) in graphs.iter().enumerate() {
            let h = accuracy
                .for_annotator(annotator)
                .ok_or(EstimateError::AccuracyMismatch {
                    expected: graphs.len(),
                    actual: annotator,
                })?;

            for &(loser, winner) in edges {
                let invalid = || EstimateError::InvalidEdge { annotator, loser, winner };
                let j = usize::try_from(loser).map_err(|_| invalid())?;
                let i = usize::try_from(winner).map_err(|_| invalid())?;

                let edge_max = i.max(j);
                if edge_max >= MAX_OBJECTS {
                    return Err(EstimateError::IndexTooLarge {
                        annotator,
                        loser,
                        winner,
                        limit: MAX_OBJECTS,
                    });
                }
                max_index = Some(max_index.map_or(edge_max, |m| m.max(edge_max)));
                preferences.push((j, i, h));
            }
        }

        let num_objects = max_index.map(|m| m + 1).ok_or(EstimateError::EmptyCorpus)?;

        Ok(IndexedCorpus { num_objects, preferences })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[Edge]) -> AnnotatorGraph {
        edges.iter().copied().collect()
    }

    #[test]
    fn test_object_count_is_one_past_max_index() {
        let corpus = vec![graph(&[(1, 0), (2, 1)]), graph(&[(5, 2)])];
        let indexed = IndexedCorpus::from_graphs(&corpus, &AnnotatorAccuracy::default()).unwrap();
        assert_eq!(indexed.num_objects, 6);
        assert_eq!(indexed.preferences.len(), 3);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let corpus = vec![graph(&[(1, 0), (1, 0), (1, 0)])];
        let indexed = IndexedCorpus::from_graphs(&corpus, &AnnotatorAccuracy::default()).unwrap();
        assert_eq!(indexed.preferences, vec![(1, 0, 0.9)]);
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let err = IndexedCorpus::from_graphs(&[], &AnnotatorAccuracy::default()).unwrap_err();
        assert_eq!(err, EstimateError::EmptyCorpus);

        let corpus = vec![AnnotatorGraph::new(), AnnotatorGraph::new()];
        let err = IndexedCorpus::from_graphs(&corpus, &AnnotatorAccuracy::default()).unwrap_err();
        assert_eq!(err, EstimateError::EmptyCorpus);
    }

    #[test]
    fn test_negative_index_rejected() {
        let corpus = vec![graph(&[(1, 0)]), graph(&[(-3, 1)])];
        let err = IndexedCorpus::from_graphs(&corpus, &AnnotatorAccuracy::default()).unwrap_err();
        assert_eq!(err, EstimateError::InvalidEdge { annotator: 1, loser: -3, winner: 1 });
    }

    #[test]
    fn test_huge_index_rejected_before_allocation() {
        let corpus = vec![graph(&[(i64::MAX, 0)])];
        let err = IndexedCorpus::from_graphs(&corpus, &AnnotatorAccuracy::default()).unwrap_err();
        assert_eq!(
            err,
            EstimateError::IndexTooLarge { annotator: 0, loser: i64::MAX, winner: 0, limit: MAX_OBJECTS }
        );

        let last = MAX_OBJECTS as i64 - 1;
        let indexed =
            IndexedCorpus::from_graphs(&[graph(&[(0, last)])], &AnnotatorAccuracy::default()).unwrap();
        assert_eq!(indexed.num_objects, MAX_OBJECTS);
    }

    #[test]
    fn test_gradient_mode_defaults_to_analytic() {
        assert_eq!(GradientMode::default(), GradientMode::Analytic);
        assert!(GradientMode::FiniteDifference { step: 0.0 }.validate().is_err());
    }

    #[test]
    fn test_per_annotator_accuracy_is_attached_to_edges() {
        let corpus = vec![graph(&[(1, 0)]), graph(&[(2, 1)])];
        let accuracy = AnnotatorAccuracy::PerAnnotator(vec![0.7, 0.6]);
        let indexed = IndexedCorpus::from_graphs(&corpus, &accuracy).unwrap();
        assert_eq!(indexed.preferences, vec![(1, 0, 0.7), (2, 1, 0.6)]);
    }

    #[test]
    fn test_options_validation() {
        let options = EstimateOptions::default();
        assert!(options.validate(3).is_ok());

        let options = EstimateOptions {
            preference_accuracy: AnnotatorAccuracy::PerAnnotator(vec![0.9]),
            ..EstimateOptions::default()
        };
        assert_eq!(
            options.validate(2),
            Err(EstimateError::AccuracyMismatch { expected: 2, actual: 1 })
        );

        let options = EstimateOptions {
            preference_accuracy: AnnotatorAccuracy::Uniform(1.5),
            ..EstimateOptions::default()
        };
        assert!(matches!(
            options.validate(1),
            Err(EstimateError::InvalidHyperparameter { name: "preference_accuracy", .. })
        ));

        let options = EstimateOptions {
            regularization_strength: f64::NAN,
            ..EstimateOptions::default()
        };
        assert!(matches!(
            options.validate(1),
            Err(EstimateError::InvalidHyperparameter { name: "regularization_strength", .. })
        ));

        let options = EstimateOptions { max_iterations: 0, ..EstimateOptions::default() };
        assert!(options.validate(1).is_err());

        let options = EstimateOptions {
            gradient: GradientMode::FiniteDifference { step: 0.0 },
            ..EstimateOptions::default()
        };
        assert!(options.validate(1).is_err());
    }

    #[test]
    fn test_accuracy_conversions() {
        assert_eq!(AnnotatorAccuracy::from(0.8), AnnotatorAccuracy::Uniform(0.8));
        assert_eq!(
            AnnotatorAccuracy::from(vec![0.8, 0.6]).for_annotator(1),
            Some(0.6)
        );
        assert_eq!(AnnotatorAccuracy::Uniform(0.8).for_annotator(1000), Some(0.8));
        assert_eq!(AnnotatorAccuracy::PerAnnotator(vec![]).for_annotator(0), None);
    }
}
