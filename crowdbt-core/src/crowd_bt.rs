/// CrowdBT objective: regularized negative log-likelihood of crowdsourced
/// pairwise preferences under the Bradley-Terry model.
///
/// Scores are log-scores. Each edge `(j, i)` from an annotator with accuracy `h`
/// contributes `log10(h·bt(s_i, s_j) + (1 - h)·bt(s_j, s_i))`. Every object is
/// also compared against a virtual anchor with log-score 0 in both directions,
/// which pulls scores toward the anchor and keeps the scale identifiable.
use std::f64::consts::LN_10;

use tracing::trace;

use crate::constants::ANCHOR_LOG_SCORE;
use crate::error::EstimateResult;
use crate::optimizer::{Objective, finite_difference_gradient};
use crate::types::{
    AnnotatorAccuracy, AnnotatorGraph, GradientMode, IndexedCorpus, IndexedPreference,
    validate_regularization_strength,
};

/// Probability that an object with log-score `s_i` beats one with log-score `s_j`:
/// `exp(s_i) / (exp(s_i) + exp(s_j))`.
pub fn bt(s_i: f64, s_j: f64) -> f64 {
    logistic(s_i - s_j)
}

fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `log10(logistic(x))` without underflowing to `-inf` for large `|x|`.
fn log10_logistic(x: f64) -> f64 {
    let ln = if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    };
    ln / LN_10
}

pub struct CrowdBt {
    num_objects: usize,
    /// `(loser, winner, accuracy)` per edge, all annotators flattened.
    preferences: Vec<IndexedPreference>,
    regularization_strength: f64,
    gradient_mode: GradientMode,
}

impl CrowdBt {
    pub(crate) fn new(
        corpus: IndexedCorpus,
        regularization_strength: f64,
        gradient_mode: GradientMode,
    ) -> Self {
        trace!(
            num_objects = corpus.num_objects,
            num_preferences = corpus.preferences.len(),
            regularization_strength,
            "building CrowdBT objective"
        );

        CrowdBt {
            num_objects: corpus.num_objects,
            preferences: corpus.preferences,
            regularization_strength,
            gradient_mode,
        }
    }

    /// Build the objective directly from annotator graphs.
    ///
    /// Applies the same checks as estimation: corpus shape, accuracy range
    /// and length, regularization strength and finite-difference step.
    pub fn from_graphs(
        graphs: &[AnnotatorGraph],
        accuracy: &AnnotatorAccuracy,
        regularization_strength: f64,
        gradient_mode: GradientMode,
    ) -> EstimateResult<Self> {
        accuracy.validate(graphs.len())?;
        validate_regularization_strength(regularization_strength)?;
        gradient_mode.validate()?;

        let corpus = IndexedCorpus::from_graphs(graphs, accuracy)?;
        Ok(CrowdBt::new(corpus, regularization_strength, gradient_mode))
    }

    /// Number of objects (length of the score vector).
    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    /// Weighted log-likelihood `L` of the observed preferences.
    pub fn log_likelihood(&self, s: &[f64]) -> f64 {
        self.preferences
            .iter()
            .map(|&(j, i, h)| {
                let p = bt(s[i], s[j]);
                (h * p + (1.0 - h) * (1.0 - p)).log10()
            })
            .sum()
    }

    /// Anchor regularization `R = Σ log10 bt(anchor, s_i) + log10 bt(s_i, anchor)`.
    /// Largest when every score equals the anchor.
    pub fn regularization(&self, s: &[f64]) -> f64 {
        s.iter()
            .map(|&s_i| {
                log10_logistic(ANCHOR_LOG_SCORE - s_i) + log10_logistic(s_i - ANCHOR_LOG_SCORE)
            })
            .sum()
    }

    /// Closed-form gradient of `-(L + λR)`.
    fn analytic_gradient(&self, s: &[f64]) -> Vec<f64> {
        let mut grad = vec![0.0; self.num_objects];

        // d/dd log10((2h - 1)p + 1 - h) with p = logistic(d), d = s_i - s_j
        for &(j, i, h) in &self.preferences {
            let p = bt(s[i], s[j]);
            let q = h * p + (1.0 - h) * (1.0 - p);
            let g = (2.0 * h - 1.0) * p * (1.0 - p) / (q * LN_10);
            grad[i] -= g;
            grad[j] += g;
        }

        for (k, &s_k) in s.iter().enumerate() {
            let d_reg = (1.0 - 2.0 * logistic(s_k - ANCHOR_LOG_SCORE)) / LN_10;
            grad[k] -= self.regularization_strength * d_reg;
        }

        grad
    }
}

impl Objective for CrowdBt {
    fn dimension(&self) -> usize {
        self.num_objects
    }

    /// `-(L + λR)`, the quantity to minimize.
    fn value(&self, s: &[f64]) -> f64 {
        -(self.log_likelihood(s) + self.regularization_strength * self.regularization(s))
    }

    fn gradient(&self, s: &[f64]) -> Vec<f64> {
        match self.gradient_mode {
            GradientMode::Analytic => self.analytic_gradient(s),
            GradientMode::FiniteDifference { step } => finite_difference_gradient(self, s, step),
        }
    }
}
