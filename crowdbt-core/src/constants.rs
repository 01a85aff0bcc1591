/// Probability that an annotator's stated preference is correct, used when the
/// caller does not supply one. 0.5 models a spammer, 0.0 a malicious annotator.
pub const DEFAULT_PREFERENCE_ACCURACY: f64 = 0.9;

/// Weight of the anchor regularization term. Useful values sit roughly in
/// [0.1, 10]; larger values pull every score harder toward the anchor.
pub const DEFAULT_REGULARIZATION_STRENGTH: f64 = 0.5;

/// Iteration cap for the quasi-Newton solver.
///
/// Hitting the cap is not an error: the best iterate found is returned as the
/// estimate. Callers get a bounded-effort local optimum, not a convergence
/// guarantee.
pub const DEFAULT_MAX_ITERATIONS: usize = 99;

/// Gradient-norm tolerance at which the solver reports convergence.
pub const DEFAULT_GRADIENT_TOLERANCE: f64 = 1e-5;

/// Step used for central finite-difference gradients.
pub const DEFAULT_FINITE_DIFFERENCE_STEP: f64 = 1e-6;

/// Log-score of the virtual anchor object (raw score 1.0).
///
/// The anchor only appears inside the regularization term. It is never part of
/// the object index space and never shows up in output.
pub const ANCHOR_LOG_SCORE: f64 = 0.0;

/// Log-score every object starts from, regardless of corpus content.
pub const INITIAL_LOG_SCORE: f64 = 0.0;

/// Largest object count a corpus may imply. An edge index at or past this
/// is rejected before the score vector is allocated.
pub const MAX_OBJECTS: usize = 1 << 20;
