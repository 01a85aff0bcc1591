/// Unconstrained minimization behind a small capability trait.
///
/// The estimation pipeline only needs `minimize(objective, initial, max_iterations)`.
/// Any quasi-Newton solver can sit behind [`Minimizer`]; the default is BFGS
/// with a strong-Wolfe line search from `wolfe_bfgs`.
use std::cell::Cell;

use ndarray::Array1;
use tracing::debug;
use wolfe_bfgs::{Bfgs, BfgsError, BfgsSolution};

use crate::constants::{DEFAULT_FINITE_DIFFERENCE_STEP, DEFAULT_GRADIENT_TOLERANCE};
use crate::error::{EstimateError, EstimateResult};
use crate::types::SolverDiagnostics;

/// A scalar function of an N-dimensional point, to be minimized.
pub trait Objective {
    /// Length of the points this objective accepts.
    fn dimension(&self) -> usize;

    fn value(&self, point: &[f64]) -> f64;

    /// Gradient at `point`. Defaults to central finite differences.
    fn gradient(&self, point: &[f64]) -> Vec<f64> {
        finite_difference_gradient(self, point, DEFAULT_FINITE_DIFFERENCE_STEP)
    }

    fn value_and_gradient(&self, point: &[f64]) -> (f64, Vec<f64>) {
        (self.value(point), self.gradient(point))
    }
}

/// Result of a minimization: the best point found plus how the run went.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub diagnostics: SolverDiagnostics,
}

/// Minimal solver capability.
///
/// Implementations must treat the iteration cap as a budget, not a failure:
/// when it runs out they return the best iterate with
/// `diagnostics.converged == false`.
pub trait Minimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: &[f64],
        max_iterations: usize,
    ) -> EstimateResult<Minimum>;
}

/// Central-difference gradient: `(f(x + h·e_k) - f(x - h·e_k)) / 2h` per axis.
pub fn finite_difference_gradient<O: Objective + ?Sized>(
    objective: &O,
    point: &[f64],
    step: f64,
) -> Vec<f64> {
    let mut probe = point.to_vec();
    let mut grad = vec![0.0; point.len()];

    for k in 0..point.len() {
        let original = probe[k];

        probe[k] = original + step;
        let forward = objective.value(&probe);
        probe[k] = original - step;
        let backward = objective.value(&probe);
        probe[k] = original;

        grad[k] = (forward - backward) / (2.0 * step);
    }

    grad
}

/// BFGS minimizer backed by `wolfe_bfgs`.
#[derive(Debug, Clone, Copy)]
pub struct BfgsMinimizer {
    /// Gradient norm below which the run counts as converged.
    pub gradient_tolerance: f64,
}

impl Default for BfgsMinimizer {
    fn default() -> Self {
        BfgsMinimizer { gradient_tolerance: DEFAULT_GRADIENT_TOLERANCE }
    }
}

impl BfgsMinimizer {
    pub fn new(gradient_tolerance: f64) -> Self {
        BfgsMinimizer { gradient_tolerance }
    }
}

impl Minimizer for BfgsMinimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: &[f64],
        max_iterations: usize,
    ) -> EstimateResult<Minimum> {
        if initial.len() != objective.dimension() {
            return Err(EstimateError::Solver(format!(
                "initial point has {} entries but the objective expects {}",
                initial.len(),
                objective.dimension()
            )));
        }

        let evaluations = Cell::new(0usize);
        let cost_and_grad = |x: &Array1<f64>| -> (f64, Array1<f64>) {
            evaluations.set(evaluations.get() + 1);
            let (value, grad) = objective.value_and_gradient(&x.to_vec());
            (value, Array1::from_vec(grad))
        };

        let outcome = Bfgs::new(Array1::from_vec(initial.to_vec()), cost_and_grad)
            .with_tolerance(self.gradient_tolerance)
            .with_max_iterations(max_iterations)
            .run();

        let (solution, converged): (BfgsSolution, bool) = match outcome {
            Ok(solution) => (solution, true),
            Err(BfgsError::MaxIterationsReached { last_solution, .. }) => {
                debug!(
                    max_iterations,
                    gradient_norm = last_solution.final_gradient_norm,
                    "BFGS hit the iteration cap; keeping best-so-far point"
                );
                (*last_solution, false)
            }
            Err(BfgsError::LineSearchFailed { last_solution, .. }) => {
                debug!(
                    gradient_norm = last_solution.final_gradient_norm,
                    "line search stalled; keeping best-so-far point"
                );
                (*last_solution, false)
            }
            Err(e) => return Err(EstimateError::Solver(format!("BFGS failed: {e:?}"))),
        };

        let point = solution.final_point.to_vec();
        if point.iter().any(|v| !v.is_finite()) {
            return Err(EstimateError::Solver("BFGS produced a non-finite point".to_string()));
        }

        Ok(Minimum {
            point,
            diagnostics: SolverDiagnostics {
                iterations: solution.iterations,
                objective_evaluations: evaluations.get(),
                final_objective: solution.final_value,
                final_gradient_norm: solution.final_gradient_norm,
                converged,
            },
        })
    }
}
