/// Simulation command: measures how well CrowdBT recovers a known ranking.
///
/// Draws ground-truth log-scores, lets a crowd of annotators judge random pairs
/// under the BT model (flipping each judgment with probability 1 - accuracy),
/// then estimates and compares against the truth with Kendall τ and Spearman ρ.
use crowdbt_core::crowd_bt::bt;
use crowdbt_core::{
    AnnotatorAccuracy, AnnotatorGraph, EstimateOptions, EstimateResult, SolverDiagnostics,
    kendall_tau, ranks_from_scores, run_estimation, spearman_rho,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

/// Spammers answer uniformly at random.
const SPAMMER_ACCURACY: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub objects: usize,
    pub annotators: usize,
    /// Annotators (out of `annotators`) who answer at random.
    pub spammers: usize,
    pub comparisons_per_annotator: usize,
    /// True accuracy of the non-spammer annotators.
    pub annotator_accuracy: f64,
    pub seed: u64,
    /// Give the estimator each annotator's true accuracy instead of the
    /// shared value from the estimate options.
    pub oracle_accuracies: bool,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub objects: usize,
    /// Distinct edges after duplicates collapsed.
    pub edges: usize,
    pub kendall_tau: f64,
    pub spearman_rho: f64,
    /// Whether the truly best object was ranked first.
    pub top1_recovered: bool,
    pub diagnostics: SolverDiagnostics,
}

/// Standard normal via Box-Muller.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn true_accuracies(config: &SimulationConfig) -> Vec<f64> {
    (0..config.annotators)
        .map(|k| {
            if k < config.spammers {
                SPAMMER_ACCURACY
            } else {
                config.annotator_accuracy
            }
        })
        .collect()
}

/// Generate a crowd corpus from ground-truth log-scores.
fn simulate_corpus(
    rng: &mut impl Rng,
    true_log_scores: &[f64],
    accuracies: &[f64],
    comparisons_per_annotator: usize,
) -> Vec<AnnotatorGraph> {
    let n = true_log_scores.len();

    accuracies
        .iter()
        .map(|&accuracy| {
            let mut edges = AnnotatorGraph::new();
            for _ in 0..comparisons_per_annotator {
                let a = rng.random_range(0..n);
                let mut b = rng.random_range(0..n - 1);
                if b >= a {
                    b += 1;
                }

                let a_wins = rng.random_bool(bt(true_log_scores[a], true_log_scores[b]));
                let honest = rng.random_bool(accuracy);
                let (winner, loser) = if a_wins == honest { (a, b) } else { (b, a) };
                edges.insert((loser as i64, winner as i64));
            }
            edges
        })
        .collect()
}

/// Run one simulation and score the estimate against the truth.
pub fn run_simulation(
    config: &SimulationConfig,
    options: &EstimateOptions,
) -> EstimateResult<SimulationReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let true_log_scores: Vec<f64> = (0..config.objects).map(|_| standard_normal(&mut rng)).collect();
    let accuracies = true_accuracies(config);
    let corpus = simulate_corpus(
        &mut rng,
        &true_log_scores,
        &accuracies,
        config.comparisons_per_annotator,
    );
    let edges: usize = corpus.iter().map(|g| g.len()).sum();

    info!(
        objects = config.objects,
        annotators = config.annotators,
        spammers = config.spammers,
        edges,
        seed = config.seed,
        "simulated crowd corpus"
    );

    let mut options = options.clone();
    if config.oracle_accuracies {
        options.preference_accuracy = AnnotatorAccuracy::PerAnnotator(accuracies);
    }

    let estimate = run_estimation(&corpus, &options)?;

    // Objects above the largest index drawn never appear in the corpus.
    let truth = &true_log_scores[..estimate.log_scores.len()];
    let kendall = kendall_tau(&estimate.log_scores, truth);
    let spearman = spearman_rho(&estimate.log_scores, truth);

    let best_true = ranks_from_scores(truth).iter().position(|&r| r == 1);
    let top1_recovered = best_true.is_some_and(|idx| estimate.ranks[idx] == 1);

    debug!(kendall, spearman, top1_recovered, "simulation scored");

    Ok(SimulationReport {
        seed: config.seed,
        objects: estimate.log_scores.len(),
        edges,
        kendall_tau: kendall,
        spearman_rho: spearman,
        top1_recovered,
        diagnostics: estimate.diagnostics,
    })
}
