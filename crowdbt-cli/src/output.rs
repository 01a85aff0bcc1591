/// Output formatting: terminal table and JSON.
use crowdbt_core::{Estimate, SolverDiagnostics};
use serde::Serialize;

use crate::bail;
use crate::simulate::SimulationReport;

#[derive(Serialize)]
struct JsonRankedObject {
    rank: usize,
    object: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    score: f64,
    log_score: f64,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    objects: Vec<JsonRankedObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a SolverDiagnostics>,
}

/// Object indices ordered best first.
fn by_rank(estimate: &Estimate) -> Vec<usize> {
    let mut order: Vec<usize> = (0..estimate.ranks.len()).collect();
    order.sort_by_key(|&idx| estimate.ranks[idx]);
    order
}

fn label_for(labels: &[String], idx: usize) -> Option<&str> {
    labels.get(idx).map(String::as_str)
}

fn print_diagnostics(diagnostics: &SolverDiagnostics) {
    println!(
        "Solver: {} iterations, {} evaluations, objective {:.6}, |grad| {:.2e}{}",
        diagnostics.iterations,
        diagnostics.objective_evaluations,
        diagnostics.final_objective,
        diagnostics.final_gradient_norm,
        if diagnostics.converged { "" } else { " (not converged, best iterate used)" },
    );
}

/// Print results as a formatted terminal table.
pub fn print_table(estimate: &Estimate, labels: &[String], show_diagnostics: bool) {
    let order = by_rank(estimate);
    let has_labels = !labels.is_empty();

    let label_width = if has_labels {
        order
            .iter()
            .map(|&idx| label_for(labels, idx).map_or(0, str::len))
            .max()
            .unwrap_or(5)
            .max(5) // at least "Label"
    } else {
        0
    };

    if has_labels {
        println!("   # | Object | {:<label_width$} |      Score", "Label");
        println!("-----|--------|-{}-|-----------", "-".repeat(label_width));
    } else {
        println!("   # | Object |      Score");
        println!("-----|--------|-----------");
    }

    for &idx in &order {
        let rank = estimate.ranks[idx];
        let score = estimate.scores[idx];
        if has_labels {
            let label = label_for(labels, idx).unwrap_or("");
            println!("{rank:>4} | {idx:>6} | {label:<label_width$} | {score:>10.4}");
        } else {
            println!("{rank:>4} | {idx:>6} | {score:>10.4}");
        }
    }

    println!("\n{} objects ranked", order.len());
    if show_diagnostics {
        print_diagnostics(&estimate.diagnostics);
    }
}

/// Print results as JSON.
pub fn print_json(estimate: &Estimate, labels: &[String], show_diagnostics: bool) {
    let objects = by_rank(estimate)
        .into_iter()
        .map(|idx| JsonRankedObject {
            rank: estimate.ranks[idx],
            object: idx,
            label: label_for(labels, idx).map(str::to_string),
            score: estimate.scores[idx],
            log_score: estimate.log_scores[idx],
        })
        .collect();

    let output = JsonOutput {
        objects,
        diagnostics: show_diagnostics.then_some(&estimate.diagnostics),
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| bail(format!("Failed to serialize output: {e}")));
    println!("{json}");
}

/// Print a simulation report, as a summary or JSON.
pub fn print_simulation(report: &SimulationReport, json: bool) {
    if json {
        let json = serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| bail(format!("Failed to serialize report: {e}")));
        println!("{json}");
        return;
    }

    println!("Seed:           {}", report.seed);
    println!("Objects:        {}", report.objects);
    println!("Distinct edges: {}", report.edges);
    println!("Kendall τ:      {:.4}", report.kendall_tau);
    println!("Spearman ρ:     {:.4}", report.spearman_rho);
    println!(
        "Top-1:          {}",
        if report.top1_recovered { "recovered" } else { "missed" }
    );
    print_diagnostics(&report.diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate() -> Estimate {
        Estimate {
            log_scores: vec![-0.5, 1.0, 0.0],
            scores: vec![0.61, 2.72, 1.0],
            ranks: vec![3, 1, 2],
            diagnostics: SolverDiagnostics {
                iterations: 4,
                objective_evaluations: 9,
                final_objective: 0.7,
                final_gradient_norm: 1e-7,
                converged: true,
            },
        }
    }

    #[test]
    fn test_by_rank_orders_best_first() {
        assert_eq!(by_rank(&estimate()), vec![1, 2, 0]);
    }

    #[test]
    fn test_missing_labels_are_none() {
        let labels = vec!["a".to_string()];
        assert_eq!(label_for(&labels, 0), Some("a"));
        assert_eq!(label_for(&labels, 2), None);
    }
}
