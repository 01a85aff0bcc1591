/// Turns the solver's log-scores into the public result shapes.
use std::cmp::Ordering;

/// Elementwise `exp`: log-scores to positive BT scores.
pub fn exponentiate(log_scores: &[f64]) -> Vec<f64> {
    log_scores.iter().map(|s| s.exp()).collect()
}

/// Z-score with the population standard deviation (divide by N, not N - 1).
///
/// When every score is identical (including N = 1) the deviation is zero and
/// all standardized scores are 0.0.
pub fn standardize(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return vec![0.0; scores.len()];
    }

    scores.iter().map(|s| (s - mean) / std_dev).collect()
}

/// Rank of each object, 1 = greatest score.
///
/// Objects are sorted by descending score with a stable sort, so equal scores
/// keep ascending index order and the lower index gets the better rank.
pub fn ranks_from_scores(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0; scores.len()];
    for (position, &object) in order.iter().enumerate() {
        ranks[object] = position + 1;
    }
    ranks
}
