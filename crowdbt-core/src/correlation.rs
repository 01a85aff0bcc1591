/// Rank correlation between two score vectors over the same objects.
///
/// Used to compare an estimate against known strengths. Both functions return
/// 1.0 for fewer than two objects.
use crate::shaping::ranks_from_scores;

/// Kendall τ-a. Tied pairs count as neither concordant nor discordant.
pub fn kendall_tau(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 1.0;
    }

    let mut concordant = 0i64;
    let mut discordant = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let product = (a[i] - a[j]) * (b[i] - b[j]);
            if product > 0.0 {
                concordant += 1;
            } else if product < 0.0 {
                discordant += 1;
            }
        }
    }

    let pairs = (n * (n - 1) / 2) as f64;
    (concordant - discordant) as f64 / pairs
}

/// Spearman ρ from rank differences (ties broken by index).
pub fn spearman_rho(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 1.0;
    }

    let ra = ranks_from_scores(&a[..n]);
    let rb = ranks_from_scores(&b[..n]);
    let d2: f64 = ra
        .iter()
        .zip(&rb)
        .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
        .sum();
    let n = n as f64;
    1.0 - 6.0 * d2 / (n * (n * n - 1.0))
}
