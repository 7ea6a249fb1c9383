//! Kruskal-Wallis rank-sum test.
//!
//! The preferred parametric path of the analysis when the `rank-tests`
//! feature is compiled in. Ranks the pooled sample with midrank tie
//! handling, computes the tie-corrected H statistic, and takes the p-value
//! from the chi-squared distribution with K - 1 degrees of freedom via
//! `statrs`.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::StatError;
use crate::types::GroupedSamples;

/// Result of a Kruskal-Wallis H test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankTestResult {
    /// H statistic, corrected for ties.
    pub statistic: f64,
    /// p-value from the chi-squared distribution with `df` degrees of
    /// freedom.
    pub p_value: f64,
    /// Degrees of freedom (K - 1).
    pub df: usize,
}

/// Assigns 1-based average ranks to `values`, splitting ties at the
/// midrank.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }

    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];

    let mut i = 0;
    while i < n {
        // Find the extent of the tie run.
        let mut j = i + 1;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < f64::EPSILON {
            j += 1;
        }

        // Positions i..j carry ranks (i + 1)..(j + 1); tied values all get
        // the average.
        let midrank = (i + 1..=j).map(|r| r as f64).sum::<f64>() / (j - i) as f64;
        for entry in &indexed[i..j] {
            ranks[entry.0] = midrank;
        }

        i = j;
    }

    ranks
}

/// Kruskal-Wallis H test across K >= 2 groups.
///
/// When every pooled value is identical the tie correction is zero and the
/// uncorrected H is already zero; the test reports H = 0, p = 1 rather
/// than dividing by zero.
///
/// # Errors
/// Returns an error for fewer than two groups; group contents are
/// validated at `GroupedSamples` construction.
pub fn kruskal_wallis(samples: &GroupedSamples) -> Result<RankTestResult, StatError> {
    let k = samples.len();
    let n = samples.total_observations();
    if k < 2 {
        return Err(StatError::InsufficientObservations { n, k });
    }

    let pooled = samples.pooled();
    let ranks = average_ranks(&pooled);
    let n_f = n as f64;

    // Rank sums per group, walking the rank vector in group order.
    let mut rank_square_sum = 0.0;
    let mut offset = 0;
    for group in samples.groups() {
        let size = group.len();
        let rank_sum: f64 = ranks[offset..offset + size].iter().sum();
        rank_square_sum += rank_sum * rank_sum / size as f64;
        offset += size;
    }

    let h = 12.0 / (n_f * (n_f + 1.0)) * rank_square_sum - 3.0 * (n_f + 1.0);

    let correction = tie_correction(&pooled);
    let df = k - 1;
    if correction <= 0.0 {
        return Ok(RankTestResult {
            statistic: 0.0,
            p_value: 1.0,
            df,
        });
    }

    let h = (h / correction).max(0.0);

    let chi = ChiSquared::new(df as f64)
        .map_err(|_| StatError::InsufficientObservations { n, k })?;
    let p_value = 1.0 - chi.cdf(h);

    tracing::debug!(statistic = h, p_value, df, "Kruskal-Wallis H");

    Ok(RankTestResult {
        statistic: h,
        p_value,
        df,
    })
}

/// 1 - sum(t^3 - t) / (N^3 - N) over tie runs in the sorted pooled sample.
fn tie_correction(pooled: &[f64]) -> f64 {
    let n = pooled.len();
    let mut sorted = pooled.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && (sorted[j] - sorted[i]).abs() < f64::EPSILON {
            j += 1;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    let n_f = n as f64;
    1.0 - tie_term / (n_f * n_f * n_f - n_f)
}
