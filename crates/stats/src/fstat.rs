//! One-way analysis-of-variance F-statistic.
//!
//! The F-ratio compares between-group variance to within-group variance:
//! large values mean the group means are spread out relative to the noise
//! inside each group. This is the shared statistic of the global
//! permutation test; it is a pure function with no randomness.

use crate::types::GroupedSamples;

/// Computes the one-way ANOVA F-ratio for the given groups.
///
/// A single group has no between-group variance, so K = 1 yields 0.0, even
/// when the within-group variance is also zero. For K >= 2 a within-group
/// mean square of exactly zero yields positive infinity, signaling maximal
/// separation; this matters downstream because permuted statistics compare
/// against the observed one inclusively.
///
/// The result is NaN only when the within-group degrees of freedom (N - K)
/// are non-positive; callers must reject that input up front.
#[must_use]
pub fn f_statistic(samples: &GroupedSamples) -> f64 {
    let slices: Vec<&[f64]> = samples
        .groups()
        .iter()
        .map(|g| g.values.as_slice())
        .collect();
    f_statistic_slices(&slices)
}

/// Slice-level implementation, shared with the permutation loop which
/// re-slices a pooled buffer instead of materializing groups.
pub(crate) fn f_statistic_slices(groups: &[&[f64]]) -> f64 {
    let k = groups.len();
    if k == 1 {
        return 0.0;
    }

    let n: usize = groups.iter().map(|g| g.len()).sum();

    let mut group_means = Vec::with_capacity(k);
    let mut grand_sum = 0.0;
    for group in groups {
        let sum: f64 = group.iter().sum();
        grand_sum += sum;
        group_means.push(sum / group.len() as f64);
    }
    let grand_mean = grand_sum / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for (group, group_mean) in groups.iter().zip(&group_means) {
        let spread = group_mean - grand_mean;
        ss_between += group.len() as f64 * spread * spread;
        ss_within += group
            .iter()
            .map(|x| {
                let deviation = x - group_mean;
                deviation * deviation
            })
            .sum::<f64>();
    }

    let ms_between = ss_between / (k - 1) as f64;
    let ms_within = ss_within / (n - k) as f64;

    if ms_within == 0.0 {
        return f64::INFINITY;
    }

    ms_between / ms_within
}
