//! Permutation tests for grouped samples.
//!
//! Both tests estimate the null distribution of a statistic by reshuffling
//! the pooled observations many times and re-partitioning them into
//! group-shaped chunks. The p-value is the fraction of shuffles whose
//! statistic is at least as extreme as the observed one, with an add-one
//! correction so the estimate can never be zero.
//!
//! # Example
//!
//! ```ignore
//! use sentiment_edge_stats::{GroupedSamples, SampleGroup};
//! use sentiment_edge_stats::permutation::{PermutationConfig, PermutationTester};
//!
//! let samples = GroupedSamples::new(vec![
//!     SampleGroup::new("bearish", vec![-12.0, -3.5, 4.1]),
//!     SampleGroup::new("bullish", vec![8.0, 15.2, 9.9]),
//! ])?;
//!
//! let tester = PermutationTester::new(PermutationConfig::default());
//! let result = tester.f_test(&samples)?;
//! println!("F={:.4}, p={:.4}", result.statistic, result.p_value);
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::StatError;
use crate::fstat::{f_statistic, f_statistic_slices};
use crate::types::{mean, validate_finite, GroupedSamples, SampleGroup};

/// Default number of permutations per test.
pub const DEFAULT_PERMUTATIONS: usize = 5000;

/// Default RNG seed. Fixed so repeated runs reproduce the same report
/// unless the caller explicitly varies it.
pub const DEFAULT_SEED: u64 = 42;

/// Configuration for permutation testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationConfig {
    /// Number of permutations (resamples) per test.
    pub n_permutations: usize,
    /// Seed for the permutation RNG.
    pub seed: u64,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            n_permutations: DEFAULT_PERMUTATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl PermutationConfig {
    /// Creates a new configuration with specified parameters.
    #[must_use]
    pub fn new(n_permutations: usize, seed: u64) -> Self {
        Self {
            n_permutations,
            seed,
        }
    }

    /// Sets the permutation count.
    #[must_use]
    pub fn with_permutations(mut self, n_permutations: usize) -> Self {
        self.n_permutations = n_permutations;
        self
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of the global permutation F test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FTestResult {
    /// Observed F-statistic on the original grouping. Infinite when the
    /// within-group variance is zero.
    pub statistic: f64,
    /// Estimated p-value, always within [1/(M+1), 1].
    pub p_value: f64,
    /// Number of permutations used.
    pub n_permutations: usize,
}

/// Result of a two-group permutation test on the absolute mean difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseTestResult {
    /// Label of the first group.
    pub group_a: String,
    /// Label of the second group.
    pub group_b: String,
    /// Observed |mean(A) - mean(B)|.
    pub mean_difference: f64,
    /// Estimated p-value, always within [1/(M+1), 1].
    pub p_value: f64,
    /// Number of permutations used.
    pub n_permutations: usize,
}

/// Permutation tester owning its configuration.
///
/// Every test invocation constructs its own seeded RNG, so parallel or
/// repeated calls never interfere through shared random state.
pub struct PermutationTester {
    config: PermutationConfig,
}

impl PermutationTester {
    /// Creates a new tester with the given configuration.
    #[must_use]
    pub fn new(config: PermutationConfig) -> Self {
        Self { config }
    }

    /// Creates a tester with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(PermutationConfig::default())
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &PermutationConfig {
        &self.config
    }

    /// Global permutation test of the one-way F-statistic.
    ///
    /// Shuffles the pooled sample uniformly on each iteration, slices it
    /// back into contiguous chunks matching the original group sizes in
    /// order, and counts permuted statistics that reach the observed one
    /// (ties inclusive). A single group is a degenerate but valid input:
    /// the observed statistic is 0 and the p-value is 1.
    ///
    /// # Errors
    /// Returns an error when the permutation count is zero or the total
    /// observation count does not exceed the group count.
    pub fn f_test(&self, samples: &GroupedSamples) -> Result<FTestResult, StatError> {
        let m = self.checked_permutations()?;

        let k = samples.len();
        let n = samples.total_observations();
        if n <= k {
            return Err(StatError::InsufficientObservations { n, k });
        }

        let observed = f_statistic(samples);
        tracing::debug!(statistic = observed, groups = k, observations = n, "observed F-statistic");

        let sizes: Vec<usize> = samples.groups().iter().map(SampleGroup::len).collect();
        let mut pooled = samples.pooled();

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut extreme = 0usize;
        for _ in 0..m {
            pooled.shuffle(&mut rng);
            if permuted_f(&pooled, &sizes) >= observed {
                extreme += 1;
            }
        }

        Ok(FTestResult {
            statistic: observed,
            p_value: add_one_p_value(extreme, m),
            n_permutations: m,
        })
    }

    /// Two-group permutation test of the absolute mean difference.
    ///
    /// Pools the two groups, shuffles, splits at |A|, and counts shuffles
    /// whose |mean(prefix) - mean(remainder)| reaches the observed
    /// difference (ties inclusive). The observed statistic is symmetric in
    /// the two groups.
    ///
    /// # Errors
    /// Returns an error when the permutation count is zero, a group is
    /// empty, or a value is non-finite.
    pub fn mean_difference_test(
        &self,
        a: &SampleGroup,
        b: &SampleGroup,
    ) -> Result<PairwiseTestResult, StatError> {
        let m = self.checked_permutations()?;

        for group in [a, b] {
            if group.is_empty() {
                return Err(StatError::EmptyGroup(group.label.clone()));
            }
            validate_finite(group)?;
        }

        let observed = (a.mean() - b.mean()).abs();
        tracing::debug!(
            group_a = %a.label,
            group_b = %b.label,
            mean_difference = observed,
            "observed mean difference"
        );

        let split = a.len();
        let mut pooled = Vec::with_capacity(a.len() + b.len());
        pooled.extend_from_slice(&a.values);
        pooled.extend_from_slice(&b.values);

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut extreme = 0usize;
        for _ in 0..m {
            pooled.shuffle(&mut rng);
            let (prefix, remainder) = pooled.split_at(split);
            if (mean(prefix) - mean(remainder)).abs() >= observed {
                extreme += 1;
            }
        }

        Ok(PairwiseTestResult {
            group_a: a.label.clone(),
            group_b: b.label.clone(),
            mean_difference: observed,
            p_value: add_one_p_value(extreme, m),
            n_permutations: m,
        })
    }

    /// Runs the two-group test over every unordered pair of groups,
    /// K * (K - 1) / 2 invocations in label order.
    ///
    /// Each pair draws from its own RNG stream, seeded from the base seed
    /// plus the pair index, so results are reproducible and adding a group
    /// never perturbs the pairs that precede it.
    ///
    /// # Errors
    /// Propagates the first pairwise test failure.
    pub fn pairwise_tests(
        &self,
        samples: &GroupedSamples,
    ) -> Result<Vec<PairwiseTestResult>, StatError> {
        let groups = samples.groups();
        let mut results = Vec::with_capacity(groups.len() * groups.len().saturating_sub(1) / 2);

        let mut pair_index = 0u64;
        for i in 0..groups.len() {
            for j in i + 1..groups.len() {
                let config = self
                    .config
                    .clone()
                    .with_seed(self.config.seed.wrapping_add(pair_index));
                let tester = Self::new(config);
                results.push(tester.mean_difference_test(&groups[i], &groups[j])?);
                pair_index += 1;
            }
        }

        Ok(results)
    }

    fn checked_permutations(&self) -> Result<usize, StatError> {
        if self.config.n_permutations == 0 {
            return Err(StatError::ZeroPermutations);
        }
        Ok(self.config.n_permutations)
    }
}

/// F-statistic of a shuffled pooled buffer, re-sliced into the recorded
/// group sizes. The chunk views must not outlive the iteration: the buffer
/// is reshuffled in place before the next one.
fn permuted_f(pooled: &[f64], sizes: &[usize]) -> f64 {
    let mut chunks = Vec::with_capacity(sizes.len());
    let mut rest = pooled;
    for &size in sizes {
        let (chunk, tail) = rest.split_at(size);
        chunks.push(chunk);
        rest = tail;
    }
    f_statistic_slices(&chunks)
}

/// (count + 1) / (M + 1). Counting the observed arrangement as one of the
/// extreme outcomes keeps the estimate off zero for any M.
fn add_one_p_value(extreme: usize, m: usize) -> f64 {
    (extreme + 1) as f64 / (m + 1) as f64
}
