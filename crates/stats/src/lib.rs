//! Significance testing for grouped numeric samples.
//!
//! Given daily PnL observations grouped by sentiment classification, this
//! crate answers whether the group means differ by more than chance. The
//! engine is resampling-based: a global permutation test of the one-way
//! ANOVA F-statistic plus pairwise permutation tests on mean differences.
//! When the `rank-tests` feature is enabled, a Kruskal-Wallis rank test is
//! available as the preferred parametric path.

pub mod error;
pub mod fstat;
pub mod permutation;
#[cfg(feature = "rank-tests")]
pub mod rank;
pub mod report;
pub mod types;

pub use error::StatError;
pub use fstat::f_statistic;
pub use permutation::{
    FTestResult, PairwiseTestResult, PermutationConfig, PermutationTester, DEFAULT_PERMUTATIONS,
    DEFAULT_SEED,
};
#[cfg(feature = "rank-tests")]
pub use rank::{average_ranks, kruskal_wallis, RankTestResult};
pub use report::{AnalysisConfig, AnalysisReport, GlobalMethod, GlobalTest};
pub use types::{GroupSummary, GroupedSamples, SampleGroup};
