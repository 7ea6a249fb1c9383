//! Analysis report generation.
//!
//! Combines per-group summaries, the global significance test, and all
//! pairwise tests into a single report with text and JSON renderings. The
//! global test prefers the rank-based path when the `rank-tests` feature
//! is compiled in; otherwise it falls back to the permutation F test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StatError;
use crate::permutation::{PairwiseTestResult, PermutationConfig, PermutationTester};
use crate::types::{GroupSummary, GroupedSamples, SampleGroup};

/// Configuration for a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Permutation count and seed shared by the global and pairwise tests.
    pub permutation: PermutationConfig,
    /// Prefer the rank-based test for the global comparison when it is
    /// compiled in. Ignored otherwise.
    pub prefer_parametric: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            permutation: PermutationConfig::default(),
            prefer_parametric: true,
        }
    }
}

impl AnalysisConfig {
    /// Sets the permutation count.
    #[must_use]
    pub fn with_permutations(mut self, n_permutations: usize) -> Self {
        self.permutation.n_permutations = n_permutations;
        self
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.permutation.seed = seed;
        self
    }

    /// Sets the parametric preference flag.
    #[must_use]
    pub fn with_parametric(mut self, prefer_parametric: bool) -> Self {
        self.prefer_parametric = prefer_parametric;
        self
    }
}

/// Which test produced the global statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalMethod {
    /// Kruskal-Wallis H test (rank-based).
    KruskalWallis,
    /// Permutation test of the one-way ANOVA F-statistic.
    PermutationF,
}

/// Outcome of the global across-groups test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalTest {
    /// Test that produced the statistic.
    pub method: GlobalMethod,
    /// Observed statistic (H or F).
    pub statistic: f64,
    /// p-value of the test.
    pub p_value: f64,
}

/// Full analysis report for one grouped-sample collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Per-group descriptive statistics, in group order.
    pub groups: Vec<GroupSummary>,
    /// Global test outcome. `None` when fewer than two groups were
    /// available, in which case no tests were run.
    pub global: Option<GlobalTest>,
    /// Pairwise permutation tests over every unordered pair of groups.
    pub pairwise: Vec<PairwiseTestResult>,
    /// Permutation count the tests were configured with.
    pub n_permutations: usize,
}

impl AnalysisReport {
    /// Runs the full analysis over a grouped-sample collection.
    ///
    /// Summaries are always computed. With fewer than two groups the
    /// significance tests are skipped and reported as not run; this is not
    /// an error. Otherwise the global test dispatches on the parametric
    /// preference and the compiled capability, and the pairwise tester
    /// covers every unordered pair.
    ///
    /// # Errors
    /// Propagates engine failures (invalid permutation count, insufficient
    /// degrees of freedom).
    pub fn generate(
        samples: &GroupedSamples,
        config: &AnalysisConfig,
    ) -> Result<Self, StatError> {
        let groups: Vec<GroupSummary> = samples.groups().iter().map(SampleGroup::summary).collect();

        if samples.len() < 2 {
            tracing::warn!(
                groups = samples.len(),
                "fewer than two groups, skipping significance tests"
            );
            return Ok(Self {
                generated_at: Utc::now(),
                groups,
                global: None,
                pairwise: Vec::new(),
                n_permutations: config.permutation.n_permutations,
            });
        }

        let tester = PermutationTester::new(config.permutation.clone());
        let global = Some(global_test(samples, config, &tester)?);
        let pairwise = tester.pairwise_tests(samples)?;

        Ok(Self {
            generated_at: Utc::now(),
            groups,
            global,
            pairwise,
            n_permutations: config.permutation.n_permutations,
        })
    }

    /// Renders the report as human-readable text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Statistical tests run at {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let labels: Vec<&str> = self.groups.iter().map(|g| g.label.as_str()).collect();
        out.push_str(&format!("Groups: {labels:?}\n"));
        for group in &self.groups {
            out.push_str(&format!(
                "{}: n={}, mean={:.3}, median={:.3}\n",
                group.label, group.count, group.mean, group.median
            ));
        }

        out.push('\n');
        match &self.global {
            Some(test) => match test.method {
                GlobalMethod::KruskalWallis => out.push_str(&format!(
                    "Kruskal-Wallis H={:.4}, p={:.4}\n",
                    test.statistic, test.p_value
                )),
                GlobalMethod::PermutationF => out.push_str(&format!(
                    "Permutation F-statistic={:.4}, p={:.4} ({} permutations)\n",
                    test.statistic, test.p_value, self.n_permutations
                )),
            },
            None => {
                out.push_str("Fewer than two groups with observations; tests were not run\n");
            }
        }

        if !self.pairwise.is_empty() {
            out.push_str("\nPairwise permutation tests (mean difference):\n");
            for pair in &self.pairwise {
                out.push_str(&format!(
                    "{} vs {}: mean_diff={:.3}, p={:.4}\n",
                    pair.group_a, pair.group_b, pair.mean_difference, pair.p_value
                ));
            }
        }

        out
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(feature = "rank-tests")]
fn global_test(
    samples: &GroupedSamples,
    config: &AnalysisConfig,
    tester: &PermutationTester,
) -> Result<GlobalTest, StatError> {
    if config.prefer_parametric {
        let result = crate::rank::kruskal_wallis(samples)?;
        return Ok(GlobalTest {
            method: GlobalMethod::KruskalWallis,
            statistic: result.statistic,
            p_value: result.p_value,
        });
    }

    permutation_global(samples, tester)
}

#[cfg(not(feature = "rank-tests"))]
fn global_test(
    samples: &GroupedSamples,
    config: &AnalysisConfig,
    tester: &PermutationTester,
) -> Result<GlobalTest, StatError> {
    if config.prefer_parametric {
        tracing::debug!("rank-tests not compiled in, using the permutation fallback");
    }
    permutation_global(samples, tester)
}

fn permutation_global(
    samples: &GroupedSamples,
    tester: &PermutationTester,
) -> Result<GlobalTest, StatError> {
    let result = tester.f_test(samples)?;
    Ok(GlobalTest {
        method: GlobalMethod::PermutationF,
        statistic: result.statistic,
        p_value: result.p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(groups: Vec<(&str, Vec<f64>)>) -> GroupedSamples {
        GroupedSamples::new(
            groups
                .into_iter()
                .map(|(label, values)| SampleGroup::new(label, values))
                .collect(),
        )
        .unwrap()
    }

    fn three_groups() -> GroupedSamples {
        samples(vec![
            ("bearish", vec![-5.0, -3.0, -4.0, -6.0]),
            ("bullish", vec![6.0, 8.0, 7.0, 9.0]),
            ("neutral", vec![0.5, -0.5, 1.0, -1.0]),
        ])
    }

    #[test]
    fn report_covers_summaries_global_and_pairwise() {
        let config = AnalysisConfig::default().with_permutations(200);
        let report = AnalysisReport::generate(&three_groups(), &config).unwrap();

        assert_eq!(report.groups.len(), 3);
        assert!(report.global.is_some());
        assert_eq!(report.pairwise.len(), 3);
        assert_eq!(report.n_permutations, 200);
    }

    #[test]
    fn single_group_skips_tests_without_error() {
        let config = AnalysisConfig::default();
        let report = AnalysisReport::generate(
            &samples(vec![("only", vec![1.0, 2.0, 3.0])]),
            &config,
        )
        .unwrap();

        assert!(report.global.is_none());
        assert!(report.pairwise.is_empty());
        assert_eq!(report.groups.len(), 1);
        assert!(report.to_text().contains("tests were not run"));
    }

    #[test]
    fn permutation_fallback_when_parametric_disabled() {
        let config = AnalysisConfig::default()
            .with_permutations(200)
            .with_parametric(false);
        let report = AnalysisReport::generate(&three_groups(), &config).unwrap();

        let global = report.global.unwrap();
        assert_eq!(global.method, GlobalMethod::PermutationF);
    }

    #[cfg(feature = "rank-tests")]
    #[test]
    fn parametric_preference_uses_rank_test() {
        let config = AnalysisConfig::default().with_permutations(200);
        let report = AnalysisReport::generate(&three_groups(), &config).unwrap();

        let global = report.global.unwrap();
        assert_eq!(global.method, GlobalMethod::KruskalWallis);
    }

    #[test]
    fn text_report_contains_required_sections() {
        let config = AnalysisConfig::default().with_permutations(200);
        let report = AnalysisReport::generate(&three_groups(), &config).unwrap();

        let text = report.to_text();

        assert!(text.contains("Statistical tests run at"));
        assert!(text.contains("Groups:"));
        assert!(text.contains("bearish: n=4"));
        assert!(text.contains("Pairwise permutation tests (mean difference):"));
        assert!(text.contains("bearish vs bullish:"));
        assert!(text.contains("bearish vs neutral:"));
        assert!(text.contains("bullish vs neutral:"));
    }

    #[test]
    fn json_round_trips() {
        let config = AnalysisConfig::default().with_permutations(100);
        let report = AnalysisReport::generate(&three_groups(), &config).unwrap();

        let json = report.to_json().unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.groups.len(), report.groups.len());
        assert_eq!(parsed.pairwise.len(), report.pairwise.len());
        assert_eq!(parsed.n_permutations, report.n_permutations);
    }

    #[test]
    fn reports_are_reproducible_for_same_seed() {
        let config = AnalysisConfig::default().with_permutations(300).with_seed(9);

        let first = AnalysisReport::generate(&three_groups(), &config).unwrap();
        let second = AnalysisReport::generate(&three_groups(), &config).unwrap();

        let (a, b) = (first.global.unwrap(), second.global.unwrap());
        assert_eq!(a.statistic.to_bits(), b.statistic.to_bits());
        assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
        for (x, y) in first.pairwise.iter().zip(second.pairwise.iter()) {
            assert_eq!(x.p_value.to_bits(), y.p_value.to_bits());
        }
    }
}
