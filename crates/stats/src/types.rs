//! Sample group types and per-group summary statistics.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StatError;

/// A labeled, ordered sequence of observations.
///
/// Observation order carries no statistical meaning but is preserved
/// verbatim so that a given seed always reproduces the same result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleGroup {
    /// Group label, unique within a test invocation.
    pub label: String,
    /// Observations for this label.
    pub values: Vec<f64>,
}

impl SampleGroup {
    /// Creates a new sample group.
    #[must_use]
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Number of observations in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the group has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean of the observations, 0.0 for an empty group.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }

    /// Median of the observations, 0.0 for an empty group.
    #[must_use]
    pub fn median(&self) -> f64 {
        median(&self.values)
    }

    /// Descriptive statistics for reporting.
    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            label: self.label.clone(),
            count: self.len(),
            mean: self.mean(),
            median: self.median(),
        }
    }
}

/// A validated collection of sample groups.
///
/// Construction enforces the engine's input contract: at least one group,
/// no empty groups, unique labels, finite values only.
#[derive(Debug, Clone)]
pub struct GroupedSamples {
    groups: Vec<SampleGroup>,
}

impl GroupedSamples {
    /// Validates and wraps a collection of sample groups.
    ///
    /// # Errors
    /// Returns an error if no groups are supplied, a group is empty, two
    /// groups share a label, or any value is NaN or infinite.
    pub fn new(groups: Vec<SampleGroup>) -> Result<Self, StatError> {
        if groups.is_empty() {
            return Err(StatError::NoGroups);
        }

        let mut seen = HashSet::new();
        for group in &groups {
            if group.is_empty() {
                return Err(StatError::EmptyGroup(group.label.clone()));
            }
            if !seen.insert(group.label.as_str()) {
                return Err(StatError::DuplicateLabel(group.label.clone()));
            }
            validate_finite(group)?;
        }

        Ok(Self { groups })
    }

    /// The groups in their original order.
    #[must_use]
    pub fn groups(&self) -> &[SampleGroup] {
        &self.groups
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false: construction rejects empty collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total observation count across all groups.
    #[must_use]
    pub fn total_observations(&self) -> usize {
        self.groups.iter().map(SampleGroup::len).sum()
    }

    /// Concatenates all groups' observations in group order.
    #[must_use]
    pub fn pooled(&self) -> Vec<f64> {
        let mut pooled = Vec::with_capacity(self.total_observations());
        for group in &self.groups {
            pooled.extend_from_slice(&group.values);
        }
        pooled
    }
}

/// Per-group descriptive statistics for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group label.
    pub label: String,
    /// Number of observations.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
}

/// Rejects NaN and infinite observations.
pub(crate) fn validate_finite(group: &SampleGroup) -> Result<(), StatError> {
    if let Some(index) = group.values.iter().position(|v| !v.is_finite()) {
        return Err(StatError::NonFiniteValue {
            label: group.label.clone(),
            index,
        });
    }
    Ok(())
}

/// Arithmetic mean, 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median over a sorted copy, 0.0 for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_samples_accepts_valid_input() {
        let samples = GroupedSamples::new(vec![
            SampleGroup::new("bearish", vec![-2.0, 1.5]),
            SampleGroup::new("bullish", vec![3.0, 4.0, 5.0]),
        ])
        .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.total_observations(), 5);
    }

    #[test]
    fn grouped_samples_rejects_empty_collection() {
        let result = GroupedSamples::new(vec![]);
        assert!(matches!(result, Err(StatError::NoGroups)));
    }

    #[test]
    fn grouped_samples_rejects_empty_group() {
        let result = GroupedSamples::new(vec![
            SampleGroup::new("bearish", vec![1.0]),
            SampleGroup::new("neutral", vec![]),
        ]);

        assert!(matches!(result, Err(StatError::EmptyGroup(label)) if label == "neutral"));
    }

    #[test]
    fn grouped_samples_rejects_duplicate_labels() {
        let result = GroupedSamples::new(vec![
            SampleGroup::new("bullish", vec![1.0]),
            SampleGroup::new("bullish", vec![2.0]),
        ]);

        assert!(matches!(result, Err(StatError::DuplicateLabel(_))));
    }

    #[test]
    fn grouped_samples_rejects_nan() {
        let result = GroupedSamples::new(vec![SampleGroup::new("bearish", vec![1.0, f64::NAN])]);

        assert!(matches!(
            result,
            Err(StatError::NonFiniteValue { index: 1, .. })
        ));
    }

    #[test]
    fn pooled_preserves_group_order() {
        let samples = GroupedSamples::new(vec![
            SampleGroup::new("a", vec![1.0, 2.0]),
            SampleGroup::new("b", vec![3.0]),
        ])
        .unwrap();

        assert_eq!(samples.pooled(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn median_even_count_averages_middle_pair() {
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn median_odd_count_returns_middle() {
        assert!((median(&[9.0, 1.0, 5.0]) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_reports_count_mean_median() {
        let group = SampleGroup::new("bullish", vec![1.0, 2.0, 6.0]);
        let summary = group.summary();

        assert_eq!(summary.count, 3);
        assert!((summary.mean - 3.0).abs() < f64::EPSILON);
        assert!((summary.median - 2.0).abs() < f64::EPSILON);
    }
}
