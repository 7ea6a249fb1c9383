//! The `analyze` subcommand: load grouped observations from a prepared
//! CSV, run the significance tests, and write the report.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sentiment_edge_stats::{AnalysisConfig, AnalysisReport, GroupedSamples, SampleGroup};

/// Arguments for the analyze command.
pub struct AnalyzeArgs {
    /// Input CSV path.
    pub input: String,
    /// Output path, stdout when `None`.
    pub output: Option<String>,
    /// Column holding the group label.
    pub group_column: String,
    /// Column holding the numeric observation.
    pub value_column: String,
    /// Permutations per test.
    pub permutations: usize,
    /// RNG seed.
    pub seed: u64,
    /// Force the permutation fallback.
    pub no_parametric: bool,
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Runs the analysis end to end.
///
/// # Errors
/// Returns error when the input cannot be read, the named columns are
/// missing, no usable rows remain, or the engine rejects the input.
pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let samples = load_grouped_csv(
        Path::new(&args.input),
        &args.group_column,
        &args.value_column,
    )?;
    tracing::info!(
        groups = samples.len(),
        observations = samples.total_observations(),
        "loaded grouped samples"
    );

    let config = AnalysisConfig::default()
        .with_permutations(args.permutations)
        .with_seed(args.seed)
        .with_parametric(!args.no_parametric);

    let report = AnalysisReport::generate(&samples, &config)?;

    let rendered = if args.json {
        report.to_json()?
    } else {
        report.to_text()
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {path}"))?;
            tracing::info!("wrote report to {path}");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Loads a headered CSV into validated sample groups.
fn load_grouped_csv(
    path: &Path,
    group_column: &str,
    value_column: &str,
) -> Result<GroupedSamples> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_grouped(reader, group_column, value_column)
}

/// Groups rows by label, dropping rows whose value is missing or
/// non-numeric. Grouping goes through a `BTreeMap` so group order is
/// always sorted by label, which keeps a fixed seed reproducible across
/// runs.
fn parse_grouped<R: Read>(
    mut reader: csv::Reader<R>,
    group_column: &str,
    value_column: &str,
) -> Result<GroupedSamples> {
    let headers = reader.headers().context("failed to read CSV headers")?;
    let group_idx = headers
        .iter()
        .position(|h| h == group_column)
        .ok_or_else(|| anyhow!("column '{group_column}' not found in input"))?;
    let value_idx = headers
        .iter()
        .position(|h| h == value_column)
        .ok_or_else(|| anyhow!("column '{value_column}' not found in input"))?;

    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record.context("failed to read CSV record")?;
        let label = record.get(group_idx).unwrap_or("").trim();
        let raw_value = record.get(value_idx).unwrap_or("").trim();

        let value = match raw_value.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                dropped += 1;
                continue;
            }
        };
        if label.is_empty() {
            dropped += 1;
            continue;
        }

        grouped.entry(label.to_string()).or_default().push(value);
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped rows with missing or non-numeric fields");
    }

    let groups: Vec<SampleGroup> = grouped
        .into_iter()
        .map(|(label, values)| SampleGroup::new(label, values))
        .collect();

    GroupedSamples::new(groups).context("no usable observations in input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(data: &str) -> csv::Reader<Cursor<Vec<u8>>> {
        csv::Reader::from_reader(Cursor::new(data.as_bytes().to_vec()))
    }

    const SAMPLE_CSV: &str = "\
date,classification,total_pnl
2025-06-02,bearish,-12.5
2025-06-03,bullish,30.0
2025-06-04,bullish,12.25
2025-06-05,neutral,1.0
2025-06-06,bearish,-3.5
";

    #[test]
    fn groups_rows_by_label_in_sorted_order() {
        let samples = parse_grouped(reader(SAMPLE_CSV), "classification", "total_pnl").unwrap();

        let labels: Vec<&str> = samples
            .groups()
            .iter()
            .map(|g| g.label.as_str())
            .collect();
        assert_eq!(labels, vec!["bearish", "bullish", "neutral"]);

        assert_eq!(samples.groups()[0].values, vec![-12.5, -3.5]);
        assert_eq!(samples.groups()[1].values, vec![30.0, 12.25]);
    }

    #[test]
    fn drops_missing_and_non_numeric_values() {
        let csv = "\
classification,total_pnl
bearish,1.5
bearish,
bullish,not-a-number
bullish,2.5
neutral,NaN
neutral,3.5
";
        let samples = parse_grouped(reader(csv), "classification", "total_pnl").unwrap();

        assert_eq!(samples.total_observations(), 3);
        for group in samples.groups() {
            assert_eq!(group.len(), 1);
        }
    }

    #[test]
    fn custom_column_names_are_honored() {
        let csv = "\
regime,daily_return
calm,0.5
wild,4.0
";
        let samples = parse_grouped(reader(csv), "regime", "daily_return").unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.groups()[0].label, "calm");
    }

    #[test]
    fn missing_column_is_an_error() {
        let result = parse_grouped(reader(SAMPLE_CSV), "sentiment", "total_pnl");

        let message = result.unwrap_err().to_string();
        assert!(message.contains("sentiment"), "message was: {message}");
    }

    #[test]
    fn empty_input_is_an_error() {
        let result = parse_grouped(reader("classification,total_pnl\n"), "classification", "total_pnl");

        assert!(result.is_err());
    }
}
