//! Run several sentiment models over the same comments and summarize how
//! their scores differ.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::info;

use super::sentiment_analysis::LoadedModel;
use crate::core::Result;
use crate::table::{read_first_sheet, write_sheets, Cell, Table};
use crate::utils::preprocess_text;

pub const DETAILS_SHEET: &str = "详细结果";
pub const STATS_SHEET: &str = "统计信息";
const STATISTIC_HEADER: &str = "统计量";
const STATISTICS: [&str; 4] = ["mean", "std", "min", "max"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOptions {
    pub text_column: String,
    /// Rows to sample; `None` or `Some(0)` scores every row.
    pub sample_size: Option<usize>,
    /// Seed for a reproducible sample.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// Text column followed by one score column per model.
    pub details: Table,
    /// One row per statistic, one column per model.
    pub stats: Table,
}

/// Aggregate statistics of one model's scores. Every field is `None` when
/// the model produced no score at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStats {
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.len() > 1).then(|| {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        });
        Self {
            mean: Some(mean),
            std,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }

    fn values(&self) -> [Option<f64>; 4] {
        [self.mean, self.std, self.min, self.max]
    }
}

/// Pick `min(size, table.len())` distinct rows at random, kept in their
/// original order.
pub fn sample_rows(table: &Table, size: usize, seed: Option<u64>) -> Table {
    let amount = size.min(table.len());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut picked = index::sample(&mut rng, table.len(), amount).into_vec();
    picked.sort_unstable();
    table.select_rows(&picked)
}

/// Score the texts of `table` with every model.
pub fn compare_models(
    table: &Table,
    models: &[LoadedModel],
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    let sampled;
    let table = match options.sample_size.filter(|&size| size > 0) {
        Some(size) => {
            sampled = sample_rows(table, size, options.seed);
            &sampled
        }
        None => table,
    };
    let texts: Vec<Option<String>> = table
        .column(&options.text_column)?
        .map(Cell::to_text)
        .collect();
    info!(
        "comparing {} models on {} comments",
        models.len(),
        texts.len()
    );

    let mut headers = vec![options.text_column.clone()];
    headers.extend(models.iter().map(|m| m.name().to_string()));
    let mut details = Table::new(headers);
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); models.len()];

    for text in &texts {
        let processed = text.as_deref().map(preprocess_text).filter(|t| !t.is_empty());
        let mut row = vec![Cell::from(text.clone())];
        for (model, values) in models.iter().zip(columns.iter_mut()) {
            let score = processed.as_deref().and_then(|t| model.score(t));
            if let Some(score) = score {
                values.push(f64::from(score));
            }
            row.push(Cell::from(score));
        }
        details.push_row(row);
    }

    let stats = stats_table(models, &columns);
    log_stats(models, &columns);
    Ok(ComparisonResult { details, stats })
}

fn stats_table(models: &[LoadedModel], columns: &[Vec<f64>]) -> Table {
    let mut headers = vec![STATISTIC_HEADER.to_string()];
    headers.extend(models.iter().map(|m| m.name().to_string()));
    let mut table = Table::new(headers);

    let stats: Vec<[Option<f64>; 4]> = columns
        .iter()
        .map(|v| ColumnStats::from_values(v).values())
        .collect();
    for (i, label) in STATISTICS.iter().enumerate() {
        let mut row = vec![Cell::from(*label)];
        row.extend(stats.iter().map(|values| Cell::from(values[i])));
        table.push_row(row);
    }
    table
}

fn log_stats(models: &[LoadedModel], columns: &[Vec<f64>]) {
    for (model, values) in models.iter().zip(columns) {
        let stats = ColumnStats::from_values(values);
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        info!(
            "{:<22} n={:<5} mean={} std={} min={} max={}",
            model.name(),
            values.len(),
            fmt(stats.mean),
            fmt(stats.std),
            fmt(stats.min),
            fmt(stats.max)
        );
    }
}

/// Run the comparison over the first sheet of `input` and write both sheets
/// to `output`.
pub fn compare_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    models: &[LoadedModel],
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    let table = read_first_sheet(input.as_ref())?;
    let result = compare_models(&table, models, options)?;
    write_sheets(
        output.as_ref(),
        &[(DETAILS_SHEET, &result.details), (STATS_SHEET, &result.stats)],
    )?;
    info!("comparison results saved to {}", output.as_ref().display());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str, score: f32) -> LoadedModel {
        LoadedModel::new(
            name,
            Box::new(move |_: &str| -> anyhow::Result<f32> { Ok(score) }),
        )
    }

    fn comments(n: usize) -> Table {
        let mut table = Table::with_headers(&["评论内容"]);
        for i in 0..n {
            table.push_row(vec![Cell::from(format!("评论{i}"))]);
        }
        table
    }

    #[test]
    fn stats_use_sample_standard_deviation() {
        let stats = ColumnStats::from_values(&[0.2, 0.4, 0.9]);
        assert!((stats.mean.unwrap() - 0.5).abs() < 1e-9);
        assert!((stats.std.unwrap() - 0.360_555_127_546_398_9).abs() < 1e-9);
        assert_eq!(stats.min, Some(0.2));
        assert_eq!(stats.max, Some(0.9));

        let single = ColumnStats::from_values(&[0.3]);
        assert_eq!(single.std, None);
        assert_eq!(single.mean, Some(0.3));
        assert_eq!(ColumnStats::from_values(&[]), ColumnStats::default());
    }

    #[test]
    fn seeded_samples_repeat() {
        let table = comments(50);
        let a = sample_rows(&table, 10, Some(7));
        let b = sample_rows(&table, 10, Some(7));
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_eq!(sample_rows(&table, 500, None).len(), 50);
    }

    #[test]
    fn one_column_per_model() {
        let models = vec![constant("a", 0.25), constant("b", 0.75)];
        let options = ComparisonOptions {
            text_column: "评论内容".into(),
            sample_size: None,
            seed: None,
        };
        let mut table = comments(3);
        table.push_row(vec![Cell::from("!!!")]);

        let result = compare_models(&table, &models, &options).unwrap();
        assert_eq!(result.details.headers, vec!["评论内容", "a", "b"]);
        assert_eq!(result.details.len(), 4);
        // punctuation-only text is empty after preprocessing
        assert_eq!(result.details.rows[3][1], Cell::Empty);

        assert_eq!(result.stats.headers, vec!["统计量", "a", "b"]);
        let labels: Vec<_> = result.stats.rows.iter().map(|r| r[0].to_text().unwrap()).collect();
        assert_eq!(labels, vec!["mean", "std", "min", "max"]);
        assert_eq!(result.stats.rows[0][2].as_f64(), Some(0.75));
        assert_eq!(result.stats.rows[1][1].as_f64(), Some(0.0));
    }

    #[test]
    fn zero_sample_size_scores_every_row() {
        let options = ComparisonOptions {
            text_column: "评论内容".into(),
            sample_size: Some(0),
            seed: Some(3),
        };
        let result = compare_models(&comments(8), &[constant("a", 0.5)], &options).unwrap();
        assert_eq!(result.details.len(), 8);
    }

    #[test]
    fn missing_text_column_is_an_error() {
        let options = ComparisonOptions {
            text_column: "正文".into(),
            sample_size: Some(5),
            seed: Some(1),
        };
        assert!(compare_models(&comments(2), &[], &options).is_err());
    }
}
