use std::path::Path;

use tracing::info;

use super::registry::LoadedModel;
use crate::core::Result;
use crate::record::columns;
use crate::table::{read_first_sheet, write_table, Cell, Table};

/// Summary of one scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSummary {
    pub rows: usize,
    pub scored: usize,
    pub mean_score: Option<f64>,
}

/// Score every row of `table` by its `text_column` and store the result in
/// the sentiment-score column. Empty text and rows the model fails on are
/// left without a score.
pub fn score_table(
    table: &mut Table,
    text_column: &str,
    model: &LoadedModel,
) -> Result<ScoringSummary> {
    let text = table.require_column(text_column)?;

    let scores: Vec<Option<f32>> = table
        .rows
        .iter()
        .map(|row| row[text].as_text().and_then(|t| model.score(&t)))
        .collect();

    let scored: Vec<f64> = scores.iter().flatten().map(|&s| f64::from(s)).collect();
    let summary = ScoringSummary {
        rows: scores.len(),
        scored: scored.len(),
        mean_score: (!scored.is_empty()).then(|| scored.iter().sum::<f64>() / scored.len() as f64),
    };

    table.set_column(
        columns::SENTIMENT_SCORE,
        scores.into_iter().map(Cell::from).collect(),
    )?;
    Ok(summary)
}

/// Run stage 3: read `input`, score it with `model` and write the table with
/// its added score column to `output`.
pub fn score_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    text_column: &str,
    model: &LoadedModel,
) -> Result<ScoringSummary> {
    let mut table = read_first_sheet(input.as_ref())?;
    info!(
        "scoring {} comments with '{}'",
        table.len(),
        model.name()
    );
    let summary = score_table(&mut table, text_column, model)?;
    write_table(output.as_ref(), &table)?;

    match summary.mean_score {
        Some(mean) => info!(
            "scored {} of {} comments, mean sentiment {mean:.4}",
            summary.scored, summary.rows
        ),
        None => info!("no comment could be scored"),
    }
    info!("sentiment results saved to {}", output.as_ref().display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineError;

    fn length_model() -> LoadedModel {
        LoadedModel::new(
            "length",
            Box::new(|text: &str| -> anyhow::Result<f32> {
                Ok(text.chars().count() as f32 / 10.0)
            }),
        )
    }

    #[test]
    fn adds_score_column() {
        let mut table = Table::with_headers(&["评论内容"]);
        table.push_row(vec![Cell::from("12345")]);
        table.push_row(vec![Cell::Empty]);
        table.push_row(vec![Cell::from("123456789012")]);

        let summary = score_table(&mut table, "评论内容", &length_model()).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.scored, 2);
        assert!((summary.mean_score.unwrap() - 0.75).abs() < 1e-6);

        let scores: Vec<Option<f64>> = table
            .column(columns::SENTIMENT_SCORE)
            .unwrap()
            .map(Cell::as_f64)
            .collect();
        assert_eq!(scores[1], None);
        assert!((scores[0].unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(scores[2], Some(1.0));
    }

    #[test]
    fn missing_text_column_is_an_error() {
        let mut table = Table::with_headers(&["内容"]);
        table.push_row(vec![Cell::from("好")]);
        let err = score_table(&mut table, "评论内容", &length_model()).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(c) if c == "评论内容"));
    }
}
