use anyhow::bail;
use calamine::Reader;

use comment_sentiment::pipelines::compare::{compare_file, ComparisonOptions, DETAILS_SHEET};
use comment_sentiment::pipelines::sentiment_analysis::{
    LabeledScore, ModelRegistry, SentenceScores, SentimentModel,
};
use comment_sentiment::table::{read_first_sheet, write_table, Cell, Table};

struct AlwaysPositive;

impl SentimentModel for AlwaysPositive {
    type Output = LabeledScore;

    fn predict(&self, _text: &str) -> anyhow::Result<LabeledScore> {
        Ok(LabeledScore::new("Positive", 0.9))
    }
}

struct NeedsWeights;

impl SentimentModel for NeedsWeights {
    type Output = f32;

    fn predict(&self, _text: &str) -> anyhow::Result<f32> {
        Ok(0.5)
    }
}

struct NoSentences;

impl SentimentModel for NoSentences {
    type Output = SentenceScores;

    fn predict(&self, _text: &str) -> anyhow::Result<SentenceScores> {
        Ok(SentenceScores::default())
    }
}

fn comments_file(dir: &std::path::Path) -> std::path::PathBuf {
    let mut table = Table::with_headers(&["评论内容", "宣传片内容"]);
    for text in ["风景太美了", "还行吧", "人太多了"] {
        table.push_row(vec![Cell::from(text), Cell::from("南京风光")]);
    }
    let path = dir.join("processed.xlsx");
    write_table(&path, &table).expect("write comments");
    path
}

#[test]
fn failing_model_is_left_out() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = comments_file(dir.path());
    let output = dir.path().join("comparison.xlsx");

    let mut registry = ModelRegistry::new();
    registry
        .register("positive", || Ok(AlwaysPositive))
        .register("needs-weights", || -> anyhow::Result<NeedsWeights> {
            bail!("weights not downloaded")
        })
        .register("no-sentences", || Ok(NoSentences));
    let models = registry.load_available(&["positive", "needs-weights", "no-sentences"]);

    let options = ComparisonOptions {
        text_column: "评论内容".to_string(),
        sample_size: Some(100),
        seed: Some(42),
    };
    let result = compare_file(&input, &output, &models, &options)?;

    assert_eq!(result.stats.headers, vec!["统计量", "positive", "no-sentences"]);
    let mean = result.stats.rows[0][1].as_f64().expect("mean");
    assert!((mean - 0.9).abs() < 1e-6);
    // a model that fails on every row has no statistics
    assert!(result.stats.rows.iter().all(|row| row[2].is_empty()));

    let details = read_first_sheet(&output)?;
    assert_eq!(details.headers, vec!["评论内容", "positive", "no-sentences"]);
    assert_eq!(details.len(), 3);

    let mut workbook: calamine::Xlsx<_> = calamine::open_workbook(&output)?;
    assert_eq!(workbook.sheet_names(), vec![DETAILS_SHEET, "统计信息"]);
    Ok(())
}

#[test]
fn sample_is_capped_by_row_count() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = comments_file(dir.path());
    let output = dir.path().join("comparison.xlsx");

    let mut registry = ModelRegistry::new();
    registry.register("positive", || Ok(AlwaysPositive));
    let models = registry.load_available(&["positive"]);

    let options = ComparisonOptions {
        text_column: "评论内容".to_string(),
        sample_size: Some(2),
        seed: Some(7),
    };
    let result = compare_file(&input, &output, &models, &options)?;
    assert_eq!(result.details.len(), 2);
    Ok(())
}
