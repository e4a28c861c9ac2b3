use std::collections::HashMap;

use anyhow::{anyhow, bail};

pub const POSITIVE_LABEL: &str = "positive";

/// Class label → probability for one piece of text.
pub type ClassProbabilities = HashMap<String, f32>;

/// An output shape a sentiment model can produce, and how it reduces to a
/// single positive-sentiment score.
pub trait SentimentOutput {
    /// Shape name used in logs.
    const SHAPE: &'static str;

    fn positive_score(self) -> anyhow::Result<f32>;
}

/// Models that already produce a positive-sentiment probability.
impl SentimentOutput for f32 {
    const SHAPE: &'static str = "scalar";

    fn positive_score(self) -> anyhow::Result<f32> {
        Ok(self)
    }
}

/// A predicted label with the model's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledScore {
    pub label: String,
    pub score: f32,
}

impl LabeledScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Confidence in a positive label is the positive score; confidence in any
/// other label is read as its complement.
impl SentimentOutput for LabeledScore {
    const SHAPE: &'static str = "labeled";

    fn positive_score(self) -> anyhow::Result<f32> {
        if self.label.eq_ignore_ascii_case(POSITIVE_LABEL) {
            Ok(self.score)
        } else {
            Ok(1.0 - self.score)
        }
    }
}

/// Per-sentence class distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceScores(pub Vec<ClassProbabilities>);

/// Mean positive-class probability across sentences.
impl SentimentOutput for SentenceScores {
    const SHAPE: &'static str = "sentences";

    fn positive_score(self) -> anyhow::Result<f32> {
        if self.0.is_empty() {
            bail!("model returned no sentences");
        }
        let count = self.0.len();
        let mut total = 0.0f32;
        for probabilities in &self.0 {
            total += positive_probability(probabilities)
                .ok_or_else(|| anyhow!("sentence result has no '{POSITIVE_LABEL}' class"))?;
        }
        Ok(total / count as f32)
    }
}

fn positive_probability(probabilities: &ClassProbabilities) -> Option<f32> {
    probabilities
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(POSITIVE_LABEL))
        .map(|(_, p)| *p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(positive: f32) -> ClassProbabilities {
        HashMap::from([
            ("positive".to_string(), positive),
            ("negative".to_string(), 1.0 - positive),
        ])
    }

    #[test]
    fn labeled_scores_flip_for_non_positive_labels() {
        assert_eq!(LabeledScore::new("positive", 0.9).positive_score().unwrap(), 0.9);
        assert_eq!(LabeledScore::new("POSITIVE", 0.9).positive_score().unwrap(), 0.9);
        let negative = LabeledScore::new("negative", 0.75).positive_score().unwrap();
        assert!((negative - 0.25).abs() < 1e-6);
    }

    #[test]
    fn sentence_scores_average_positive_class() {
        let scores = SentenceScores(vec![sentence(0.8), sentence(0.4)]);
        assert!((scores.positive_score().unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn sentence_scores_need_a_positive_class() {
        assert!(SentenceScores(vec![]).positive_score().is_err());
        let missing = SentenceScores(vec![HashMap::from([("neutral".to_string(), 1.0)])]);
        assert!(missing.positive_score().is_err());
    }
}
