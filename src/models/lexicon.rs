//! Word-list sentiment scorer.
//!
//! Counts positive and negative lexicon hits with a greedy longest-match scan
//! (Chinese text has no word boundaries to split on) and turns the counts
//! into a smoothed probability `(pos + 1) / (pos + neg + 2)`. Text without
//! any hit scores a neutral 0.5.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

use crate::pipelines::sentiment_analysis::SentimentModel;

const BUILTIN_POSITIVE: &str = include_str!("../../resources/lexicon/positive.txt");
const BUILTIN_NEGATIVE: &str = include_str!("../../resources/lexicon/negative.txt");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Default)]
pub struct LexiconModel {
    positive: HashSet<String>,
    negative: HashSet<String>,
    longest_word: usize,
}

/// Hit counts of one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexiconHits {
    pub positive: usize,
    pub negative: usize,
}

impl LexiconHits {
    pub fn score(self) -> f32 {
        (self.positive as f32 + 1.0) / ((self.positive + self.negative) as f32 + 2.0)
    }
}

impl LexiconModel {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let positive: HashSet<String> = positive.into_iter().map(Into::into).collect();
        let negative: HashSet<String> = negative
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !positive.contains(w))
            .collect();
        let longest_word = positive
            .iter()
            .chain(&negative)
            .map(|w| w.chars().count())
            .max()
            .unwrap_or(0);
        Self {
            positive,
            negative,
            longest_word,
        }
    }

    /// The word lists shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(parse_word_list(BUILTIN_POSITIVE), parse_word_list(BUILTIN_NEGATIVE))
    }

    /// Load word lists from files; a missing path falls back to the
    /// built-in list for that polarity.
    pub fn from_files(positive: Option<&Path>, negative: Option<&Path>) -> anyhow::Result<Self> {
        let positive = read_word_list(positive, BUILTIN_POSITIVE)?;
        let negative = read_word_list(negative, BUILTIN_NEGATIVE)?;
        Ok(Self::new(positive, negative))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn hits(&self, text: &str) -> LexiconHits {
        let chars: Vec<char> = text.chars().collect();
        let mut hits = LexiconHits::default();
        let mut start = 0;
        let mut candidate = String::new();

        while start < chars.len() {
            let max_len = self.longest_word.min(chars.len() - start);
            let mut matched = None;
            for len in (1..=max_len).rev() {
                candidate.clear();
                candidate.extend(&chars[start..start + len]);
                if let Some(polarity) = self.polarity(&candidate) {
                    matched = Some((len, polarity));
                    break;
                }
            }
            match matched {
                Some((len, Polarity::Positive)) => {
                    hits.positive += 1;
                    start += len;
                }
                Some((len, Polarity::Negative)) => {
                    hits.negative += 1;
                    start += len;
                }
                None => start += 1,
            }
        }
        hits
    }

    fn polarity(&self, word: &str) -> Option<Polarity> {
        if self.positive.contains(word) {
            Some(Polarity::Positive)
        } else if self.negative.contains(word) {
            Some(Polarity::Negative)
        } else {
            None
        }
    }
}

impl SentimentModel for LexiconModel {
    type Output = f32;

    fn predict(&self, text: &str) -> anyhow::Result<f32> {
        Ok(self.hits(&text.to_lowercase()).score())
    }
}

/// One word per line; blank lines and `#` comments are ignored.
fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

fn read_word_list(path: Option<&Path>, builtin: &str) -> anyhow::Result<Vec<String>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read word list {}", path.display()))?;
            Ok(parse_word_list(&content))
        }
        None => Ok(parse_word_list(builtin)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LexiconModel {
        LexiconModel::new(["好看", "好", "美"], ["难看", "差"])
    }

    #[test]
    fn longest_match_wins() {
        let hits = model().hits("好看好看");
        assert_eq!(hits, LexiconHits { positive: 2, negative: 0 });
        let hits = model().hits("难看又差");
        assert_eq!(hits, LexiconHits { positive: 0, negative: 2 });
    }

    #[test]
    fn scores_are_smoothed() {
        let model = model();
        assert_eq!(model.predict("今天下雨").unwrap(), 0.5);
        assert_eq!(model.predict("好美").unwrap(), 0.75);
        assert_eq!(model.predict("差").unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn builtin_lists_load() {
        let model = LexiconModel::builtin();
        assert!(model.vocabulary_size() > 50);
        assert!(model.predict("风景太美了，强烈推荐").unwrap() > 0.5);
        assert!(model.predict("太失望了，差评").unwrap() < 0.5);
    }

    #[test]
    fn word_list_files_override_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let positive = dir.path().join("positive.txt");
        std::fs::write(&positive, "# custom\nwow\n\n").unwrap();
        let model = LexiconModel::from_files(Some(&positive), None).unwrap();
        assert_eq!(model.predict("WOW").unwrap(), 2.0 / 3.0);
        assert!(LexiconModel::from_files(Some(&dir.path().join("nope.txt")), None).is_err());
    }
}
