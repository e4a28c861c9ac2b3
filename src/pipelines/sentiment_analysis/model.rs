use super::output::SentimentOutput;

/// A pretrained sentiment model, treated as an opaque scoring function.
///
/// The associated output type fixes, at compile time, how the model's raw
/// prediction is reduced to a positive-sentiment score.
pub trait SentimentModel {
    type Output: SentimentOutput;

    fn predict(&self, text: &str) -> anyhow::Result<Self::Output>;
}
